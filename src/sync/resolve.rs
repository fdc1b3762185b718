use crate::{Context, Result};
use anyhow::{anyhow, bail};
use forwardemail::aliases::Alias;
use std::{
    fmt,
    io::{self, BufRead, Write},
    str::FromStr,
};

use super::{SyncMode, SyncRequest};

/// What to do with an alias that exists on both sides with different state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// The source side's state is copied over the target side's
    Overwrite,
    /// The conflict is left untouched
    Skip,
    /// Recipient and label sets are unioned
    Merge,
}

impl FromStr for ConflictStrategy {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            "merge" => Ok(Self::Merge),
            _ => Err(anyhow!(
                "invalid conflict strategy {s}, expected overwrite, skip or merge"
            )),
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => f.write_str("overwrite"),
            Self::Skip => f.write_str("skip"),
            Self::Merge => f.write_str("merge"),
        }
    }
}

/// A resolver's answer for one conflict. With `remember` set the planner
/// applies the strategy to every remaining conflict in the run without
/// asking again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub strategy: ConflictStrategy,
    pub remember: bool,
}

/// Decides conflicts for the planner. The planner itself never touches a
/// terminal; interactivity lives behind this seam so planning stays testable.
pub trait ConflictResolver {
    fn resolve(&mut self, name: &str, src: &Alias, dst: &Alias) -> Result<Decision>;
}

/// Applies one fixed strategy to every conflict.
#[derive(Debug)]
pub struct FixedResolver(pub ConflictStrategy);

impl ConflictResolver for FixedResolver {
    fn resolve(&mut self, _name: &str, _src: &Alias, _dst: &Alias) -> Result<Decision> {
        Ok(Decision {
            strategy: self.0,
            remember: true,
        })
    }
}

/// Prompts for each conflict. Answers are a strategy word or its first
/// letter; capitalizing the answer applies it to all remaining conflicts.
/// Closed input aborts the run.
pub struct InteractiveResolver<R, W> {
    source: String,
    target: String,
    input: R,
    output: W,
}

impl InteractiveResolver<io::BufReader<io::Stdin>, io::Stderr> {
    pub fn stdin(source: &str, target: &str) -> Self {
        Self::new(source, target, io::BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> InteractiveResolver<R, W> {
    pub fn new(source: &str, target: &str, input: R, output: W) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            input,
            output,
        }
    }

    fn describe(&mut self, name: &str, src: &Alias, dst: &Alias) -> io::Result<()> {
        writeln!(self.output, "alias \"{name}\" differs:")?;
        writeln!(self.output, "  {}: {}", self.source, describe_alias(src))?;
        writeln!(self.output, "  {}: {}", self.target, describe_alias(dst))
    }
}

fn describe_alias(alias: &Alias) -> String {
    let state = if alias.is_enabled {
        "enabled"
    } else {
        "disabled"
    };
    let mut described = format!("{} ({state})", alias.recipients.join(", "));
    if !alias.labels.is_empty() {
        described.push_str(&format!(" labels: {}", alias.labels.join(", ")));
    }
    described
}

impl<R: BufRead, W: Write> ConflictResolver for InteractiveResolver<R, W> {
    fn resolve(&mut self, name: &str, src: &Alias, dst: &Alias) -> Result<Decision> {
        self.describe(name, src, dst)
            .context("writing conflict prompt")?;
        loop {
            write!(
                self.output,
                "resolve with [o]verwrite, [s]kip or [m]erge (capitalize to apply to all): "
            )
            .context("writing conflict prompt")?;
            self.output.flush().context("writing conflict prompt")?;

            let mut answer = String::new();
            let read = self
                .input
                .read_line(&mut answer)
                .context("reading conflict answer")?;
            if read == 0 {
                bail!("input closed before alias {name} was resolved");
            }
            if let Some(decision) = parse_answer(&answer) {
                return Ok(decision);
            }
            writeln!(self.output, "unrecognized answer {:?}", answer.trim())
                .context("writing conflict prompt")?;
        }
    }
}

fn parse_answer(answer: &str) -> Option<Decision> {
    let answer = answer.trim();
    let remember = answer
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_uppercase());
    let strategy = match answer.to_lowercase().as_str() {
        "o" | "overwrite" => ConflictStrategy::Overwrite,
        "s" | "skip" => ConflictStrategy::Skip,
        "m" | "merge" => ConflictStrategy::Merge,
        _ => return None,
    };
    Some(Decision { strategy, remember })
}

/// Pick the resolver for a run. The one way modes resolve conflicts by
/// definition (the target adopts the source's state) and never prompt.
/// Merge mode prompts unless a strategy was given; under dry-run it falls
/// back to the merge strategy instead of prompting.
pub fn for_request(request: &SyncRequest) -> Box<dyn ConflictResolver> {
    match request.strategy {
        Some(strategy) => Box::new(FixedResolver(strategy)),
        None if request.mode != SyncMode::Merge => {
            Box::new(FixedResolver(ConflictStrategy::Overwrite))
        }
        None if request.dry_run => Box::new(FixedResolver(ConflictStrategy::Merge)),
        None => Box::new(InteractiveResolver::stdin(&request.source, &request.target)),
    }
}
