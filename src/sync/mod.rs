use crate::{Context, Result};
use anyhow::{anyhow, bail};
use std::{fmt, str::FromStr};

pub mod apply;
pub mod diff;
pub mod directory;
pub mod plan;
pub mod report;
pub mod resolve;

pub use directory::AliasDirectory;

/// How the target domain's alias set is reconciled with the source's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Bidirectional. Both domains end up with the union of their alias
    /// names. Never deletes.
    Merge,
    /// One way. The target becomes a mirror of the source, deleting aliases
    /// only the target has.
    Replace,
    /// One way, like replace, but aliases only the target has are left
    /// alone.
    Preserve,
}

impl FromStr for SyncMode {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "replace" => Ok(Self::Replace),
            "preserve" => Ok(Self::Preserve),
            _ => Err(anyhow!("invalid sync mode {s}")),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => f.write_str("merge"),
            Self::Replace => f.write_str("replace"),
            Self::Preserve => f.write_str("preserve"),
        }
    }
}

/// Everything one sync invocation needs. State lives here for the duration
/// of a single run; nothing carries over between runs.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub source: String,
    pub target: String,
    pub mode: SyncMode,
    pub dry_run: bool,
    pub strategy: Option<resolve::ConflictStrategy>,
}

impl SyncRequest {
    pub fn validate(&self) -> Result {
        if self.source.eq_ignore_ascii_case(&self.target) {
            bail!("source and target must be different domains");
        }
        Ok(())
    }
}

/// Fetch both domains' aliases (source first), index them and build the
/// action plan. A failed fetch aborts before any plan exists.
pub async fn compute_plan(
    directory: &dyn AliasDirectory,
    request: &SyncRequest,
    resolver: &mut dyn resolve::ConflictResolver,
) -> Result<plan::Plan> {
    request.validate()?;

    let src_aliases = directory
        .list_aliases(&request.source)
        .await
        .with_context(|| format!("listing aliases for {}", request.source))?;
    let dst_aliases = directory
        .list_aliases(&request.target)
        .await
        .with_context(|| format!("listing aliases for {}", request.target))?;
    tracing::debug!(
        source = src_aliases.len(),
        target = dst_aliases.len(),
        "fetched alias listings"
    );

    let src_index = diff::index(src_aliases);
    let dst_index = diff::index(dst_aliases);
    plan::build(request, &src_index, &dst_index, resolver)
}
