use crate::{
    cmd::{print_json, Format},
    settings::Settings,
    Result,
};
use anyhow::{anyhow, bail};
use forwardemail::{aliases, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::{fs::File, io, path::PathBuf};

/// Commands on a domain's aliases.
#[derive(Debug, clap::Args)]
pub struct Cmd {
    #[command(subcommand)]
    cmd: AliasesCommand,
}

impl Cmd {
    pub async fn run(&self, settings: &Settings) -> Result {
        self.cmd.run(settings).await
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum AliasesCommand {
    List(List),
    Get(Get),
    Create(Create),
    Update(Update),
    Delete(Delete),
    Export(Export),
    Import(Import),
}

impl AliasesCommand {
    pub async fn run(&self, settings: &Settings) -> Result {
        match self {
            Self::List(cmd) => cmd.run(settings).await,
            Self::Get(cmd) => cmd.run(settings).await,
            Self::Create(cmd) => cmd.run(settings).await,
            Self::Update(cmd) => cmd.run(settings).await,
            Self::Delete(cmd) => cmd.run(settings).await,
            Self::Export(cmd) => cmd.run(settings).await,
            Self::Import(cmd) => cmd.run(settings).await,
        }
    }
}

/// List the aliases of a domain.
#[derive(Debug, clap::Args)]
pub struct List {
    /// Domain to list aliases for
    domain: String,

    /// Output format
    #[arg(long, default_value_t)]
    format: Format,
}

impl List {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let aliases = aliases::all_collect(&client, &self.domain).await?;
        output_aliases(io::stdout(), &self.format, &aliases)
    }
}

/// Get one alias of a domain by name.
#[derive(Debug, clap::Args)]
pub struct Get {
    /// Domain the alias lives in
    domain: String,

    /// Alias name to get
    name: String,
}

impl Get {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let alias = aliases::for_name(&client, &self.domain, &self.name)
            .await?
            .ok_or_else(|| anyhow!("alias {} not found in {}", self.name, self.domain))?;
        print_json(&alias)
    }
}

/// Create an alias.
#[derive(Debug, clap::Args)]
pub struct Create {
    /// Domain to create the alias in
    domain: String,

    /// Alias name (the part before the @)
    name: String,

    /// Recipient address or webhook url. Repeatable
    #[arg(long = "recipient", required = true)]
    recipients: Vec<String>,

    /// Label to attach. Repeatable
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Free form description
    #[arg(long, default_value = "")]
    description: String,

    /// Create the alias disabled
    #[arg(long)]
    disabled: bool,
}

impl Create {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let alias = aliases::create(
            &client,
            &self.domain,
            &aliases::NewAlias {
                name: self.name.clone(),
                recipients: self.recipients.clone(),
                is_enabled: !self.disabled,
                labels: self.labels.clone(),
                description: self.description.clone(),
            },
        )
        .await?;
        print_json(&alias)
    }
}

/// Update an alias. Only the given fields change.
#[derive(Debug, clap::Args)]
pub struct Update {
    /// Domain the alias lives in
    domain: String,

    /// Alias name to update
    name: String,

    /// Replace the recipient set. Repeatable
    #[arg(long = "recipient")]
    recipients: Vec<String>,

    /// Replace the label set. Repeatable
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Replace the description
    #[arg(long)]
    description: Option<String>,

    #[command(flatten)]
    enabled: EnabledFlags,
}

#[derive(Debug, clap::Args)]
#[group(required = false, multiple = false)]
struct EnabledFlags {
    /// Enable the alias
    #[arg(long)]
    enable: bool,

    /// Disable the alias
    #[arg(long)]
    disable: bool,
}

impl EnabledFlags {
    fn as_update(&self) -> Option<bool> {
        if self.enable {
            Some(true)
        } else if self.disable {
            Some(false)
        } else {
            None
        }
    }
}

impl Update {
    pub async fn run(&self, settings: &Settings) -> Result {
        let update = aliases::AliasUpdate {
            recipients: (!self.recipients.is_empty()).then(|| self.recipients.clone()),
            is_enabled: self.enabled.as_update(),
            labels: (!self.labels.is_empty()).then(|| self.labels.clone()),
            description: self.description.clone(),
        };
        if update == aliases::AliasUpdate::default() {
            bail!("nothing to update");
        }

        let client = settings.api.client()?;
        let alias = aliases::for_name(&client, &self.domain, &self.name)
            .await?
            .ok_or_else(|| anyhow!("alias {} not found in {}", self.name, self.domain))?;
        let updated = aliases::update(&client, &self.domain, &alias.id, &update).await?;
        print_json(&updated)
    }
}

/// Delete an alias.
#[derive(Debug, clap::Args)]
pub struct Delete {
    /// Domain the alias lives in
    domain: String,

    /// Alias name to delete
    name: String,
}

impl Delete {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let alias = aliases::for_name(&client, &self.domain, &self.name)
            .await?
            .ok_or_else(|| anyhow!("alias {} not found in {}", self.name, self.domain))?;
        aliases::delete(&client, &self.domain, &alias.id).await?;
        Ok(())
    }
}

/// Export a domain's aliases to a file or stdout.
#[derive(Debug, clap::Args)]
pub struct Export {
    /// Domain to export aliases from
    domain: String,

    /// Output format
    #[arg(long, default_value_t = Format::Csv)]
    format: Format,

    /// File to write. Stdout when omitted
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

impl Export {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let aliases = aliases::all_collect(&client, &self.domain).await?;
        match &self.output {
            Some(path) => output_aliases(File::create(path)?, &self.format, &aliases),
            None => output_aliases(io::stdout(), &self.format, &aliases),
        }
    }
}

/// Import aliases from a csv file, as written by export. Existing aliases
/// are left alone; the sync command is the way to reconcile differences.
#[derive(Debug, clap::Args)]
pub struct Import {
    /// Domain to import aliases into
    domain: String,

    /// Csv file to read
    file: PathBuf,

    /// Retries for transient create failures
    #[arg(long, default_value_t = 0)]
    retries: usize,
}

impl Import {
    pub async fn run(&self, settings: &Settings) -> Result {
        let mut reader = csv::Reader::from_path(&self.file)?;
        let records = reader
            .deserialize::<AliasRecord>()
            .map(|row| row.map(aliases::NewAlias::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if records.is_empty() {
            bail!("no aliases found in {}", self.file.display());
        }

        let client = settings.api.client()?;
        let existing = aliases::all_collect(&client, &self.domain).await?;
        let to_create = records
            .into_iter()
            .filter(|alias| !existing.iter().any(|have| have.name == alias.name))
            .collect::<Vec<_>>();
        if to_create.is_empty() {
            println!("nothing to import: all aliases already exist in {}", self.domain);
            return Ok(());
        }

        let retries = match self.retries {
            0 => RetryPolicy::none(),
            retries => RetryPolicy::with_retries(retries),
        };
        let created = aliases::create_many(&client, &self.domain, to_create, retries).await?;
        println!("created {} aliases in {}", created.len(), self.domain);
        Ok(())
    }
}

/// Flat row used for csv import and export. Recipient and label lists are
/// `;` joined in a single column.
#[derive(Debug, Serialize, Deserialize)]
struct AliasRecord {
    name: String,
    recipients: String,
    enabled: bool,
    labels: String,
    description: String,
}

impl From<&aliases::Alias> for AliasRecord {
    fn from(alias: &aliases::Alias) -> Self {
        Self {
            name: alias.name.clone(),
            recipients: alias.recipients.join(";"),
            enabled: alias.is_enabled,
            labels: alias.labels.join(";"),
            description: alias.description.clone(),
        }
    }
}

impl From<AliasRecord> for aliases::NewAlias {
    fn from(record: AliasRecord) -> Self {
        Self {
            name: record.name,
            recipients: split_list(&record.recipients),
            is_enabled: record.enabled,
            labels: split_list(&record.labels),
            description: record.description,
        }
    }
}

fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn output_aliases<W: io::Write>(output: W, format: &Format, aliases: &[aliases::Alias]) -> Result {
    match format {
        // csv needs flat rows
        Format::Csv => {
            let records = aliases.iter().map(AliasRecord::from).collect::<Vec<_>>();
            format.output(output, &records)
        }
        _ => format.output(output, aliases),
    }
}
