use crate::{cmd::print_json, settings::Settings, Result};
use forwardemail::domains;
use futures::TryStreamExt;

/// Commands on the account's domains.
#[derive(Debug, clap::Args)]
pub struct Cmd {
    #[command(subcommand)]
    cmd: DomainsCommand,
}

impl Cmd {
    pub async fn run(&self, settings: &Settings) -> Result {
        self.cmd.run(settings).await
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum DomainsCommand {
    List(List),
    Get(Get),
}

impl DomainsCommand {
    pub async fn run(&self, settings: &Settings) -> Result {
        match self {
            Self::List(cmd) => cmd.run(settings).await,
            Self::Get(cmd) => cmd.run(settings).await,
        }
    }
}

/// List all domains on the account.
#[derive(Debug, clap::Args)]
pub struct List {}

impl List {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let domains = domains::all(&client).try_collect::<Vec<_>>().await?;
        print_json(&domains)
    }
}

/// Get information about one domain.
#[derive(Debug, clap::Args)]
pub struct Get {
    /// Domain name to get
    domain: String,
}

impl Get {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let domain = domains::get(&client, &self.domain).await?;
        print_json(&domain)
    }
}
