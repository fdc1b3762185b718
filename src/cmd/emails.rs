use crate::{cmd::print_json, settings::Settings, Result};
use anyhow::bail;
use forwardemail::emails;
use futures::TryStreamExt;

/// Commands on sent and queued outbound email.
#[derive(Debug, clap::Args)]
pub struct Cmd {
    #[command(subcommand)]
    cmd: EmailsCommand,
}

impl Cmd {
    pub async fn run(&self, settings: &Settings) -> Result {
        self.cmd.run(settings).await
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum EmailsCommand {
    List(List),
    Get(Get),
    Send(Send),
    Delete(Delete),
}

impl EmailsCommand {
    pub async fn run(&self, settings: &Settings) -> Result {
        match self {
            Self::List(cmd) => cmd.run(settings).await,
            Self::Get(cmd) => cmd.run(settings).await,
            Self::Send(cmd) => cmd.run(settings).await,
            Self::Delete(cmd) => cmd.run(settings).await,
        }
    }
}

/// List the account's outbound emails.
#[derive(Debug, clap::Args)]
pub struct List {
    /// Only emails sent from this domain
    #[arg(long)]
    domain: Option<String>,
}

impl List {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let query = emails::EmailsQuery {
            domain: self.domain.clone(),
            ..Default::default()
        };
        let emails = emails::all(&client, query).try_collect::<Vec<_>>().await?;
        print_json(&emails)
    }
}

/// Get one outbound email, including its delivery status.
#[derive(Debug, clap::Args)]
pub struct Get {
    /// Email id to get
    id: String,
}

impl Get {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let email = emails::get(&client, &self.id).await?;
        print_json(&email)
    }
}

/// Send an email through the account's outbound quota.
#[derive(Debug, clap::Args)]
pub struct Send {
    /// Sender address. Must be an alias on one of the account's domains
    #[arg(long)]
    from: String,

    /// Recipient address. Repeatable
    #[arg(long = "to", required = true)]
    to: Vec<String>,

    /// Subject line
    #[arg(long)]
    subject: String,

    /// Plain text body
    #[arg(long)]
    text: Option<String>,

    /// Html body
    #[arg(long)]
    html: Option<String>,
}

impl Send {
    pub async fn run(&self, settings: &Settings) -> Result {
        if self.text.is_none() && self.html.is_none() {
            bail!("one of --text or --html is required");
        }
        let client = settings.api.client()?;
        let email = emails::send(
            &client,
            &emails::NewEmail {
                from: self.from.clone(),
                to: self.to.clone(),
                subject: self.subject.clone(),
                text: self.text.clone(),
                html: self.html.clone(),
            },
        )
        .await?;
        print_json(&email)
    }
}

/// Delete an outbound email record.
#[derive(Debug, clap::Args)]
pub struct Delete {
    /// Email id to delete
    id: String,
}

impl Delete {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        emails::delete(&client, &self.id).await?;
        Ok(())
    }
}
