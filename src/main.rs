use clap::Parser;
use fwdctl::{cmd, settings::Settings, Result};
use std::{path::PathBuf, process};

#[derive(Debug, Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Manage Forward Email domains, aliases and outbound email")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,

    /// Configuration file to use
    #[arg(short = 'c', default_value = "settings.toml")]
    config: PathBuf,
}

#[derive(Debug, clap::Subcommand)]
pub enum Cmd {
    Account(cmd::account::Cmd),
    Domains(cmd::domains::Cmd),
    Aliases(cmd::aliases::Cmd),
    Emails(cmd::emails::Cmd),
    Sync(cmd::sync::Cmd),
}

#[tokio::main]
async fn main() -> Result {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {:?}", e);
        process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result {
    let settings = Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(&settings.log)
        .init();

    match cli.cmd {
        Cmd::Account(cmd) => cmd.run(&settings).await,
        Cmd::Domains(cmd) => cmd.run(&settings).await,
        Cmd::Aliases(cmd) => cmd.run(&settings).await,
        Cmd::Emails(cmd) => cmd.run(&settings).await,
        Cmd::Sync(cmd) => cmd.run(&settings).await,
    }
}
