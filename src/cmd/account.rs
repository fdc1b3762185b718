use crate::{cmd::print_json, settings::Settings, Result};
use forwardemail::account;

/// Get information about the authenticated account.
#[derive(Debug, clap::Args)]
pub struct Cmd {}

impl Cmd {
    pub async fn run(&self, settings: &Settings) -> Result {
        let client = settings.api.client()?;
        let account = account::get(&client).await?;
        print_json(&account)
    }
}
