use crate::Result;
use async_trait::async_trait;
use forwardemail::aliases::{self, Alias, AliasUpdate, NewAlias};

/// The remote alias store the engine reads and mutates, kept to just what
/// planning and applying need. Tests run against an in-memory stand in.
#[async_trait]
pub trait AliasDirectory: Send + Sync {
    /// The complete current alias set of a domain.
    async fn list_aliases(&self, domain: &str) -> Result<Vec<Alias>>;
    async fn create_alias(&self, domain: &str, alias: &NewAlias) -> Result;
    async fn update_alias(&self, domain: &str, alias_id: &str, update: &AliasUpdate) -> Result;
    async fn delete_alias(&self, domain: &str, alias_id: &str) -> Result;
}

#[async_trait]
impl AliasDirectory for forwardemail::Client {
    async fn list_aliases(&self, domain: &str) -> Result<Vec<Alias>> {
        Ok(aliases::all_collect(self, domain).await?)
    }

    async fn create_alias(&self, domain: &str, alias: &NewAlias) -> Result {
        aliases::create(self, domain, alias).await?;
        Ok(())
    }

    async fn update_alias(&self, domain: &str, alias_id: &str, update: &AliasUpdate) -> Result {
        aliases::update(self, domain, alias_id, update).await?;
        Ok(())
    }

    async fn delete_alias(&self, domain: &str, alias_id: &str) -> Result {
        aliases::delete(self, domain, alias_id).await?;
        Ok(())
    }
}
