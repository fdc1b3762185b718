use crate::{
    deserialize_null_string, paged_query_impl, query_default_impl, Client, Error, Result,
    RetryPolicy, Stream, NO_QUERY,
};
use futures::{
    stream::{StreamExt, TryStreamExt},
    TryFutureExt,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tokio::sync::RwLock;
use tokio_retry2::Retry;

pub fn all(client: &Client, domain: &str, query: AliasesQuery) -> Stream<Alias> {
    client
        .fetch_stream::<AliasesQuery, Vec<Alias>>(&format!("/v1/domains/{domain}/aliases"), query)
}

pub async fn all_collect(client: &Client, domain: &str) -> Result<Vec<Alias>> {
    all(client, domain, AliasesQuery::default())
        .try_collect()
        .await
}

pub async fn get(client: &Client, domain: &str, alias_id: &str) -> Result<Alias> {
    client
        .fetch(&format!("/v1/domains/{domain}/aliases/{alias_id}"), NO_QUERY)
        .await
}

/// Look an alias up by name. Names are unique within a domain but the api
/// addresses aliases by id, so this lists and scans.
pub async fn for_name(client: &Client, domain: &str, name: &str) -> Result<Option<Alias>> {
    let aliases = all_collect(client, domain).await?;
    Ok(aliases.into_iter().find(|alias| alias.name == name))
}

pub async fn create(client: &Client, domain: &str, alias: &NewAlias) -> Result<Alias> {
    client
        .post(&format!("/v1/domains/{domain}/aliases"), alias)
        .await
}

pub async fn update(
    client: &Client,
    domain: &str,
    alias_id: &str,
    update: &AliasUpdate,
) -> Result<Alias> {
    client
        .put(&format!("/v1/domains/{domain}/aliases/{alias_id}"), update)
        .await
}

pub async fn delete(client: &Client, domain: &str, alias_id: &str) -> Result<()> {
    client
        .delete(&format!("/v1/domains/{domain}/aliases/{alias_id}"))
        .await
}

/// Max concurrent create requests. The api rate limits above this.
pub const ALIAS_CREATE_CONCURRENCY: usize = 4;

/// Create a given set of aliases in the given domain, retrying transient
/// failures per the given policy.
///
/// Returns the names of the created aliases
pub async fn create_many(
    client: &Client,
    domain: &str,
    aliases: Vec<NewAlias>,
    retries: RetryPolicy,
) -> Result<HashSet<String>> {
    let created = Arc::new(RwLock::new(HashSet::new()));
    futures::stream::iter(aliases)
        .map(Ok::<_, Error>)
        .map_ok(|alias| (client.clone(), alias, created.clone(), retries))
        .try_for_each_concurrent(
            ALIAS_CREATE_CONCURRENCY,
            |(client, alias, created, retries)| async move {
                let response = Retry::spawn_notify(
                    retries,
                    || create(&client, domain, &alias).map_err(|err| err.into_retry()),
                    |err: &Error, sleep: std::time::Duration| {
                        tracing::warn!(%err, sleep = sleep.as_secs(), "alias create")
                    },
                )
                .await?;
                created.write().await.insert(response.name);
                Ok(())
            },
        )
        .await?;
    let inner = created.read_owned().await;
    Ok(inner.to_owned())
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct Alias {
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_null_string::deserialize"
    )]
    pub id: String,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_null_string::deserialize"
    )]
    pub name: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_null_string::deserialize"
    )]
    pub description: String,
}

/// Payload for creating an alias
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewAlias {
    pub name: String,
    pub recipients: Vec<String>,
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl From<&Alias> for NewAlias {
    fn from(alias: &Alias) -> Self {
        Self {
            name: alias.name.clone(),
            recipients: alias.recipients.clone(),
            is_enabled: alias.is_enabled,
            labels: alias.labels.clone(),
            description: alias.description.clone(),
        }
    }
}

/// Partial update for an alias. Fields left as `None` are not modified.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct AliasUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AliasesQuery {
    pub page: u32,
    pub limit: u32,
}

query_default_impl!(AliasesQuery);
paged_query_impl!(AliasesQuery);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_from_api_json() {
        let alias: Alias = serde_json::from_value(serde_json::json!({
            "id": "66dbe2b3a4496c28f0f0d2a6",
            "name": "sales",
            "is_enabled": true,
            "recipients": ["team@corp.example"],
            "labels": ["crm"],
            "description": null,
            "has_recipient_verification": false
        }))
        .expect("alias");
        assert_eq!(alias.name, "sales");
        assert!(alias.is_enabled);
        assert_eq!(alias.recipients, vec!["team@corp.example".to_string()]);
        assert_eq!(alias.description, "");
    }

    #[test]
    fn update_skips_unset_fields() {
        let update = AliasUpdate {
            is_enabled: Some(false),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&update).expect("json"),
            r#"{"is_enabled":false}"#
        );
    }
}
