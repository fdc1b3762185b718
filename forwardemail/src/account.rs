use crate::{deserialize_null_string, Client, Result, NO_QUERY};
use serde::{Deserialize, Serialize};

pub async fn get(client: &Client) -> Result<Account> {
    client.fetch("/v1/account", NO_QUERY).await
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Account {
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_null_string::deserialize"
    )]
    pub email: String,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_null_string::deserialize"
    )]
    pub plan: String,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_null_string::deserialize"
    )]
    pub full_email: String,
}
