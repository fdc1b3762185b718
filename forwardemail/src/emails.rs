use crate::{deserialize_null_string, Client, PagedQuery, Result, Stream, NO_QUERY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub fn all(client: &Client, query: EmailsQuery) -> Stream<Email> {
    client.fetch_stream::<EmailsQuery, Vec<Email>>("/v1/emails", query)
}

pub async fn get(client: &Client, email_id: &str) -> Result<Email> {
    client
        .fetch(&format!("/v1/emails/{email_id}"), NO_QUERY)
        .await
}

/// Queue an email for delivery through the account's outbound smtp quota
pub async fn send(client: &Client, email: &NewEmail) -> Result<Email> {
    client.post("/v1/emails", email).await
}

pub async fn delete(client: &Client, email_id: &str) -> Result<()> {
    client.delete(&format!("/v1/emails/{email_id}")).await
}

/// Delivery state as reported by the api. Unrecognized states map to
/// `Unknown` so new server side states do not break deserialization.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Pending,
    Queued,
    Sent,
    Deferred,
    Bounced,
    Rejected,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Email {
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
    pub subject: String,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_null_string::deserialize"
    )]
    pub from: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(default)]
    pub status: EmailStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for sending an email. At least one of `text` or `html` should be
/// set; the api rejects empty bodies.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EmailsQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Default for EmailsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: crate::DEFAULT_QUERY_LIMIT,
            domain: None,
        }
    }
}

impl PagedQuery for EmailsQuery {
    fn page(&self) -> u32 {
        self.page
    }

    fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_status() {
        let status: EmailStatus =
            serde_json::from_value(serde_json::json!("sent")).expect("status");
        assert_eq!(status, EmailStatus::Sent);
    }

    #[test]
    fn unrecognized_status() {
        let status: EmailStatus =
            serde_json::from_value(serde_json::json!("quarantined")).expect("status");
        assert_eq!(status, EmailStatus::Unknown);
    }
}
