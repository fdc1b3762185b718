use crate::{
    deserialize_null_string, paged_query_impl, query_default_impl, Client, Result, Stream, NO_QUERY,
};
use serde::{Deserialize, Serialize};

pub fn all(client: &Client) -> Stream<Domain> {
    client.fetch_stream::<DomainsQuery, Vec<Domain>>("/v1/domains", DomainsQuery::default())
}

pub async fn get(client: &Client, domain: &str) -> Result<Domain> {
    client
        .fetch(&format!("/v1/domains/{domain}"), NO_QUERY)
        .await
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Domain {
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
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_null_string::deserialize"
    )]
    pub plan: String,
    #[serde(default)]
    pub has_mx_record: bool,
    #[serde(default)]
    pub has_txt_record: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DomainsQuery {
    pub page: u32,
    pub limit: u32,
}

query_default_impl!(DomainsQuery);
paged_query_impl!(DomainsQuery);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_from_api_json() {
        let domain: Domain = serde_json::from_value(serde_json::json!({
            "id": "66dbe2b3a4496c28f0f0d111",
            "name": "corp.example",
            "plan": "enhanced_protection",
            "has_mx_record": true,
            "has_txt_record": true,
            "members": []
        }))
        .expect("domain");
        assert_eq!(domain.name, "corp.example");
        assert!(domain.has_mx_record);
    }
}
