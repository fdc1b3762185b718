use futures::{
    future, stream, Future as StdFuture, FutureExt, Stream as StdStream, StreamExt, TryFutureExt,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, RequestBuilder, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, pin::Pin, time::Duration};
use tokio_retry2::strategy::jitter;

/// A type alias for `Future` that may return `crate::error::Error`
pub type Future<T> = Pin<Box<dyn StdFuture<Output = Result<T>> + Send>>;

/// A type alias for `Stream` that may result in `crate::error::Error`
pub type Stream<T> = Pin<Box<dyn StdStream<Item = Result<T>> + Send>>;

mod error;

pub mod account;
pub mod aliases;
pub mod domains;
pub mod emails;

pub use error::{ApiError, Error, Result};

/// The production API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.forwardemail.net";
/// The default timeout for API requests
pub const DEFAULT_TIMEOUT: u64 = 20;
/// A utility constant to pass an empty query slice to the various client fetch
/// functions
pub const NO_QUERY: &[&str; 0] = &[""; 0];
/// Default number of items to request per page
pub const DEFAULT_QUERY_LIMIT: u32 = 1000;

#[derive(Debug, Clone)]
pub struct BasicAuth {
    auth_header: HeaderValue,
    endpoint: Url,
}

#[derive(Debug, Clone)]
pub enum AuthMode {
    Basic(BasicAuth),
}

impl AuthMode {
    pub fn new_basic_auth(key: &str) -> Result<Self> {
        Self::with_endpoint(key, DEFAULT_ENDPOINT)
    }

    /// Basic auth against a given endpoint, mostly useful for testing. The
    /// api key goes in the username slot and the password is left empty.
    pub fn with_endpoint(key: &str, endpoint: &str) -> Result<Self> {
        use base64::Engine;
        if key.is_empty() {
            return Err(Error::MalformedApiKey);
        }
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{key}:").as_bytes());
        let auth_header = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| Error::MalformedApiKey)?;
        let endpoint = Url::parse(endpoint)?;

        Ok(Self::Basic(BasicAuth {
            auth_header,
            endpoint,
        }))
    }

    pub fn to_endpoint_url(&self) -> Url {
        match self {
            Self::Basic(auth) => auth.endpoint.clone(),
        }
    }

    pub fn to_request_url(&self, path: &str) -> Result<Url> {
        let mut uri = path.to_string();

        // Make sure we have the leading "/".
        if !uri.starts_with('/') {
            uri = format!("/{uri}");
        }

        self.to_endpoint_url().join(&uri).map_err(Error::from)
    }

    pub fn to_authorization_header(&self) -> HeaderValue {
        match self {
            Self::Basic(auth) => auth.auth_header.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    auth: AuthMode,
    client: reqwest::Client,
}

impl Client {
    /// Create a new client with the default request timeout. The library
    /// will use absolute paths based on the auth mode's endpoint.
    pub fn new(auth: AuthMode) -> Self {
        Self::new_with_timeout(auth, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a given request timeout in seconds.
    pub fn new_with_timeout(auth: AuthMode, timeout: u64) -> Self {
        let client = reqwest::Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(timeout))
            .build()
            .unwrap();
        Self { auth, client }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.auth.to_request_url(path)?;

        // Set the default headers.
        let mut headers = HeaderMap::new();
        headers.append(AUTHORIZATION, self.auth.to_authorization_header());
        headers.append(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(self.client.request(method, url).headers(headers))
    }

    pub fn fetch<T, Q>(&self, path: &str, query: &Q) -> Future<T>
    where
        T: 'static + DeserializeOwned + Send,
        Q: Serialize + ?Sized,
    {
        match self.request(Method::GET, path) {
            Ok(builder) => builder
                .query(query)
                .send()
                .map_err(Error::from)
                .and_then(|response| {
                    let status = response.status();
                    if status.is_client_error() {
                        return response
                            .json::<ApiError>()
                            .map_err(Error::from)
                            .and_then(|e| async move { Err(Error::api(e)) })
                            .boxed();
                    }
                    match response.error_for_status() {
                        Ok(result) => result
                            .bytes()
                            .map_err(Error::from)
                            .and_then(|bytes| async move {
                                serde_json::from_slice(&bytes).map_err(Error::from)
                            })
                            .boxed(),
                        Err(e) => future::err(Error::from(e)).boxed(),
                    }
                })
                .boxed(),
            Err(e) => future::err(e).boxed(),
        }
    }

    pub fn fetch_stream<Q, R>(&self, path: &str, mut query: Q) -> Stream<R::Item>
    where
        R: PagedResponse + 'static,
        Q: PagedQuery + 'static,
    {
        let client = self.clone();
        let path = path.to_string();

        self.fetch::<R, _>(&path, &query)
            .map_ok(move |data| {
                query.next_page();
                stream::try_unfold(
                    (data, client, path, query),
                    |(mut data, client, path, mut query)| async move {
                        match data.next_item() {
                            Some(entry) => Ok(Some((entry, (data, client, path, query)))),
                            None => {
                                let mut data = client.fetch::<R, _>(&path, &query).await?;
                                if data.is_empty() {
                                    Ok(None)
                                } else {
                                    query.next_page();
                                    let entry = data.next_item().unwrap();
                                    Ok(Some((entry, (data, client, path, query))))
                                }
                            }
                        }
                    },
                )
            })
            .try_flatten_stream()
            .boxed()
    }

    pub fn submit<T, R>(&self, method: Method, path: &str, json: &T) -> Future<R>
    where
        T: Serialize + ?Sized,
        R: 'static + DeserializeOwned + std::marker::Send,
    {
        match self.request(method, path) {
            Ok(builder) => builder
                .json(json)
                .send()
                .map_err(Error::from)
                .and_then(|response| {
                    let status = response.status();
                    if status.is_client_error() {
                        return response
                            .json::<ApiError>()
                            .map_err(Error::from)
                            .and_then(|e| async move { Err(Error::api(e)) })
                            .boxed();
                    }
                    match response.error_for_status() {
                        Ok(result) => result
                            .bytes()
                            .map_err(Error::from)
                            .and_then(|bytes| async move {
                                if bytes.is_empty() {
                                    serde_json::from_str("null").map_err(Error::from)
                                } else {
                                    serde_json::from_slice(&bytes).map_err(Error::from)
                                }
                            })
                            .boxed(),
                        Err(e) => future::err(Error::from(e)).boxed(),
                    }
                })
                .boxed(),
            Err(e) => future::err(e).boxed(),
        }
    }

    pub fn post<T, R>(&self, path: &str, json: &T) -> Future<R>
    where
        T: Serialize + ?Sized,
        R: 'static + DeserializeOwned + std::marker::Send,
    {
        self.submit(Method::POST, path, json)
    }

    pub fn put<T, R>(&self, path: &str, json: &T) -> Future<R>
    where
        T: Serialize + ?Sized,
        R: 'static + DeserializeOwned + std::marker::Send,
    {
        self.submit(Method::PUT, path, json)
    }

    pub fn delete(&self, path: &str) -> Future<()> {
        match self.request(Method::DELETE, path) {
            Ok(builder) => builder
                .send()
                .map_err(Error::from)
                .and_then(|response| match response.error_for_status() {
                    Ok(_) => future::ok(()).boxed(),
                    Err(e) => future::err(Error::from(e)).boxed(),
                })
                .boxed(),
            Err(e) => future::err(e).boxed(),
        }
    }
}

#[derive(Clone, Copy, Default)]
pub enum RetryPolicy {
    #[default]
    None,
    Retries(usize),
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::None
    }

    pub fn with_retries(retries: usize) -> Self {
        Self::Retries(retries)
    }
}

impl IntoIterator for RetryPolicy {
    type Item = Duration;
    type IntoIter = std::vec::IntoIter<Duration>;

    fn into_iter(self) -> Self::IntoIter {
        use tokio_retry2::strategy::ExponentialFactorBackoff;
        let retries = match self {
            Self::None => vec![],
            Self::Retries(retries) => ExponentialFactorBackoff::from_factor(2.)
                .max_delay_millis(5000)
                .map(jitter)
                .take(retries)
                .collect(),
        };
        retries.into_iter()
    }
}

pub trait PagedQuery: Clone + Send + Serialize + Sync {
    fn page(&self) -> u32;
    fn set_page(&mut self, page: u32);
    fn set_limit(&mut self, limit: u32);

    fn next_page(&mut self) {
        self.set_page(self.page() + 1)
    }
}

pub trait PagedResponse: DeserializeOwned + Send + Sync + Debug {
    type Item: DeserializeOwned + Send + Sync + Debug;

    fn next_item(&mut self) -> Option<Self::Item>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collection endpoints return plain json arrays, with paging state carried
/// in response headers the client does not need. Items are yielded in the
/// order the server returned them.
impl<T> PagedResponse for Vec<T>
where
    T: DeserializeOwned + Send + Sync + Debug,
{
    type Item = T;

    fn next_item(&mut self) -> Option<T> {
        if Vec::is_empty(self) {
            None
        } else {
            Some(self.remove(0))
        }
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

macro_rules! paged_query_impl {
    ($query_type:ident) => {
        impl crate::PagedQuery for $query_type {
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
    };
}

macro_rules! query_default_impl {
    ($query_type:ident) => {
        impl Default for $query_type {
            fn default() -> Self {
                Self {
                    page: 1,
                    limit: crate::DEFAULT_QUERY_LIMIT,
                }
            }
        }
    };
}

pub(crate) use {paged_query_impl, query_default_impl};

pub mod deserialize_null_string {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer).unwrap_or_default();

        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_header() {
        let auth = AuthMode::new_basic_auth("abc123").expect("auth mode");
        // base64 of "abc123:"
        assert_eq!(
            auth.to_authorization_header(),
            HeaderValue::from_static("Basic YWJjMTIzOg==")
        );
        assert_eq!(auth.to_endpoint_url().as_str(), "https://api.forwardemail.net/");
    }

    #[test]
    fn empty_api_key() {
        assert!(matches!(
            AuthMode::new_basic_auth(""),
            Err(Error::MalformedApiKey)
        ));
    }

    #[test]
    fn request_url_joins_paths() {
        let auth = AuthMode::with_endpoint("abc123", "https://api.example.net").expect("auth mode");
        let with_slash = auth.to_request_url("/v1/domains").expect("url");
        let without_slash = auth.to_request_url("v1/domains").expect("url");
        assert_eq!(with_slash.as_str(), "https://api.example.net/v1/domains");
        assert_eq!(with_slash, without_slash);
    }

    #[test]
    fn paged_response_keeps_order() {
        let mut page = vec!["a", "b", "c"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        assert_eq!(PagedResponse::next_item(&mut page).as_deref(), Some("a"));
        assert_eq!(PagedResponse::next_item(&mut page).as_deref(), Some("b"));
        assert_eq!(PagedResponse::next_item(&mut page).as_deref(), Some("c"));
        assert_eq!(PagedResponse::next_item(&mut page), None);
    }
}
