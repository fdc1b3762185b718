use thiserror::Error;

pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed api key")]
    MalformedApiKey,
    #[error("malformed url: {0}")]
    MalformedUrl(#[from] url::ParseError),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("api error {}: {}", .0.status_code, .0.message)]
    Api(ApiError),
}

/// Error body returned by the v1 api for non success responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ApiError {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl Error {
    pub fn api(value: ApiError) -> Self {
        Self::Api(value)
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            // bad requests and authn/authz or addressing failures do not get
            // better on retry
            Self::Api(api_error) if matches!(api_error.status_code, 400 | 401 | 403 | 404) => false,
            // rate limits and server side failures do
            Self::Api(_) => true,
            Self::Request(_) => true,
            _ => false,
        }
    }

    pub fn into_retry(self) -> tokio_retry2::RetryError<Self> {
        if self.is_retryable() {
            tokio_retry2::RetryError::transient(self)
        } else {
            tokio_retry2::RetryError::permanent(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_body() {
        let api_error: ApiError = serde_json::from_str(
            r#"{"statusCode": 429, "error": "Too Many Requests", "message": "Rate limit exceeded"}"#,
        )
        .expect("api error");
        assert_eq!(api_error.status_code, 429);
        assert!(Error::api(api_error).is_retryable());
    }

    #[test]
    fn auth_errors_are_permanent() {
        let api_error: ApiError = serde_json::from_str(
            r#"{"statusCode": 401, "error": "Unauthorized", "message": "Invalid API token"}"#,
        )
        .expect("api error");
        assert!(!Error::api(api_error).is_retryable());
    }
}
