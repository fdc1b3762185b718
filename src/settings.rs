use crate::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Tracing filter for log output, overridable with FWDCTL_LOG
    #[serde(default = "default_log")]
    pub log: String,
    pub api: ApiSettings,
}

impl Settings {
    /// Settings are loaded from the file at the given path (if present),
    /// with FWDCTL prefixed environment variables taking precedence. The api
    /// key, for example, can be given as FWDCTL_API__KEY.
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Config::builder()
            // Source settings file
            .add_source(File::with_name(path.to_str().expect("file name")).required(false))
            .add_source(Environment::with_prefix("FWDCTL").separator("__"))
            .build()
            .and_then(|config| config.try_deserialize())?)
    }
}

fn default_log() -> String {
    "fwdctl=info,forwardemail=info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Forward Email api key
    pub key: String,
    /// Override the api endpoint, mostly useful for testing
    #[serde(default)]
    pub url: Option<String>,
    /// Per request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    forwardemail::DEFAULT_TIMEOUT
}

impl ApiSettings {
    pub fn client(&self) -> Result<forwardemail::Client> {
        let auth = match &self.url {
            Some(url) => forwardemail::AuthMode::with_endpoint(&self.key, url)?,
            None => forwardemail::AuthMode::new_basic_auth(&self.key)?,
        };
        Ok(forwardemail::Client::new_with_timeout(auth, self.timeout))
    }
}
