use std::{fmt, fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{AlgoliaError, Result};

const DEFAULT_TIMEOUT: u64 = 30_000;
const DEFAULT_LOOKUP_CACHE_CAPACITY: u64 = 64;

#[derive(Clone, Deserialize)]
pub struct Config {
    /// algolia application id
    pub application_id: String,
    /// algolia api key, sent as `x-algolia-api-key`
    pub api_key: String,
    /// base url override, defaults to `https://{application_id}.algolia.net`
    #[serde(default)]
    pub host: Option<String>,
    /// request timeout in milliseconds, defaults to 30000
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// number of cached dynamic-choice lookups, defaults to 64
    #[serde(default = "default_lookup_cache_capacity")]
    pub lookup_cache_capacity: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

fn default_lookup_cache_capacity() -> u64 {
    DEFAULT_LOOKUP_CACHE_CAPACITY
}

impl fmt::Debug for Config {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Config")
            .field("application_id", &self.application_id)
            .field("api_key", &"<redacted>")
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .field("lookup_cache_capacity", &self.lookup_cache_capacity)
            .finish()
    }
}

impl Config {
    pub fn new(
        application_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            api_key: api_key.into(),
            host: None,
            timeout: DEFAULT_TIMEOUT,
            lookup_cache_capacity: DEFAULT_LOOKUP_CACHE_CAPACITY,
        }
    }

    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str).map_err(|err| AlgoliaError::Config(format!("failed to parse the toml str: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_host(
        mut self,
        host: impl Into<String>,
    ) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_timeout(
        mut self,
        timeout: u64,
    ) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base url every request path is appended to, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}.algolia.net", self.application_id),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    fn validate(&self) -> Result<()> {
        if self.application_id.trim().is_empty() {
            return Err(AlgoliaError::Config("application_id must not be empty".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(AlgoliaError::Config("api_key must not be empty".to_string()));
        }
        Ok(())
    }
}
