//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. The mobile shell
//! normally injects everything through the environment; the TOML file path
//! exists for desktop/CI runs. Tokens never appear in configuration — only
//! the storage keys they live under.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API origin, e.g. `https://api.medhire.example`. Required.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Secure-store key holding the access token.
    pub access_token_key: String,
    /// Secure-store key holding the refresh token.
    pub refresh_token_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 30_000,
            access_token_key: "medhire.access_token".into(),
            refresh_token_key: "medhire.refresh_token".into(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment only (defaults + env vars).
    pub fn from_env() -> common::Result<Self> {
        Self::load(None)
    }

    /// Load configuration from an optional TOML file, then overlay
    /// environment variables.
    ///
    /// Recognized variables: `MEDHIRE_BASE_URL`, `MEDHIRE_TIMEOUT_MS`,
    /// `MEDHIRE_ACCESS_TOKEN_KEY`, `MEDHIRE_REFRESH_TOKEN_KEY`.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        let mut config = match path {
            Some(p) => {
                let contents = std::fs::read_to_string(p)?;
                toml::from_str(&contents)?
            }
            None => Self::default(),
        };

        if let Ok(url) = std::env::var("MEDHIRE_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(ms) = std::env::var("MEDHIRE_TIMEOUT_MS") {
            config.timeout_ms = ms.parse().map_err(|_| {
                common::Error::Config(format!("MEDHIRE_TIMEOUT_MS must be an integer, got: {ms}"))
            })?;
        }
        if let Ok(key) = std::env::var("MEDHIRE_ACCESS_TOKEN_KEY") {
            config.access_token_key = key;
        }
        if let Ok(key) = std::env::var("MEDHIRE_REFRESH_TOKEN_KEY") {
            config.refresh_token_key = key;
        }

        config.validate()?;
        Ok(config)
    }

    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(common::Error::Config(
                "timeout_ms must be greater than 0".into(),
            ));
        }
        if self.access_token_key.is_empty() || self.refresh_token_key.is_empty() {
            return Err(common::Error::Config(
                "token storage keys must be non-empty".into(),
            ));
        }
        Ok(())
    }
}
