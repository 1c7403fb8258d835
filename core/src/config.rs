//! Settings for `UreqTransport`.
//!
//! Loaded from the environment (`SEQUENCER_*` variables) or from JSON. Any
//! field left out keeps its default.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const BASE_URL_VAR: &str = "SEQUENCER_BASE_URL";
pub const MAX_REDIRECTS_VAR: &str = "SEQUENCER_MAX_REDIRECTS";
pub const TIMEOUT_SECS_VAR: &str = "SEQUENCER_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    InvalidVar { var: &'static str, value: String },

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL that relative request paths are resolved against.
    pub base_url: String,
    /// Redirects the transport follows before handing a 3xx back.
    pub max_redirects: u32,
    /// Global per-request timeout enforced by the HTTP client.
    pub timeout_secs: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            max_redirects: 0,
            timeout_secs: None,
        }
    }
}

impl TransportConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(MAX_REDIRECTS_VAR) {
            config.max_redirects = parse_var(MAX_REDIRECTS_VAR, raw)?;
        }
        if let Some(raw) = lookup(TIMEOUT_SECS_VAR) {
            config.timeout_secs = Some(parse_var(TIMEOUT_SECS_VAR, raw)?);
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidVar { var, value })
}
