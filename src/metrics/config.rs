//! Metrics Filter Configuration
//!
//! Loads the metric allowlist from TOML:
//!
//! ```toml
//! allowed_metrics = ["service_requests", "service_latency"]
//! ```
//!
//! A missing key or an empty list lets every metric through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::Allowlist;

/// Error type for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io(std::io::Error),
    /// Config contents are not valid TOML for this schema
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read metrics filter config: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid metrics filter config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Metric filtering configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsFilterConfig {
    /// Metric names allowed through. `None` or empty allows all.
    pub allowed_metrics: Option<Vec<String>>,
}

impl MetricsFilterConfig {
    /// Config that lets every metric through
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Restrict to the given names
    pub fn with_allowed<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_metrics = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            allowed = config.allowed_metrics.as_ref().map_or(0, Vec::len),
            "Loaded metrics filter config"
        );
        Ok(config)
    }

    /// Check if this config restricts anything
    pub fn is_filtering(&self) -> bool {
        self.allowed_metrics.as_ref().is_some_and(|names| !names.is_empty())
    }

    pub fn allowlist(&self) -> Allowlist {
        Allowlist::from(self.allowed_metrics.clone())
    }
}
