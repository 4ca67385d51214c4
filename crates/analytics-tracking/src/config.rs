use std::env;

use thiserror::Error;
use xconnect_client::TRACKER_IDENTIFIER_SOURCE;

pub const ENV_TRACKING_ENABLED: &str = "TRACKING_ENABLED";
pub const ENV_TRACKING_IDENTIFIER_SOURCE: &str = "TRACKING_IDENTIFIER_SOURCE";
pub const ENV_TRACKING_AUTO_START: &str = "TRACKING_AUTO_START";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Global tracker switch. When off every tracking call is a no-op.
    pub enabled: bool,
    /// Source under which session contacts are keyed in xConnect.
    pub identifier_source: String,
    /// Whether the liveness check starts an inactive session.
    pub auto_start: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            identifier_source: TRACKER_IDENTIFIER_SOURCE.to_string(),
            auto_start: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid TRACKING_ENABLED: {0}")]
    InvalidEnabled(String),
    #[error("invalid TRACKING_IDENTIFIER_SOURCE: {0}")]
    InvalidIdentifierSource(String),
    #[error("invalid TRACKING_AUTO_START: {0}")]
    InvalidAutoStart(String),
}

impl TrackingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let enabled = match value(ENV_TRACKING_ENABLED) {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidEnabled(raw))?,
            None => defaults.enabled,
        };
        let identifier_source = match lookup(ENV_TRACKING_IDENTIFIER_SOURCE) {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::InvalidIdentifierSource(
                    "must not be blank".to_string(),
                ));
            }
            Some(raw) => raw.trim().to_string(),
            None => defaults.identifier_source,
        };
        let auto_start = match value(ENV_TRACKING_AUTO_START) {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidAutoStart(raw))?,
            None => defaults.auto_start,
        };

        Ok(Self {
            enabled,
            identifier_source,
            auto_start,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
