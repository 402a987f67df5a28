//! Client configuration read from the environment.

use std::time::Duration;

use crate::error::ConfigError;
use crate::http::DEFAULT_TIMEOUT;

pub const ENV_BASE_URL: &str = "NEWS_API_BASE_URL";
pub const ENV_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "NEWS_API_TIMEOUT_SECS";

/// Settings for building callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Overrides the caller's declared host when set.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let timeout = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_TIMEOUT_SECS.to_string(),
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            base_url: get(ENV_BASE_URL),
            api_key: get(ENV_API_KEY),
            timeout,
        })
    }
}
