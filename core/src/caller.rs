//! Base URL resolution for API callers.
//!
//! Each caller type declares its host as an associated constant and
//! `ApiService::for_caller` binds it when the service is built. Callers that
//! declare nothing get the empty base URL and must pass absolute endpoints or
//! set one later with `ApiService::set_base_url`.

use crate::error::ConfigError;

/// Scheme every production base URL must use.
pub const SECURE_SCHEME: &str = "https://";

const INSECURE_SCHEME: &str = "http://";

/// A per-service API surface with a statically known host.
pub trait ApiCaller {
    const BASE_URL: &'static str = "";
}

/// Base URL declared by `C`.
pub fn resolve_base_url<C: ApiCaller>() -> &'static str {
    C::BASE_URL
}

/// A validated base URL. Empty means "not declared".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Accepts the empty string or an `https://` URL.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        Self::parse_with(url, false)
    }

    pub(crate) fn parse_with(url: &str, allow_insecure: bool) -> Result<Self, ConfigError> {
        let secure = url.starts_with(SECURE_SCHEME);
        let insecure_ok = allow_insecure && url.starts_with(INSECURE_SCHEME);
        if url.is_empty() || secure || insecure_ok {
            return Ok(Self(url.to_string()));
        }
        Err(ConfigError::InsecureBaseUrl {
            url: url.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an endpoint path, with exactly one `/` between the two.
    pub fn join(&self, endpoint: &str) -> String {
        if self.0.is_empty() {
            return endpoint.to_string();
        }
        format!(
            "{}/{}",
            self.0.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}
