//! Error types for the news API pipeline.
//!
//! # Design
//! `ConfigError` is the only error a caller ever sees as `Err`: it is raised
//! when a base URL or environment value is rejected. Everything that happens
//! while a request is in flight is a `RequestError`, which the classifier
//! turns into an `Outcome::Failure` value before it reaches the caller.
//! Variants that have a server response attached keep it, so the resulting
//! failure can report the status and headers.

use thiserror::Error;

use crate::http::HttpResponse;

/// Rejected configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL does not use an allowed scheme.
    #[error("base URL must use https: {url}")]
    InsecureBaseUrl { url: String },

    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: String, value: String },

    /// The default HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Failure that prevented a response from arriving.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Anything that went wrong while executing one request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered with a client or server error status.
    #[error("HTTP {}: {}", .0.status, .0.body)]
    Status(HttpResponse),

    /// The request did not complete within the transport timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection or protocol failure.
    #[error("{0}")]
    Transport(TransportError),

    /// The response body could not be decoded into the expected type.
    #[error("failed to decode response body: {source}")]
    Decode {
        response: HttpResponse,
        #[source]
        source: serde_json::Error,
    },

    /// The request payload could not be encoded as JSON.
    #[error("failed to encode request payload: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(detail) => RequestError::Timeout(detail),
            other => RequestError::Transport(other),
        }
    }
}

impl RequestError {
    /// Response the error is attached to, if the server answered at all.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            RequestError::Status(response) | RequestError::Decode { response, .. } => {
                Some(response)
            }
            _ => None,
        }
    }
}

/// A token refresh attempt failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("token refresh failed: {0}")]
pub struct RefreshError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_transport_error_maps_to_timeout_variant() {
        let err = RequestError::from(TransportError::Timeout("20s".to_string()));
        assert!(matches!(err, RequestError::Timeout(ref d) if d == "20s"));
        assert!(err.response().is_none());
    }

    #[test]
    fn connect_error_stays_transport() {
        let err = RequestError::from(TransportError::Connect("refused".to_string()));
        assert!(matches!(err, RequestError::Transport(TransportError::Connect(_))));
        assert_eq!(err.to_string(), "connection failed: refused");
    }

    #[test]
    fn status_error_exposes_response() {
        let err = RequestError::Status(HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: "missing".to_string(),
        });
        assert_eq!(err.response().map(|r| r.status), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: missing");
    }

    #[test]
    fn config_error_message_names_url() {
        let err = ConfigError::InsecureBaseUrl {
            url: "ftp://x".to_string(),
        };
        assert_eq!(err.to_string(), "base URL must use https: ftp://x");
    }
}
