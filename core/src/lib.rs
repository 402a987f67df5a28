//! Async API call pipeline for the news service.
//!
//! # Overview
//! `ApiService` issues authenticated JSON requests and turns every result
//! into an `Outcome`: `Success` with status, decoded body and headers, or
//! `Failure` with whatever status, message and headers are known. An
//! expired token (status 498) goes through the session's refresh gate and
//! the request is retried once.
//!
//! # Design
//! - Requests and responses cross the `Transport` trait as plain data, so
//!   the executor is tested with scripted transports and the production path
//!   uses reqwest.
//! - `Session` holds the token and refresh gate and is shared through `Arc`
//!   by every caller of one account. Each `ApiService` owns its base URL.
//! - Callers declare their host with `ApiCaller::BASE_URL`.
//! - Severe failures go to an injected `FailureRecorder`.

pub mod caller;
pub mod classifier;
pub mod config;
pub mod error;
pub mod http;
pub mod news;
pub mod outcome;
pub mod recorder;
pub mod refresh;
pub mod service;
pub mod session;

pub use caller::{ApiCaller, BaseUrl};
pub use classifier::TOKEN_EXPIRED;
pub use config::ClientConfig;
pub use error::{ConfigError, RefreshError, RequestError, TransportError};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use news::{News, NewsApiCaller, NewsQuery, NewsRepository, NewsResponse};
pub use outcome::{Failure, Outcome, Response};
pub use recorder::{FailureRecorder, TracingRecorder};
pub use refresh::{NoopRefresher, RefreshPolicy, TokenRefresher};
pub use service::{ApiService, ApiServiceBuilder};
pub use session::Session;
