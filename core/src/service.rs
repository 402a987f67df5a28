//! Request executor: typed JSON calls that always resolve to an `Outcome`.
//!
//! # Design
//! `ApiService` owns its base URL and shares a `Session` (token + refresh
//! gate) with other services of the same account. Each call starts from a
//! relative `HttpRequest` template. The template is decorated on every
//! attempt, so a retry after a refresh picks up the new bearer token.
//!
//! The expiry status triggers the refresh gate and exactly one retry. No
//! error leaves `execute`: transport failures, error statuses and decode
//! failures all come back as `Outcome::Failure`.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::caller::{ApiCaller, BaseUrl};
use crate::classifier::{classify_error, classify_response, BAD_REQUEST, TOKEN_EXPIRED};
use crate::error::{ConfigError, RequestError};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport, DEFAULT_TIMEOUT,
};
use crate::outcome::{Failure, Outcome};
use crate::recorder::{FailureRecorder, TracingRecorder};
use crate::session::Session;

const JSON: &str = "application/json";

/// Authenticated JSON client for one external service.
pub struct ApiService {
    base_url: BaseUrl,
    allow_insecure: bool,
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    recorder: Arc<dyn FailureRecorder>,
}

impl ApiService {
    pub fn builder() -> ApiServiceBuilder {
        ApiServiceBuilder::default()
    }

    /// Builder preloaded with the base URL `C` declares.
    pub fn for_caller<C: ApiCaller>() -> ApiServiceBuilder {
        ApiServiceBuilder::default().base_url(C::BASE_URL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Replace the base URL. On error the previous value is kept.
    pub fn set_base_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.base_url = BaseUrl::parse_with(url, self.allow_insecure)?;
        Ok(())
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Outcome<T> {
        let query = query
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        self.execute(HttpRequest::new(HttpMethod::Get, endpoint).with_query(query))
            .await
    }

    pub async fn post<T, B>(&self, endpoint: &str, payload: &B) -> Outcome<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(HttpMethod::Post, endpoint, payload).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, payload: &B) -> Outcome<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(HttpMethod::Put, endpoint, payload).await
    }

    pub async fn patch<T, B>(&self, endpoint: &str, payload: &B) -> Outcome<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(HttpMethod::Patch, endpoint, payload).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Outcome<T> {
        self.execute(HttpRequest::new(HttpMethod::Delete, endpoint)).await
    }

    async fn send_json<T, B>(&self, method: HttpMethod, endpoint: &str, payload: &B) -> Outcome<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        match serde_json::to_string(payload) {
            Ok(body) => {
                self.execute(HttpRequest::new(method, endpoint).with_body(body))
                    .await
            }
            Err(err) => {
                let err = RequestError::Encode(err);
                Outcome::Failure(classify_error(&err, self.recorder.as_ref()))
            }
        }
    }

    /// Execute a relative request template.
    #[instrument(skip_all, fields(method = template.method.as_str(), endpoint = %template.url))]
    pub async fn execute<T: DeserializeOwned>(&self, template: HttpRequest) -> Outcome<T> {
        match self.dispatch(&template).await {
            Ok((response, generation)) if response.status == TOKEN_EXPIRED => {
                self.retry_after_refresh(&template, generation).await
            }
            Ok((response, _)) => classify_response(response, self.recorder.as_ref()),
            Err(err) => Outcome::Failure(classify_error(&err, self.recorder.as_ref())),
        }
    }

    async fn retry_after_refresh<T: DeserializeOwned>(
        &self,
        template: &HttpRequest,
        generation: u64,
    ) -> Outcome<T> {
        debug!(generation, "token expired, refreshing before retry");
        self.session.refresh_token(generation).await;

        match self.dispatch(template).await {
            Ok((response, _)) if response.status >= BAD_REQUEST => {
                warn!(status = response.status, "retry after token refresh failed");
                let message = format!("token refreshed but retry failed: {}", response.body);
                Outcome::Failure(Failure::from_response(&response, message))
            }
            Ok((response, _)) => classify_response(response, self.recorder.as_ref()),
            Err(err) => Outcome::Failure(classify_error(&err, self.recorder.as_ref())),
        }
    }

    /// Send one attempt. Returns the response and the token generation the
    /// request carried.
    async fn dispatch(&self, template: &HttpRequest) -> Result<(HttpResponse, u64), RequestError> {
        let (token, generation) = self.session.snapshot().await;
        let request = self.decorate(template, token.as_deref());
        debug!(url = %request.url, "dispatching request");
        let response = self.transport.send(request).await?;
        Ok((response, generation))
    }

    fn decorate(&self, template: &HttpRequest, token: Option<&str>) -> HttpRequest {
        let mut request = template.clone();
        request.url = self.base_url.join(&template.url);
        request.headers.push(("Accept".to_string(), JSON.to_string()));
        if request.body.is_some() {
            request.headers.push(("Content-Type".to_string(), JSON.to_string()));
        }
        if let Some(token) = token {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        request
    }
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Builder for `ApiService`.
#[derive(Default)]
pub struct ApiServiceBuilder {
    base_url: String,
    allow_insecure: bool,
    timeout: Option<Duration>,
    session: Option<Arc<Session>>,
    transport: Option<Arc<dyn Transport>>,
    recorder: Option<Arc<dyn FailureRecorder>>,
}

impl ApiServiceBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Share auth state with other services. Defaults to a fresh session.
    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Defaults to `ReqwestTransport` with the configured timeout.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Defaults to `TracingRecorder`.
    pub fn recorder(mut self, recorder: Arc<dyn FailureRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Request timeout for the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Accept `http://` base URLs. Traffic is not encrypted; meant for local
    /// mock servers.
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        warn!("allow_insecure_http() called - HTTP traffic will NOT be encrypted");
        self.allow_insecure = true;
        self
    }

    pub fn build(self) -> Result<ApiService, ConfigError> {
        let base_url = BaseUrl::parse_with(&self.base_url, self.allow_insecure)?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
                let transport = ReqwestTransport::with_timeout(timeout)
                    .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
                Arc::new(transport)
            }
        };
        Ok(ApiService {
            base_url,
            allow_insecure: self.allow_insecure,
            session: self.session.unwrap_or_else(|| Arc::new(Session::new())),
            transport,
            recorder: self.recorder.unwrap_or_else(|| Arc::new(TracingRecorder)),
        })
    }
}
