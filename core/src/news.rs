//! World-news API: records, the search caller and a thin repository.
//!
//! # Design
//! `NewsApiCaller` declares its host through `ApiCaller` and keeps the
//! per-user search defaults (language, free text) that apply when a query
//! leaves them unset. The API key travels as a query parameter, separate
//! from the session's bearer token.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::caller::ApiCaller;
use crate::config::{ClientConfig, ENV_API_KEY};
use crate::error::ConfigError;
use crate::http::{HttpMethod, HttpRequest};
use crate::outcome::Outcome;
use crate::service::{ApiService, ApiServiceBuilder};

/// Endpoint for article search.
pub const SEARCH_NEWS: &str = "search-news";

/// A single article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub summary: String,
    pub url: String,
    pub image: String,
    #[serde(default)]
    pub video: Option<String>,
    pub language: String,
    pub publish_date: String,
    pub source_country: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    /// The upstream API spells this field `catgory`.
    #[serde(rename = "catgory", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsResponse {
    pub available: u32,
    pub news: Vec<News>,
    pub number: u32,
    pub offset: u32,
}

/// Search filters. Unset fields fall back to the caller's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub country: Option<String>,
    pub language: Option<String>,
    pub text: Option<String>,
}

impl NewsQuery {
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Caller for the world-news search API.
#[derive(Debug)]
pub struct NewsApiCaller {
    service: ApiService,
    api_key: String,
    default_language: String,
    default_text: String,
}

impl ApiCaller for NewsApiCaller {
    const BASE_URL: &'static str = "https://api.worldnewsapi.com/";
}

impl NewsApiCaller {
    pub const DEFAULT_LANGUAGE: &'static str = "pt";

    pub fn new(service: ApiService, api_key: impl Into<String>) -> Self {
        Self {
            service,
            api_key: api_key.into(),
            default_language: Self::DEFAULT_LANGUAGE.to_string(),
            default_text: String::new(),
        }
    }

    /// Builder preloaded with this caller's host.
    pub fn service_builder() -> ApiServiceBuilder {
        ApiService::for_caller::<Self>()
    }

    /// Build from configuration, honoring its base URL override and timeout.
    /// The API key is required.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ConfigError::InvalidEnv {
                var: ENV_API_KEY.to_string(),
                value: String::new(),
            })?;
        let mut builder = Self::service_builder().timeout(config.timeout);
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url.clone());
        }
        let service = builder.build()?;
        Ok(Self::new(service, api_key))
    }

    pub fn service(&self) -> &ApiService {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut ApiService {
        &mut self.service
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Applies to later searches that do not name a language.
    pub fn set_default_language(&mut self, language: impl Into<String>) {
        self.default_language = language.into();
    }

    pub fn default_text(&self) -> &str {
        &self.default_text
    }

    /// Applies to later searches that do not name a text filter.
    pub fn set_default_text(&mut self, text: impl Into<String>) {
        self.default_text = text.into();
    }

    /// Query parameters sent for `query`.
    pub fn search_params(&self, query: &NewsQuery) -> Vec<(String, String)> {
        vec![
            ("country".to_string(), query.country.clone().unwrap_or_default()),
            ("api-key".to_string(), self.api_key.clone()),
            (
                "language".to_string(),
                query
                    .language
                    .clone()
                    .unwrap_or_else(|| self.default_language.clone()),
            ),
            (
                "text".to_string(),
                query.text.clone().unwrap_or_else(|| self.default_text.clone()),
            ),
        ]
    }

    pub async fn search_news(&self, query: &NewsQuery) -> Outcome<NewsResponse> {
        debug!(country = ?query.country, "searching news");
        let request =
            HttpRequest::new(HttpMethod::Get, SEARCH_NEWS).with_query(self.search_params(query));
        self.service.execute(request).await
    }
}

/// Read access to news for consumers that should not see the caller.
#[derive(Debug)]
pub struct NewsRepository {
    caller: NewsApiCaller,
}

impl NewsRepository {
    pub fn new(caller: NewsApiCaller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &NewsApiCaller {
        &self.caller
    }

    /// Search by country, optionally in a specific language.
    pub async fn get_news(
        &self,
        country: Option<&str>,
        language: Option<&str>,
    ) -> Outcome<NewsResponse> {
        let query = NewsQuery {
            country: country.map(str::to_string),
            language: language.map(str::to_string),
            text: None,
        };
        self.caller.search_news(&query).await
    }
}
