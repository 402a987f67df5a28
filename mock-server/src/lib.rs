use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Status returned when the bearer token is missing or stale.
pub const TOKEN_EXPIRED: u16 = 498;

/// Token accepted until the first refresh.
pub const DEFAULT_TOKEN: &str = "dev-token";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub summary: String,
    pub url: String,
    pub image: String,
    pub video: Option<String>,
    pub language: String,
    pub publish_date: String,
    pub source_country: String,
    pub author: Option<String>,
    pub authors: Option<Vec<String>>,
    #[serde(rename = "catgory")]
    pub category: Option<String>,
    pub sentiment: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub available: usize,
    pub news: Vec<Article>,
    pub number: usize,
    pub offset: usize,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(rename = "api-key")]
    pub api_key: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub text: Option<String>,
    pub offset: Option<usize>,
    pub number: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bookmark {
    pub news_id: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBookmark {
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

/// Server state shared by all handlers.
pub struct AppState {
    articles: Vec<Article>,
    token: RwLock<String>,
    bookmarks: RwLock<BTreeMap<i64, Bookmark>>,
    refreshes: AtomicUsize,
}

impl AppState {
    pub fn new(articles: Vec<Article>, token: impl Into<String>) -> Self {
        Self {
            articles,
            token: RwLock::new(token.into()),
            bookmarks: RwLock::new(BTreeMap::new()),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// State seeded with `sample_articles()` and `DEFAULT_TOKEN`.
    pub fn seeded() -> Self {
        Self::new(sample_articles(), DEFAULT_TOKEN)
    }

    pub async fn token(&self) -> String {
        self.token.read().await.clone()
    }

    /// Number of token refreshes served so far.
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Invalidate the current token without telling any client.
    pub async fn rotate_token(&self) -> String {
        let token = Uuid::new_v4().to_string();
        *self.token.write().await = token.clone();
        token
    }
}

pub type Shared = Arc<AppState>;

pub fn app() -> Router {
    app_with_state(Arc::new(AppState::seeded()))
}

pub fn app_with_state(state: Shared) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search-news", get(search_news))
        .route("/news/{id}", get(get_news))
        .route("/token/refresh", post(refresh_token))
        .route("/bookmarks", get(list_bookmarks))
        .route(
            "/bookmarks/{id}",
            put(put_bookmark).patch(patch_bookmark).delete(delete_bookmark),
        )
        .route("/status/{code}", get(respond_with_status))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: Shared) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

pub fn sample_articles() -> Vec<Article> {
    let article = |id: i64, title: &str, language: &str, country: &str| Article {
        id,
        title: title.to_string(),
        text: format!("{title}. Full story."),
        summary: format!("{title}."),
        url: format!("https://news.example/{id}"),
        image: format!("https://news.example/{id}.png"),
        video: None,
        language: language.to_string(),
        publish_date: "2024-05-01 08:00:00".to_string(),
        source_country: country.to_string(),
        author: Some("Newsroom".to_string()),
        authors: Some(vec!["Newsroom".to_string()]),
        category: Some("technology".to_string()),
        sentiment: Some(0.1),
    };
    vec![
        article(1, "Rust adoption grows in embedded systems", "en", "us"),
        article(2, "Novo satélite lançado com sucesso", "pt", "br"),
        article(3, "Open source funding reaches new high", "en", "gb"),
    ]
}

async fn health() -> &'static str {
    "ok"
}

async fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.token.read().await);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected)
}

fn expired() -> (StatusCode, &'static str) {
    // 498 is outside the registered range but still a valid status code.
    let status = StatusCode::from_u16(TOKEN_EXPIRED).unwrap_or(StatusCode::UNAUTHORIZED);
    (status, "Token Expired/Invalid")
}

async fn search_news(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, &'static str)> {
    if !authorized(&state, &headers).await {
        debug!("rejecting search with stale token");
        return Err(expired());
    }
    if params.api_key.as_deref().unwrap_or_default().is_empty() {
        return Err((StatusCode::UNAUTHORIZED, "missing api-key"));
    }

    let wanted = |filter: &Option<String>, value: &str| {
        filter
            .as_deref()
            .filter(|f| !f.is_empty())
            .map_or(true, |f| f.eq_ignore_ascii_case(value))
    };
    let text = params.text.as_deref().unwrap_or_default().to_lowercase();
    let matches: Vec<&Article> = state
        .articles
        .iter()
        .filter(|a| wanted(&params.country, &a.source_country))
        .filter(|a| wanted(&params.language, &a.language))
        .filter(|a| {
            text.is_empty()
                || a.title.to_lowercase().contains(&text)
                || a.text.to_lowercase().contains(&text)
        })
        .collect();

    let offset = params.offset.unwrap_or(0);
    let page: Vec<Article> = matches
        .iter()
        .skip(offset)
        .take(params.number.unwrap_or(10))
        .map(|a| (*a).clone())
        .collect();

    Ok(Json(SearchResponse {
        available: matches.len(),
        number: page.len(),
        news: page,
        offset,
    }))
}

async fn get_news(
    State(state): State<Shared>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, StatusCode> {
    state
        .articles
        .iter()
        .find(|a| a.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn refresh_token(State(state): State<Shared>) -> Json<TokenResponse> {
    let token = state.rotate_token().await;
    let count = state.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
    info!(count, "token refreshed");
    Json(TokenResponse { token })
}

async fn list_bookmarks(State(state): State<Shared>) -> Json<Vec<Bookmark>> {
    let bookmarks = state.bookmarks.read().await;
    Json(bookmarks.values().cloned().collect())
}

async fn put_bookmark(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(input): Json<Bookmark>,
) -> Result<Json<Bookmark>, StatusCode> {
    if input.news_id != id {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    state.bookmarks.write().await.insert(id, input.clone());
    Ok(Json(input))
}

async fn patch_bookmark(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateBookmark>,
) -> Result<Json<Bookmark>, StatusCode> {
    let mut bookmarks = state.bookmarks.write().await;
    let bookmark = bookmarks.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(note) = input.note {
        bookmark.note = Some(note);
    }
    Ok(Json(bookmark.clone()))
}

async fn delete_bookmark(State(state): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    match state.bookmarks.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn respond_with_status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    let body = if status.is_server_error() {
        "internal error".to_string()
    } else {
        format!("status {code}")
    };
    (status, body)
}
