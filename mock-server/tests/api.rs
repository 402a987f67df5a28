use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{
    app, app_with_state, AppState, Bookmark, SearchResponse, TokenResponse, DEFAULT_TOKEN,
};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authed_get(uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- health ---

#[tokio::test]
async fn health_returns_ok() {
    let resp = app()
        .oneshot(Request::builder().uri("/health").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"ok");
}

// --- search ---

#[tokio::test]
async fn search_by_country_returns_matching_page() {
    let resp = app()
        .oneshot(authed_get("/search-news?country=us&api-key=k", DEFAULT_TOKEN))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: SearchResponse = body_json(resp).await;
    assert_eq!(page.available, 1);
    assert_eq!(page.number, 1);
    assert_eq!(page.offset, 0);
    assert_eq!(page.news[0].source_country, "us");
}

#[tokio::test]
async fn empty_filters_match_everything() {
    let resp = app()
        .oneshot(authed_get(
            "/search-news?country=&language=&text=&api-key=k",
            DEFAULT_TOKEN,
        ))
        .await
        .unwrap();

    let page: SearchResponse = body_json(resp).await;
    assert_eq!(page.available, 3);
}

#[tokio::test]
async fn search_filters_language_and_text() {
    let resp = app()
        .oneshot(authed_get(
            "/search-news?language=en&text=FUNDING&api-key=k",
            DEFAULT_TOKEN,
        ))
        .await
        .unwrap();

    let page: SearchResponse = body_json(resp).await;
    assert_eq!(page.available, 1);
    assert_eq!(page.news[0].id, 3);
}

#[tokio::test]
async fn search_pages_with_offset_and_number() {
    let resp = app()
        .oneshot(authed_get("/search-news?offset=1&number=1&api-key=k", DEFAULT_TOKEN))
        .await
        .unwrap();

    let page: SearchResponse = body_json(resp).await;
    assert_eq!(page.available, 3);
    assert_eq!(page.number, 1);
    assert_eq!(page.offset, 1);
    assert_eq!(page.news[0].id, 2);
}

#[tokio::test]
async fn search_with_stale_token_returns_498() {
    let resp = app()
        .oneshot(authed_get("/search-news?api-key=k", "stale"))
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 498);
}

#[tokio::test]
async fn search_without_token_returns_498() {
    let resp = app()
        .oneshot(Request::builder().uri("/search-news?api-key=k").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 498);
}

#[tokio::test]
async fn search_without_api_key_returns_401() {
    let resp = app()
        .oneshot(authed_get("/search-news?country=us", DEFAULT_TOKEN))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- token refresh ---

#[tokio::test]
async fn refresh_rotates_token() {
    use tower::Service;

    let state = Arc::new(AppState::seeded());
    let mut app = app_with_state(state.clone()).into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/token/refresh", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed: TokenResponse = body_json(resp).await;
    assert_eq!(state.refreshes(), 1);
    assert_eq!(state.token().await, refreshed.token);

    // Old token is rejected, new one accepted.
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get("/search-news?api-key=k", DEFAULT_TOKEN))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 498);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get("/search-news?api-key=k", &refreshed.token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- news by id ---

#[tokio::test]
async fn get_news_not_found() {
    let resp = app()
        .oneshot(Request::builder().uri("/news/999").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_news_bad_id_returns_400() {
    let resp = app()
        .oneshot(Request::builder().uri("/news/abc").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- status ---

#[tokio::test]
async fn status_route_returns_internal_error_body() {
    let resp = app()
        .oneshot(Request::builder().uri("/status/500").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body_bytes(resp).await[..], b"internal error");
}

// --- bookmarks lifecycle ---

#[tokio::test]
async fn bookmark_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // Step 1: put.
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", "/bookmarks/2", r#"{"news_id":2}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Step 2: patch the note.
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PATCH", "/bookmarks/2", r#"{"note":"read later"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bookmark: Bookmark = body_json(resp).await;
    assert_eq!(bookmark.note.as_deref(), Some("read later"));

    // Step 3: list.
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(Request::builder().uri("/bookmarks").body(String::new()).unwrap())
        .await
        .unwrap();
    let bookmarks: Vec<Bookmark> = body_json(resp).await;
    assert_eq!(bookmarks.len(), 1);

    // Step 4: delete, then delete again.
    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/bookmarks/2")
            .body(String::new())
            .unwrap()
    };
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(delete())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(delete())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_bookmark_with_mismatched_id_returns_422() {
    let resp = app()
        .oneshot(json_request("PUT", "/bookmarks/1", r#"{"news_id":2}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn patch_missing_bookmark_returns_404() {
    let resp = app()
        .oneshot(json_request("PATCH", "/bookmarks/9", r#"{"note":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
