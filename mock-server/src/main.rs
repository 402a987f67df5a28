use std::sync::Arc;

use mock_server::{sample_articles, AppState, DEFAULT_TOKEN};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let token = std::env::var("MOCK_NEWS_TOKEN").unwrap_or_else(|_| DEFAULT_TOKEN.to_string());
    let addr = format!("127.0.0.1:{port}");

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mock news API listening");
    mock_server::run_with_state(listener, Arc::new(AppState::new(sample_articles(), token))).await
}
