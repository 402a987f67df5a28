//! Auth state shared by every caller of one API account.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::refresh::{NoopRefresher, RefreshGate, RefreshPolicy, TokenRefresher, TokenState};

/// Shared auth token and refresh gate.
///
/// One `Session` is created per account and handed to every `ApiService`
/// that talks on its behalf through an `Arc`. The token is read on each
/// dispatch and only written by `set_token` or a successful refresh.
#[derive(Debug)]
pub struct Session {
    tokens: RwLock<TokenState>,
    gate: RefreshGate,
}

impl Session {
    /// Session without a token whose refresh is a no-op.
    pub fn new() -> Self {
        Self::with_refresher(Arc::new(NoopRefresher), RefreshPolicy::default())
    }

    pub fn with_refresher(refresher: Arc<dyn TokenRefresher>, policy: RefreshPolicy) -> Self {
        Self {
            tokens: RwLock::new(TokenState::default()),
            gate: RefreshGate::new(refresher, policy),
        }
    }

    /// Wrap in an `Arc` for sharing between callers.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub async fn token(&self) -> Option<String> {
        self.tokens.read().await.token.clone()
    }

    /// Token and its generation, read atomically.
    pub async fn snapshot(&self) -> (Option<String>, u64) {
        let tokens = self.tokens.read().await;
        (tokens.token.clone(), tokens.generation)
    }

    /// Replace the token. Affects requests dispatched afterwards only.
    pub async fn set_token(&self, token: Option<String>) {
        let mut tokens = self.tokens.write().await;
        tokens.token = token;
        tokens.generation += 1;
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.gate.policy()
    }

    /// Run the refresh gate for a request sent with generation `observed`.
    pub async fn refresh_token(&self, observed: u64) {
        self.gate.refresh(&self.tokens, observed).await;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
