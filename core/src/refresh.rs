//! Serialized token refresh.
//!
//! # Design
//! Every caller that receives the expiry status comes through
//! `RefreshGate::refresh`. The gate state lives inside a `tokio::sync::Mutex`,
//! so two refreshes never run at the same time. Waiters are not ordered.
//!
//! Under `RefreshPolicy::Always` a waiter that acquires the lock after
//! another refresh finished refreshes again. `RefreshPolicy::Coalesce` skips
//! the refresh when the token generation moved since the waiter's request was
//! sent, which removes those back-to-back duplicates.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::error::RefreshError;

/// Obtains a new auth token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Return `Some(token)` to replace the current token, `None` to keep it.
    async fn refresh(&self, current: Option<String>) -> Result<Option<String>, RefreshError>;
}

/// Refresher that never changes the token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRefresher;

#[async_trait]
impl TokenRefresher for NoopRefresher {
    async fn refresh(&self, _current: Option<String>) -> Result<Option<String>, RefreshError> {
        Ok(None)
    }
}

/// How waiters behave once they acquire the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Refresh unconditionally.
    #[default]
    Always,
    /// Skip if another caller already replaced the token.
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Idle,
    Refreshing,
}

/// Auth token plus a counter bumped on every replacement.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenState {
    pub(crate) token: Option<String>,
    pub(crate) generation: u64,
}

/// Mutual exclusion around `TokenRefresher::refresh`.
pub struct RefreshGate {
    state: Mutex<GateState>,
    refresher: Arc<dyn TokenRefresher>,
    policy: RefreshPolicy,
}

impl RefreshGate {
    pub fn new(refresher: Arc<dyn TokenRefresher>, policy: RefreshPolicy) -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
            refresher,
            policy,
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Refresh the token held in `tokens`. `observed` is the generation the
    /// failed request was sent with. Refresh errors are logged, not returned.
    pub(crate) async fn refresh(&self, tokens: &RwLock<TokenState>, observed: u64) {
        let mut state = self.state.lock().await;
        if *state == GateState::Refreshing {
            return;
        }
        if self.policy == RefreshPolicy::Coalesce {
            let current = tokens.read().await.generation;
            if current != observed {
                debug!(observed, current, "token already refreshed, skipping");
                return;
            }
        }

        *state = GateState::Refreshing;
        // Back to `Idle` on completion or when the caller drops this future.
        let _refreshing = Refreshing(state);
        let current = tokens.read().await.token.clone();
        match self.refresher.refresh(current).await {
            Ok(Some(token)) => {
                let mut tokens = tokens.write().await;
                tokens.token = Some(token);
                tokens.generation += 1;
                info!(generation = tokens.generation, "auth token refreshed");
            }
            Ok(None) => debug!("refresh kept the current token"),
            Err(err) => warn!(error = %err, "token refresh failed"),
        }
    }
}

/// Holds the gate while a refresh runs and resets it to `Idle` on drop.
struct Refreshing<'a>(MutexGuard<'a, GateState>);

impl Drop for Refreshing<'_> {
    fn drop(&mut self) {
        *self.0 = GateState::Idle;
    }
}

impl std::fmt::Debug for RefreshGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshGate")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
