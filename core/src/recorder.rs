//! Sink for failures worth reporting (crash reporting, telemetry).

use tracing::error;

use crate::error::RequestError;

/// Receives errors the classifier considers severe: server errors above the
/// expiry code, timeouts and unexpected failures.
pub trait FailureRecorder: Send + Sync {
    fn record(&self, error: &RequestError);
}

impl<F> FailureRecorder for F
where
    F: Fn(&RequestError) + Send + Sync,
{
    fn record(&self, error: &RequestError) {
        self(error)
    }
}

/// Default recorder: emits an `error` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecorder;

impl FailureRecorder for TracingRecorder {
    fn record(&self, err: &RequestError) {
        let status = err.response().map(|response| response.status);
        error!(?status, error = %err, "request failed");
    }
}
