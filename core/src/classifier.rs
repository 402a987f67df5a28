//! Turns responses and request errors into `Outcome` values.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::RequestError;
use crate::http::HttpResponse;
use crate::outcome::{Failure, Outcome, Response};
use crate::recorder::FailureRecorder;

/// Non-standard status the server uses for an invalid or expired token.
pub const TOKEN_EXPIRED: u16 = 498;

/// First status treated as a failure.
pub const BAD_REQUEST: u16 = 400;

/// Decode a response body. An empty body decodes as JSON `null`, so unit and
/// `Option` targets accept 204 responses.
pub fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<Response<T>, RequestError> {
    let parsed = if response.body.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_str(&response.body)
    };
    match parsed {
        Ok(body) => Ok(Response {
            status: response.status,
            body,
            headers: response.headers,
        }),
        Err(source) => Err(RequestError::Decode { response, source }),
    }
}

/// Classify a completed response: failure statuses become `Failure`, anything
/// else is decoded into `Success`.
pub fn classify_response<T: DeserializeOwned>(
    response: HttpResponse,
    recorder: &dyn FailureRecorder,
) -> Outcome<T> {
    if response.status >= BAD_REQUEST {
        return Outcome::Failure(classify_error(&RequestError::Status(response), recorder));
    }
    match decode(response) {
        Ok(decoded) => Outcome::Success(decoded),
        Err(err) => Outcome::Failure(classify_error(&err, recorder)),
    }
}

/// Build the `Failure` for an error, recording it when it is severe.
pub fn classify_error(err: &RequestError, recorder: &dyn FailureRecorder) -> Failure {
    match err {
        RequestError::Status(response) => {
            if response.status > TOKEN_EXPIRED {
                recorder.record(err);
            }
            debug!(status = response.status, "error response");
            Failure::from_response(response, response.body.clone())
        }
        RequestError::Timeout(detail) => {
            recorder.record(err);
            Failure::local(format!("request timed out: {detail}"))
        }
        RequestError::Decode { response, .. } => {
            recorder.record(err);
            Failure::from_response(response, err.to_string())
        }
        RequestError::Transport(_) | RequestError::Encode(_) => {
            recorder.record(err);
            Failure::local(err.to_string())
        }
    }
}
