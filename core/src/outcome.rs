//! The tri-state result of every network operation.

use crate::http::{find_header, Headers, HttpResponse};

/// Result of one API call.
///
/// `Loading` never carries data; consumers that render state start from it
/// and replace it with one of the other two variants when the call returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Loading,
    Success(Response<T>),
    Failure(Failure),
}

/// Successful response with its decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    pub status: u16,
    pub body: T,
    pub headers: Headers,
}

impl<T> Response<T> {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Failed call. `status` is `None` when no response arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failure {
    pub status: Option<u16>,
    pub message: Option<String>,
    pub headers: Option<Headers>,
}

impl Failure {
    /// Failure that never reached a server.
    pub fn local(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: Some(message.into()),
            headers: None,
        }
    }

    /// Failure attached to a server response.
    pub fn from_response(response: &HttpResponse, message: impl Into<String>) -> Self {
        Self {
            status: Some(response.status),
            message: Some(message.into()),
            headers: Some(response.headers.clone()),
        }
    }
}

impl<T> Outcome<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Outcome::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn success(&self) -> Option<&Response<T>> {
        match self {
            Outcome::Success(response) => Some(response),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Transform the body of a successful outcome.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Loading => Outcome::Loading,
            Outcome::Success(response) => Outcome::Success(Response {
                status: response.status,
                body: f(response.body),
                headers: response.headers,
            }),
            Outcome::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Convert a settled outcome into a `Result`. Returns `None` while loading.
    pub fn into_result(self) -> Option<Result<Response<T>, Failure>> {
        match self {
            Outcome::Loading => None,
            Outcome::Success(response) => Some(Ok(response)),
            Outcome::Failure(failure) => Some(Err(failure)),
        }
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Outcome::Loading
    }
}
