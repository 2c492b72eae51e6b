//! Error types for the client.
//!
//! # Design
//! Only two things can go wrong from a caller's point of view. The exchange
//! itself can fail (`ConnectionError`, with the transport's reason and, for
//! asynchronous exchanges, the correlation id), or the exchange can succeed
//! with a status the configured policy treats as a failure (`Error::Status`).
//! JSON encode and decode failures never surface here; the pipeline falls
//! back to the untransformed value instead.

use crate::http::{RequestId, Response};

/// A transport-level failure: refused connection, timeout, TLS, DNS, or a
/// failed send in the middle of a streaming upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ConnectionError {
    /// Set only for failures of an asynchronous exchange.
    pub id: Option<RequestId>,
    pub reason: String,
}

impl ConnectionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            id: None,
            reason: reason.into(),
        }
    }

    pub fn with_id(id: RequestId, reason: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            reason: reason.into(),
        }
    }
}

/// Errors returned by the strict call variants, and the connection failures
/// returned by every call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error(
        "{} {} returned status {}",
        .0.request.method,
        .0.request.url,
        .0.status_code
    )]
    Status(Box<Response>),
}

impl Error {
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::Connection(err) => Some(&err.reason),
            Error::Status(_) => None,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Connection(_) => None,
            Error::Status(response) => Some(response),
        }
    }
}
