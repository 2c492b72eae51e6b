//! Events delivered to the destination of an asynchronous exchange.

use bytes::Bytes;

use crate::error::ConnectionError;
use crate::headers::Headers;
use crate::http::RequestId;

/// Handle returned to the caller of an asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncResponse {
    pub id: RequestId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncStatus {
    pub id: RequestId,
    pub code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncHeaders {
    pub id: RequestId,
    pub headers: Headers,
}

/// One body chunk. Chunks are never accumulated by this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncChunk {
    pub id: RequestId,
    pub chunk: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncRedirect {
    pub id: RequestId,
    pub to: String,
    pub headers: Headers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncEnd {
    pub id: RequestId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncEvent {
    Status(AsyncStatus),
    Headers(AsyncHeaders),
    Chunk(AsyncChunk),
    Redirect(AsyncRedirect),
    End(AsyncEnd),
}

impl AsyncEvent {
    pub fn id(&self) -> RequestId {
        match self {
            AsyncEvent::Status(event) => event.id,
            AsyncEvent::Headers(event) => event.id,
            AsyncEvent::Chunk(event) => event.id,
            AsyncEvent::Redirect(event) => event.id,
            AsyncEvent::End(event) => event.id,
        }
    }

    /// Whether no further event follows this one for the same id.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AsyncEvent::Redirect(_) | AsyncEvent::End(_))
    }
}

/// What a destination receives: an event, or the single terminal error.
pub type AsyncMessage = Result<AsyncEvent, ConnectionError>;
