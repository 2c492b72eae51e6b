//! The transport collaborator.
//!
//! # Design
//! This crate never opens a socket. A `Transport` implementation performs
//! the wire exchange and reports back in one of four shapes:
//!
//! - `Bodiless`: status and headers only (for example a `HEAD`).
//! - `Complete`: status, headers and a body handle read with `read_body`.
//! - `Async`: a correlation id and a channel of `Notification`s, returned
//!   when `TransportOptions::stream` is set. In `AsyncMode::Once` the
//!   transport pushes the first notification on its own and each further
//!   one after a `pull_next` for the same id.
//! - `Upload`: returned for `RequestBody::Stream`. The client then feeds
//!   chunks through `send_body` and collects the real reply with
//!   `start_response`, or calls `abort_upload` if it gives up first.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::Receiver;

use crate::error::ConnectionError;
use crate::headers::Headers;
use crate::http::{AsyncMode, Options, Proxy, ProxyAuth, Request, RequestId};

/// Low-level progress of an asynchronous exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Status(u16),
    Headers(Headers),
    Chunk(Bytes),
    Redirect { to: String, headers: Headers },
    Done,
    Error(String),
}

/// An in-flight asynchronous exchange.
pub struct AsyncHandle {
    pub id: RequestId,
    pub notifications: Receiver<Notification>,
}

impl fmt::Debug for AsyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

/// A response body not yet read.
pub struct BodyHandle(Box<dyn Read + Send>);

impl BodyHandle {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self(Box::new(reader))
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(std::io::Cursor::new(bytes.into()))
    }

    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.0
    }
}

impl fmt::Debug for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BodyHandle(..)")
    }
}

#[derive(Debug)]
pub enum TransportReply {
    Bodiless { status: u16, headers: Headers },
    Complete { status: u16, headers: Headers, body: BodyHandle },
    Async(AsyncHandle),
    Upload(RequestId),
}

/// Transport settings derived from the request `Options`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOptions {
    pub connect_timeout: Option<Duration>,
    pub recv_timeout: Option<Duration>,
    /// Set exactly when the caller asked for asynchronous delivery.
    pub stream: Option<AsyncMode>,
    pub proxy: Option<Proxy>,
    pub proxy_auth: Option<ProxyAuth>,
    pub ssl: Vec<(String, String)>,
    pub follow_redirect: Option<bool>,
    pub max_redirect: Option<u32>,
    pub passthrough: BTreeMap<String, serde_json::Value>,
}

impl From<&Options> for TransportOptions {
    fn from(options: &Options) -> Self {
        TransportOptions {
            connect_timeout: options.timeout,
            recv_timeout: options.recv_timeout,
            stream: options.stream_to.as_ref().map(|_| options.async_mode),
            proxy: options.proxy.clone(),
            proxy_auth: options.proxy_auth.clone(),
            ssl: options.ssl.clone(),
            follow_redirect: options.follow_redirect,
            max_redirect: options.max_redirect,
            passthrough: options.passthrough.clone(),
        }
    }
}

pub trait Transport: Send + Sync {
    fn issue(
        &self,
        request: &Request,
        options: &TransportOptions,
    ) -> Result<TransportReply, ConnectionError>;

    fn read_body(&self, body: BodyHandle) -> Result<Bytes, ConnectionError> {
        let mut reader = body.into_reader();
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|err| ConnectionError::new(err.to_string()))?;
        Ok(Bytes::from(buf))
    }

    /// Ask for the next notification of an `AsyncMode::Once` exchange.
    fn pull_next(&self, id: &RequestId) -> Result<(), ConnectionError>;

    fn send_body(&self, _upload: &RequestId, _chunk: Bytes) -> Result<(), ConnectionError> {
        Err(ConnectionError::new("streaming upload unsupported"))
    }

    fn start_response(&self, _upload: RequestId) -> Result<TransportReply, ConnectionError> {
        Err(ConnectionError::new("streaming upload unsupported"))
    }

    /// The client gave up on `upload` and will not call `start_response`.
    fn abort_upload(&self, _upload: RequestId) {}
}
