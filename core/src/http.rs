//! Request and response values.
//!
//! # Design
//! These types describe one HTTP exchange as plain data. A `Request` is
//! built once by the pipeline in `crate::request`, handed to the transport
//! by reference and never mutated afterwards. A `Response` keeps an `Arc`
//! to the request that produced it so error messages can name the method
//! and URL.
//!
//! The loosely typed option bag of a classic HTTP client is spelled out as
//! `Options`: every recognized key is a named field, and anything the
//! transport understands but this layer does not lives in `passthrough`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::Sender;
use serde::Serialize;
use uuid::Uuid;

use crate::event::AsyncMessage;
use crate::headers::Headers;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation id shared by every notification and event of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type ChunkIter = Box<dyn Iterator<Item = Bytes> + Send>;

/// A lazy sequence of body chunks for a streaming upload.
///
/// The iterator can be taken exactly once. Clones share the same iterator,
/// so a `Request` stays cheap to clone and share.
#[derive(Clone)]
pub struct ChunkStream(Arc<Mutex<Option<ChunkIter>>>);

impl ChunkStream {
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self(Arc::new(Mutex::new(Some(Box::new(chunks.into_iter())))))
    }

    /// Take the chunk iterator. Returns `None` once it has been taken.
    pub fn take(&self) -> Option<ChunkIter> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChunkStream(..)")
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Bytes sent as-is.
    Raw(Bytes),
    /// A structured value, JSON-encoded by the request pipeline.
    Json(serde_json::Value),
    /// Form fields the transport encodes as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// A file the transport uploads from disk.
    File(PathBuf),
    /// Chunks sent one at a time after the request line and headers.
    Stream(ChunkStream),
}

impl RequestBody {
    pub fn is_structured(&self) -> bool {
        matches!(self, RequestBody::Json(_))
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        RequestBody::Raw(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Raw(Bytes::from(text))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Raw(Bytes::from(bytes))
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Raw(bytes)
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

/// Query parameters appended to the request URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Flatten any serializable struct or map into query pairs.
    pub fn from_serialize<T: Serialize + ?Sized>(
        value: &T,
    ) -> Result<Self, serde_urlencoded::ser::Error> {
        let encoded = serde_urlencoded::to_string(value)?;
        Ok(Self(
            url::form_urlencoded::parse(encoded.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect(),
        ))
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Encode as an `application/x-www-form-urlencoded` query string.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Params {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> From<HashMap<K, V>> for Params {
    fn from(map: HashMap<K, V>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for Params {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// How the transport delivers notifications of an asynchronous exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsyncMode {
    /// Notifications are pushed as they arrive.
    #[default]
    Continuous,
    /// One notification per `Client::stream_next` call.
    Once,
}

/// Proxy the transport should tunnel through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proxy {
    Url(String),
    Socks5 { host: String, port: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Connect timeout, passed to the transport.
    pub timeout: Option<Duration>,
    /// Receive timeout, passed to the transport.
    pub recv_timeout: Option<Duration>,
    /// Destination for asynchronous delivery. Setting it makes the call async.
    pub stream_to: Option<Sender<AsyncMessage>>,
    pub async_mode: AsyncMode,
    pub proxy: Option<Proxy>,
    pub proxy_auth: Option<ProxyAuth>,
    /// TLS options, opaque to this layer.
    pub ssl: Vec<(String, String)>,
    pub follow_redirect: Option<bool>,
    pub max_redirect: Option<u32>,
    pub params: Option<Params>,
    /// Transport-specific keys forwarded untouched.
    pub passthrough: BTreeMap<String, serde_json::Value>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    pub fn stream_to(mut self, destination: Sender<AsyncMessage>) -> Self {
        self.stream_to = Some(destination);
        self
    }

    /// Switch asynchronous delivery to one notification per pull.
    pub fn async_once(mut self) -> Self {
        self.async_mode = AsyncMode::Once;
        self
    }

    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn proxy_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.proxy_auth = Some(ProxyAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn ssl(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ssl.push((key.into(), value.into()));
        self
    }

    pub fn follow_redirect(mut self, follow: bool) -> Self {
        self.follow_redirect = Some(follow);
        self
    }

    pub fn max_redirect(mut self, max: u32) -> Self {
        self.max_redirect = Some(max);
        self
    }

    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn passthrough(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.passthrough.insert(key.into(), value);
        self
    }
}

/// A fully resolved request, ready for the transport.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: RequestBody,
    pub options: Options,
}

/// Body of a completed response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Bytes exactly as the transport returned them.
    Raw(Bytes),
    /// The body parsed as JSON.
    Decoded(serde_json::Value),
}

impl ResponseBody {
    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Raw(bytes) => Some(bytes),
            ResponseBody::Decoded(_) => None,
        }
    }

    pub fn as_decoded(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Raw(_) => None,
            ResponseBody::Decoded(value) => Some(value),
        }
    }
}

/// A completed response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: u16,
    pub headers: Headers,
    pub body: ResponseBody,
    pub request: Arc<Request>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_displays_uppercase_verb() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::Options.as_str(), "OPTIONS");
    }

    #[test]
    fn chunk_stream_is_taken_once() {
        let stream = ChunkStream::new(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
        let shared = stream.clone();
        let chunks: Vec<Bytes> = stream.take().unwrap().collect();
        assert_eq!(chunks.len(), 2);
        assert!(shared.take().is_none());
    }

    #[test]
    fn params_encode_as_form_query() {
        let params = Params::from(vec![("q", "hello world"), ("tag", "a&b")]);
        assert_eq!(params.to_query_string(), "q=hello+world&tag=a%26b");
    }

    #[test]
    fn params_from_serializable_struct() {
        #[derive(Serialize)]
        struct Search<'a> {
            q: &'a str,
            page: u32,
        }
        let params = Params::from_serialize(&Search { q: "rust", page: 2 }).unwrap();
        assert_eq!(params.to_query_string(), "q=rust&page=2");
    }

    #[test]
    fn options_builder_sets_fields() {
        let options = Options::new()
            .timeout(Duration::from_secs(8))
            .recv_timeout(Duration::from_secs(5))
            .follow_redirect(true)
            .max_redirect(3)
            .async_once()
            .proxy(Proxy::Socks5 {
                host: "localhost".to_string(),
                port: 1080,
            })
            .proxy_auth("user", "secret")
            .passthrough("pool", serde_json::json!("default"));
        assert_eq!(options.timeout, Some(Duration::from_secs(8)));
        assert_eq!(options.max_redirect, Some(3));
        assert_eq!(options.async_mode, AsyncMode::Once);
        assert_eq!(options.proxy_auth.unwrap().username, "user");
        assert_eq!(options.passthrough["pool"], "default");
    }

    #[test]
    fn response_body_accessors() {
        let raw = ResponseBody::Raw(Bytes::from_static(b"plain"));
        assert_eq!(raw.as_raw().unwrap().as_ref(), b"plain");
        assert!(raw.as_decoded().is_none());
        let decoded = ResponseBody::Decoded(serde_json::json!({"a": 1}));
        assert_eq!(decoded.as_decoded().unwrap()["a"], 1);
    }
}
