//! Configurable HTTP client layer over a pluggable transport.
//!
//! # Overview
//! Normalizes requests (URL composition, query params, headers, JSON
//! bodies), hands them to a `Transport` that performs the actual exchange,
//! and shapes what comes back: a `Response` with an optionally decoded JSON
//! body, wrapped per the configured `ResponseHandling`, or a stream of
//! `AsyncEvent`s relayed to a channel of the caller's choosing.
//!
//! # Design
//! - The crate never touches the network. `Transport` is the seam; tests
//!   drive it with in-memory and `ureq`-backed implementations.
//! - `Request`, `Response` and `AsyncEvent` are immutable values and can be
//!   shared freely across threads.
//! - Extension happens through the `Hooks` trait, whose methods all default
//!   to the identity.
//! - Each asynchronous exchange gets one relay thread that forwards events
//!   in the order the transport produced them.

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod headers;
pub mod hooks;
pub mod http;
pub mod relay;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{Config, ResponseHandling};
pub use error::{ConnectionError, Error};
pub use event::{
    AsyncChunk, AsyncEnd, AsyncEvent, AsyncHeaders, AsyncMessage, AsyncRedirect, AsyncResponse,
    AsyncStatus,
};
pub use headers::Headers;
pub use hooks::{DefaultHooks, Hooks};
pub use http::{
    AsyncMode, ChunkStream, Method, Options, Params, Proxy, ProxyAuth, Request, RequestBody,
    RequestId, Response, ResponseBody,
};
pub use response::{Outcome, Reply};
pub use transport::{
    AsyncHandle, BodyHandle, Notification, Transport, TransportOptions, TransportReply,
};
