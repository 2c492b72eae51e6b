//! Response construction and the response-handling policies.
//!
//! # Design
//! The body is decoded as JSON only when the originating request asked for
//! it with an `Accepts` header mentioning `json`. A body that fails to parse
//! stays raw; the caller can still inspect it. The policy is applied last
//! and only decides how a finished response is wrapped; transport failures
//! are reported separately as `Error::Connection` under every policy.

use std::sync::Arc;

use bytes::Bytes;

use crate::config::ResponseHandling;
use crate::event::AsyncResponse;
use crate::headers::Headers;
use crate::hooks::Hooks;
use crate::http::{Request, Response, ResponseBody};

pub const ACCEPTS: &str = "Accepts";

/// What a successful transport exchange produced.
#[derive(Debug, Clone)]
pub enum Reply {
    Response(Response),
    Async(AsyncResponse),
}

impl Reply {
    pub fn into_response(self) -> Option<Response> {
        match self {
            Reply::Response(response) => Some(response),
            Reply::Async(_) => None,
        }
    }

    pub fn into_async(self) -> Option<AsyncResponse> {
        match self {
            Reply::Response(_) => None,
            Reply::Async(handle) => Some(handle),
        }
    }
}

/// A reply wrapped according to the configured `ResponseHandling`.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// `ConnError`, or `StatusError` below 400.
    Ok(Reply),
    /// `StatusError` at 400 and above.
    StatusError(Response),
    /// `NoTuple`.
    Bare(Reply),
}

impl Outcome {
    /// Wrap `reply` according to `handling`.
    pub fn wrap(reply: Reply, handling: ResponseHandling) -> Outcome {
        match (handling, reply) {
            (ResponseHandling::NoTuple, reply) => Outcome::Bare(reply),
            (ResponseHandling::StatusError, Reply::Response(response))
                if response.status_code >= 400 =>
            {
                Outcome::StatusError(response)
            }
            (_, reply) => Outcome::Ok(reply),
        }
    }

    pub fn is_ok(&self) -> bool {
        !matches!(self, Outcome::StatusError(_))
    }

    /// The reply regardless of wrapping.
    pub fn into_reply(self) -> Reply {
        match self {
            Outcome::Ok(reply) | Outcome::Bare(reply) => reply,
            Outcome::StatusError(response) => Reply::Response(response),
        }
    }
}

impl Response {
    /// Build a response from raw transport output.
    pub fn build(
        status_code: u16,
        headers: Headers,
        body: Bytes,
        request: Arc<Request>,
        hooks: &dyn Hooks,
    ) -> Response {
        let status_code = hooks.process_response_status_code(status_code);
        let headers = hooks.process_response_headers(headers);
        let body = hooks.process_response_body(body);
        let body = decode_body(body, &request);
        hooks.process_response(Response {
            status_code,
            headers,
            body,
            request,
        })
    }
}

/// Decode `body` as JSON if the request's `Accepts` header mentions json.
pub fn decode_body(body: Bytes, request: &Request) -> ResponseBody {
    if !request.headers.get_or(ACCEPTS, "").contains("json") {
        return ResponseBody::Raw(body);
    }
    match serde_json::from_slice(&body) {
        Ok(value) => ResponseBody::Decoded(value),
        Err(_) => ResponseBody::Raw(body),
    }
}
