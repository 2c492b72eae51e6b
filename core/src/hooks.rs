//! Caller-overridable extension points.
//!
//! Every hook defaults to the identity function. A client overrides the
//! ones it cares about by implementing `Hooks` on its own type and passing
//! it to `ClientBuilder::hooks`.

use bytes::Bytes;

use crate::headers::Headers;
use crate::http::{Options, Params, RequestBody, Response};

pub trait Hooks: Send + Sync {
    fn process_request_options(&self, options: Options) -> Options {
        options
    }

    fn process_request_params(&self, params: Params) -> Params {
        params
    }

    /// Sees the URL after params, base URL and default scheme are applied.
    fn process_request_url(&self, url: String) -> String {
        url
    }

    /// Sees the merged headers, including the automatic JSON content type.
    fn process_request_headers(&self, headers: Headers) -> Headers {
        headers
    }

    /// Sees the body after JSON encoding.
    fn process_request_body(&self, body: RequestBody) -> RequestBody {
        body
    }

    fn process_response_status_code(&self, status_code: u16) -> u16 {
        status_code
    }

    fn process_response_headers(&self, headers: Headers) -> Headers {
        headers
    }

    /// Sees the raw body before any JSON decoding.
    fn process_response_body(&self, body: Bytes) -> Bytes {
        body
    }

    fn process_response_chunk(&self, chunk: Bytes) -> Bytes {
        chunk
    }

    /// Runs last, on the fully built response.
    fn process_response(&self, response: Response) -> Response {
        response
    }
}

/// Hooks that change nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl Hooks for DefaultHooks {}
