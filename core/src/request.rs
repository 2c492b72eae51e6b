//! Request construction pipeline.
//!
//! # Design
//! `Request::build` runs four fixed stages: attach query params, resolve the
//! final URL, resolve headers, encode the body. Each stage is a pure, total
//! function of its inputs, so none of them can fail. A malformed URL is
//! carried through untouched and surfaces later as a connection error from
//! the transport. A JSON body that cannot be encoded is left as a structured
//! value.

use crate::config::Config;
use crate::headers::{self, Headers};
use crate::hooks::Hooks;
use crate::http::{Method, Options, Params, Request, RequestBody};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

const KNOWN_SCHEMES: [&str; 3] = ["http://", "https://", "http+unix://"];

impl Request {
    /// Resolve caller input into a request ready for the transport.
    pub fn build(
        method: Method,
        url: &str,
        body: RequestBody,
        headers: impl Into<Headers>,
        options: Options,
        config: &Config,
        hooks: &dyn Hooks,
    ) -> Request {
        let mut options = hooks.process_request_options(options);
        let params = options
            .params
            .take()
            .map(|params| hooks.process_request_params(params));

        let url = attach_params(url, params.as_ref());
        let url = hooks.process_request_url(resolve_url(&url, config.base_url.as_deref()));
        let headers = hooks.process_request_headers(resolve_headers(
            headers::normalize(headers),
            &config.request_headers,
            &body,
        ));
        let body = hooks.process_request_body(encode_body(body, &headers));

        options.params = params;
        Request {
            method,
            url,
            headers,
            body,
            options,
        }
    }
}

/// Append `params` as a query string, joining with `?` or `&`.
pub fn attach_params(url: &str, params: Option<&Params>) -> String {
    match params {
        Some(params) if !params.is_empty() => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{url}{separator}{}", params.to_query_string())
        }
        _ => url.to_string(),
    }
}

/// Join `base_url` and `url`, then default the scheme to `http://`.
pub fn resolve_url(url: &str, base_url: Option<&str>) -> String {
    let joined = match base_url {
        Some(base) if !base.is_empty() => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        _ => url.to_string(),
    };
    if has_known_scheme(&joined) {
        joined
    } else {
        format!("http://{joined}")
    }
}

fn has_known_scheme(url: &str) -> bool {
    let prefix = url.chars().take(12).collect::<String>().to_lowercase();
    KNOWN_SCHEMES.iter().any(|scheme| prefix.starts_with(scheme))
}

/// Merge caller and configured headers; flag structured bodies as JSON.
///
/// Caller headers come first, so they win a `get` against configured ones.
/// The JSON content type is prepended and wins against both.
pub fn resolve_headers(caller: Headers, configured: &Headers, body: &RequestBody) -> Headers {
    let mut headers = caller;
    headers.extend(configured.clone());
    if body.is_structured() {
        headers.put(CONTENT_TYPE, JSON_CONTENT_TYPE);
    }
    headers
}

/// Encode a structured body when the content type asks for JSON.
pub fn encode_body(body: RequestBody, headers: &Headers) -> RequestBody {
    match body {
        RequestBody::Json(value) if headers.get_or(CONTENT_TYPE, "").contains("json") => {
            match serde_json::to_vec(&value) {
                Ok(encoded) => RequestBody::Raw(encoded.into()),
                Err(_) => RequestBody::Json(value),
            }
        }
        other => other,
    }
}
