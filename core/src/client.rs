//! Request orchestration.
//!
//! # Design
//! `Client` ties the pipeline together: it builds a `Request`, derives the
//! transport options, hands both to the configured `Transport`, and turns
//! the reply into a `Response` or an asynchronous relay. The client holds
//! no mutable state; clones share the same configuration, transport and
//! hooks through an `Arc`.
//!
//! Every verb comes in two flavors. The plain one returns the reply wrapped
//! by the configured `ResponseHandling` and only fails on transport errors.
//! The `_strict` one unwraps the reply and additionally fails with
//! `Error::Status` when the policy flagged the response.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::{Config, ResponseHandling};
use crate::error::{ConnectionError, Error};
use crate::event::AsyncResponse;
use crate::headers::Headers;
use crate::hooks::{DefaultHooks, Hooks};
use crate::http::{Method, Options, Request, RequestBody, RequestId, Response};
use crate::relay;
use crate::response::{Outcome, Reply};
use crate::transport::{Transport, TransportOptions, TransportReply};

/// Reason reported when a `RequestBody::Stream` is sent a second time.
pub const STREAM_CONSUMED: &str = "stream body already consumed";

#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn Hooks>,
}

pub struct ClientBuilder {
    config: Config,
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn Hooks>,
}

impl ClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Add a header sent with every request.
    pub fn request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.request_headers.append(name, value);
        self
    }

    pub fn request_headers(mut self, headers: impl Into<Headers>) -> Self {
        self.config.request_headers.extend(headers.into());
        self
    }

    pub fn response_handling(mut self, handling: ResponseHandling) -> Self {
        self.config.response_handling = handling;
        self
    }

    pub fn hooks(mut self, hooks: impl Hooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(Inner {
                config: self.config,
                transport: self.transport,
                hooks: self.hooks,
            }),
        }
    }
}

impl Client {
    pub fn builder(transport: impl Transport + 'static) -> ClientBuilder {
        Self::builder_with_config(transport, Config::default())
    }

    /// Start from `Config::from_env`; builder calls override it.
    pub fn builder_from_env(transport: impl Transport + 'static) -> ClientBuilder {
        Self::builder_with_config(transport, Config::from_env())
    }

    pub fn builder_with_config(transport: impl Transport + 'static, config: Config) -> ClientBuilder {
        ClientBuilder {
            config,
            transport: Arc::new(transport),
            hooks: Arc::new(DefaultHooks),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Issue a request and wrap the reply per the configured policy.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        body: impl Into<RequestBody>,
        headers: impl Into<Headers>,
        options: Options,
    ) -> Result<Outcome, Error> {
        let Inner { config, hooks, .. } = &*self.inner;
        let request = Arc::new(Request::build(
            method,
            url,
            body.into(),
            headers,
            options,
            config,
            hooks.as_ref(),
        ));
        let transport_options = TransportOptions::from(&request.options);

        debug!(method = %request.method, url = %request.url, "sending request");
        let started = Instant::now();
        let result = self.exchange(&request, &transport_options);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(Reply::Response(response)) => {
                debug!(status = response.status_code, elapsed_ms, "request completed")
            }
            Ok(Reply::Async(handle)) => debug!(id = %handle.id, elapsed_ms, "async request started"),
            Err(err) => debug!(reason = %err.reason, elapsed_ms, "request failed"),
        }

        Ok(Outcome::wrap(result?, config.response_handling))
    }

    /// Like `request`, but unwraps the outcome.
    pub fn request_strict(
        &self,
        method: Method,
        url: &str,
        body: impl Into<RequestBody>,
        headers: impl Into<Headers>,
        options: Options,
    ) -> Result<Reply, Error> {
        match self.request(method, url, body, headers, options)? {
            Outcome::Ok(reply) | Outcome::Bare(reply) => Ok(reply),
            Outcome::StatusError(response) => Err(Error::Status(Box::new(response))),
        }
    }

    /// Ask the transport for the next event of an `async_once` exchange.
    pub fn stream_next(&self, handle: &AsyncResponse) -> Result<AsyncResponse, ConnectionError> {
        self.inner
            .transport
            .pull_next(&handle.id)
            .map(|()| *handle)
            .map_err(|err| ConnectionError {
                id: Some(handle.id),
                ..err
            })
    }

    fn exchange(
        &self,
        request: &Arc<Request>,
        options: &TransportOptions,
    ) -> Result<Reply, ConnectionError> {
        let transport = self.inner.transport.as_ref();
        let mut reply = transport.issue(request, options)?;
        if let TransportReply::Upload(upload) = reply {
            reply = upload_chunks(transport, request, upload)?;
        }

        match reply {
            TransportReply::Bodiless { status, headers } => {
                Ok(Reply::Response(self.response(status, headers, Bytes::new(), request)))
            }
            TransportReply::Complete {
                status,
                headers,
                body,
            } => {
                let body = transport.read_body(body)?;
                Ok(Reply::Response(self.response(status, headers, body, request)))
            }
            TransportReply::Async(handle) => {
                let id = handle.id;
                let Some(destination) = request.options.stream_to.clone() else {
                    warn!(%id, "transport replied async to a synchronous request");
                    return Err(ConnectionError::with_id(id, "async reply without stream_to"));
                };
                relay::spawn(handle, destination, Arc::clone(&self.inner.hooks))?;
                Ok(Reply::Async(AsyncResponse { id }))
            }
            TransportReply::Upload(upload) => {
                warn!(%upload, "transport requested a second upload");
                Err(ConnectionError::new("unexpected upload reply"))
            }
        }
    }

    fn response(&self, status: u16, headers: Headers, body: Bytes, request: &Arc<Request>) -> Response {
        Response::build(
            status,
            headers,
            body,
            Arc::clone(request),
            self.inner.hooks.as_ref(),
        )
    }
}

/// Feed every chunk of a streaming body, then collect the reply.
///
/// A failed send, or a stream whose chunks were already taken by an earlier
/// request, abandons the upload and tells the transport so.
fn upload_chunks(
    transport: &dyn Transport,
    request: &Request,
    upload: RequestId,
) -> Result<TransportReply, ConnectionError> {
    if let RequestBody::Stream(stream) = &request.body {
        let Some(chunks) = stream.take() else {
            warn!(%upload, "stream body already consumed");
            transport.abort_upload(upload);
            return Err(ConnectionError::new(STREAM_CONSUMED));
        };
        for chunk in chunks {
            if let Err(err) = transport.send_body(&upload, chunk) {
                debug!(%upload, reason = %err.reason, "aborting upload");
                transport.abort_upload(upload);
                return Err(err);
            }
        }
    }
    transport.start_response(upload)
}

macro_rules! bodiless_verbs {
    ($(($verb:ident, $strict:ident, $method:expr)),* $(,)?) => {
        impl Client {
            $(
                pub fn $verb(
                    &self,
                    url: &str,
                    headers: impl Into<Headers>,
                    options: Options,
                ) -> Result<Outcome, Error> {
                    self.request($method, url, RequestBody::Empty, headers, options)
                }

                pub fn $strict(
                    &self,
                    url: &str,
                    headers: impl Into<Headers>,
                    options: Options,
                ) -> Result<Reply, Error> {
                    self.request_strict($method, url, RequestBody::Empty, headers, options)
                }
            )*
        }
    };
}

macro_rules! body_verbs {
    ($(($verb:ident, $strict:ident, $method:expr)),* $(,)?) => {
        impl Client {
            $(
                pub fn $verb(
                    &self,
                    url: &str,
                    body: impl Into<RequestBody>,
                    headers: impl Into<Headers>,
                    options: Options,
                ) -> Result<Outcome, Error> {
                    self.request($method, url, body, headers, options)
                }

                pub fn $strict(
                    &self,
                    url: &str,
                    body: impl Into<RequestBody>,
                    headers: impl Into<Headers>,
                    options: Options,
                ) -> Result<Reply, Error> {
                    self.request_strict($method, url, body, headers, options)
                }
            )*
        }
    };
}

bodiless_verbs!(
    (get, get_strict, Method::Get),
    (head, head_strict, Method::Head),
    (delete, delete_strict, Method::Delete),
    (options, options_strict, Method::Options),
);

body_verbs!(
    (post, post_strict, Method::Post),
    (put, put_strict, Method::Put),
    (patch, patch_strict, Method::Patch),
);
