//! Request surface handed to handlers.
//!
//! # Responsibilities
//! - Expose method, URI, headers, and the collected byte body
//! - Own the mutable form store handlers and the typed decoder read from
//! - Decode the query string (and form-encoded bodies) on demand
//!
//! # Design Decisions
//! - The body is collected before dispatch; the engine core never blocks
//!   on transport reads
//! - `parse_form` is idempotent so the service and handlers may both call
//!   it without double-appending values
//! - Path captures are merged into the form store by the dispatch service,
//!   so handlers read path and query parameters uniformly

use std::net::SocketAddr;

use bytes::Bytes;
use hyper::{header, HeaderMap, Method, Uri};

use crate::http::form::FormValues;

/// An in-flight HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Bytes>,
    form: FormValues,
    form_parsed: bool,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Build a bare request, mainly for tests and detached handler calls.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: None,
            form: FormValues::new(),
            form_parsed: false,
            remote_addr: None,
        }
    }

    /// Build a request from transport parts with a collected body.
    pub fn from_transport(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        remote_addr: Option<SocketAddr>,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body: Some(body),
            form: FormValues::new(),
            form_parsed: false,
            remote_addr,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path portion of the URI, as received.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Peer address, when the request arrived over the transport adapter.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// The collected body, if still unread.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Take ownership of the body, leaving the request without one.
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// Release whatever body bytes remain. Called by the dispatch service
    /// after the main handler has run.
    pub(crate) fn drain_body(&mut self) {
        self.body = None;
    }

    /// Decoded form parameters. Empty until [`parse_form`](Self::parse_form)
    /// runs (the dispatch service runs it before the main handler).
    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormValues {
        &mut self.form
    }

    /// Populate the form store from the query string, and from the body
    /// for form-encoded POST/PUT/PATCH. Runs at most once; later calls
    /// are no-ops.
    pub fn parse_form(&mut self) {
        if self.form_parsed {
            return;
        }
        self.form_parsed = true;

        if let Some(query) = self.uri.query() {
            self.form.extend_from_urlencoded(query.as_bytes());
        }

        let form_method = matches!(self.method, Method::POST | Method::PUT | Method::PATCH);
        if form_method && self.has_urlencoded_body() {
            if let Some(body) = &self.body {
                let raw = body.clone();
                self.form.extend_from_urlencoded(&raw);
            }
        }
    }

    fn has_urlencoded_body(&self) -> bool {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false)
    }
}
