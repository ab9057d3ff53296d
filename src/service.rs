//! Dispatch service: chains, route lookup, and the request lifecycle.
//!
//! # Responsibilities
//! - Own per-method route tries, the pre/post chains, and service settings
//! - Run each request through pre-chain, dispatch, post-chain, observer
//! - Bind usage text and path captures before the main handler runs
//!
//! # Design Decisions
//! - Registration takes `&mut self` during setup; serving takes `&self`,
//!   so a built service is immutable and freely shared across tasks
//! - A pre-chain halt skips dispatch but never the post-chain; the halt
//!   state resets when the post-chain starts
//! - Panics are observed and re-raised, never converted into responses

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use hyper::header::{self, HeaderValue};
use hyper::{Method, StatusCode};
use tracing::debug;

use crate::context::{Context, ContextExt, RequestContext, ROUTE_USAGE_KEY};
use crate::handler::Handler;
use crate::http::request::Request;
use crate::http::response::ResponseWriter;
use crate::routing::tree::Node;

type PostExecutionFn =
    dyn Fn(&mut dyn Context, &Request, Option<&(dyn Any + Send)>) + Send + Sync;

/// A dispatch service rooted at a base URI.
pub struct Service {
    base_uri: String,
    trim_slash: bool,
    trees: HashMap<Method, Node>,
    pre: Vec<Handler>,
    post: Vec<Handler>,
    not_found: Option<Handler>,
    post_execution: Option<Box<PostExecutionFn>>,
}

impl Service {
    /// Create a service claiming `base_uri`. The base is normalized to a
    /// leading slash and no trailing slash (`"foos"` becomes `"/foos"`).
    pub fn new(base_uri: &str) -> Self {
        let trimmed = base_uri.trim_matches('/');
        let base_uri = if trimmed.is_empty() {
            String::from("/")
        } else {
            format!("/{trimmed}")
        };
        Self {
            base_uri,
            trim_slash: true,
            trees: HashMap::new(),
            pre: Vec::new(),
            post: Vec::new(),
            not_found: None,
            post_execution: None,
        }
    }

    /// The normalized base URI this service claims.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Keep trailing slashes significant, for both incoming paths and
    /// patterns registered after this call.
    pub fn disable_trim_slash(&mut self) {
        self.trim_slash = false;
    }

    /// Register `handler` for `method` requests matching `base + pattern`.
    /// `usage` is published under [`ROUTE_USAGE_KEY`] when the route runs.
    /// Registering the same method and pattern again replaces the handler.
    pub fn route(&mut self, method: Method, pattern: &str, usage: &str, handler: Handler) {
        let full = self.join_pattern(pattern);
        debug!(method = %method, pattern = %full, "route registered");
        self.trees
            .entry(method)
            .or_default()
            .add_route(&full, usage, handler);
    }

    /// Append a handler to the pre-chain.
    pub fn add_pre(&mut self, handler: Handler) {
        self.pre.push(handler);
    }

    /// Append a handler to the post-chain.
    pub fn add_post(&mut self, handler: Handler) {
        self.post.push(handler);
    }

    /// Install a handler for unmatched requests, or `None` to restore the
    /// built-in plain-text 404.
    pub fn set_not_found(&mut self, handler: Option<Handler>) {
        self.not_found = handler;
    }

    /// Install the post-execution observer. It runs after the post-chain
    /// on every request exit: with the panic payload when a handler
    /// panicked (the panic is then re-raised), with `None` otherwise.
    pub fn set_post_execution<F>(&mut self, observer: F)
    where
        F: Fn(&mut dyn Context, &Request, Option<&(dyn Any + Send)>) + Send + Sync + 'static,
    {
        self.post_execution = Some(Box::new(observer));
    }

    /// Run the full lifecycle with a fresh map-backed context.
    pub fn serve(&self, w: &mut ResponseWriter, r: &mut Request) {
        let mut ctx = RequestContext::new();
        self.serve_in_context(&mut ctx, w, r);
    }

    /// Run the full lifecycle inside the caller's context.
    pub fn serve_in_context(
        &self,
        ctx: &mut dyn Context,
        w: &mut ResponseWriter,
        r: &mut Request,
    ) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_lifecycle(&mut *ctx, w, r);
        }));
        match outcome {
            Ok(()) => {
                if let Some(observer) = &self.post_execution {
                    observer(ctx, r, None);
                }
            }
            Err(payload) => {
                if let Some(observer) = &self.post_execution {
                    observer(ctx, r, Some(payload.as_ref()));
                }
                panic::resume_unwind(payload);
            }
        }
    }

    fn run_lifecycle(&self, ctx: &mut dyn Context, w: &mut ResponseWriter, r: &mut Request) {
        // 1. Pre-chain. A halt skips dispatch but never the post-chain.
        let mut halted = false;
        for handler in &self.pre {
            if handler.call(ctx, w, r).is_halt() {
                halted = true;
                break;
            }
        }

        // 2. Route dispatch.
        if !halted {
            self.dispatch(ctx, w, r);
        }

        // 3. Post-chain, always from the start with a fresh halt state.
        for handler in &self.post {
            if handler.call(ctx, w, r).is_halt() {
                break;
            }
        }
    }

    fn dispatch(&self, ctx: &mut dyn Context, w: &mut ResponseWriter, r: &mut Request) {
        let matched = {
            let path = self.lookup_path(r.path());
            self.trees
                .get(r.method())
                .and_then(|tree| tree.get_value(path))
        };

        match matched {
            Some(m) => {
                debug!(method = %r.method(), path = %r.path(), "route matched");
                ctx.insert(ROUTE_USAGE_KEY, m.usage.to_owned());
                // Captures overwrite same-named query values.
                r.parse_form();
                for (name, value) in m.params.iter() {
                    r.form_mut().set(name, value);
                }
                m.handler.call(ctx, w, r);
                r.drain_body();
            }
            None => {
                debug!(method = %r.method(), path = %r.path(), "no route matched");
                match &self.not_found {
                    Some(handler) => {
                        handler.call(ctx, w, r);
                    }
                    None => default_not_found(w),
                }
            }
        }
    }

    /// Path used for trie lookup: with trimming on, one trailing slash
    /// comes off, so `/foo` and `/foo/` resolve identically.
    fn lookup_path<'a>(&self, path: &'a str) -> &'a str {
        if self.trim_slash {
            path.strip_suffix('/').unwrap_or(path)
        } else {
            path
        }
    }

    /// Join the base URI and a route pattern, applying pattern-side slash
    /// trimming when enabled.
    fn join_pattern(&self, pattern: &str) -> String {
        let mut full = if pattern.starts_with('/') {
            format!("{}{}", self.base_uri, pattern)
        } else {
            format!("{}/{}", self.base_uri, pattern)
        };
        if let Some(rest) = full.strip_prefix("//") {
            full = format!("/{rest}");
        }
        if self.trim_slash {
            full.truncate(full.trim_end_matches('/').len());
        }
        full
    }
}

/// The built-in no-match response, mirroring the standard plain-text 404.
pub(crate) fn default_not_found(w: &mut ResponseWriter) {
    w.set_status(StatusCode::NOT_FOUND);
    w.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    w.send("404 page not found\n");
}
