//! Trie-routed HTTP request dispatch with ordered middleware chains.
//!
//! A [`Service`] matches requests against per-method path tries
//! (`/users/:id` style patterns, literals beating captures), runs them
//! through pre- and post-handler chains with a cooperative [`Flow`] halt
//! signal, and threads a per-request [`Context`] through every handler.
//! Services mount into a [`Registry`] by base URI; `http::server` serves
//! a registry over tokio + hyper.

pub mod context;
pub mod handler;
pub mod http;
pub mod params;
pub mod registry;
pub mod routing;
pub mod service;

pub use context::{Context, ContextExt, NullContext, RequestContext, ROUTE_USAGE_KEY};
pub use handler::{compose, Flow, Handler, RequestHandler};
pub use http::form::FormValues;
pub use http::request::Request;
pub use http::response::ResponseWriter;
pub use params::{ParamUsage, Params, ParamsError};
pub use registry::{Registry, RegistryError};
pub use routing::RouteParams;
pub use service::Service;
