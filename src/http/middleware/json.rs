//! JSON response writing from context values.

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;
use serde_json::Value;
use tracing::error;

use crate::context::{Context, ContextExt};
use crate::handler::Handler;

/// Build a post-chain handler that writes a JSON response from context
/// values: a status code (as [`StatusCode`] or bare `u16`) under
/// `status_key`, and a [`serde_json::Value`] body under `response_key`.
///
/// When no body value is present the handler does nothing, leaving room
/// for handlers that wrote raw bytes themselves. Encoding failures are
/// logged, never panicked.
pub fn json_response_writer(status_key: &'static str, response_key: &'static str) -> Handler {
    Handler::with_context(move |ctx, w, _r| {
        if let Some(status) = status_from(ctx, status_key) {
            w.set_status(status);
        }

        let value = match ctx.get_as::<Value>(response_key) {
            Some(value) => value,
            None => return,
        };
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Err(e) = serde_json::to_writer(&mut *w, value) {
            error!(error = %e, "failed to encode json response body");
        }
    })
}

fn status_from(ctx: &dyn Context, key: &str) -> Option<StatusCode> {
    if let Some(status) = ctx.get_as::<StatusCode>(key) {
        return Some(*status);
    }
    if let Some(code) = ctx.get_as::<u16>(key) {
        return StatusCode::from_u16(*code).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::http::request::Request;
    use crate::http::response::ResponseWriter;
    use hyper::Method;
    use serde_json::json;

    fn run(ctx: &mut RequestContext) -> ResponseWriter {
        let handler = json_response_writer("status", "response");
        let mut w = ResponseWriter::new();
        let mut r = Request::new(Method::GET, "/".parse().unwrap());
        handler.call(ctx, &mut w, &mut r);
        w
    }

    #[test]
    fn writes_the_context_value_as_json() {
        let mut ctx = RequestContext::new();
        ctx.insert("status", StatusCode::CREATED);
        ctx.insert("response", json!({"id": 7}));

        let w = run(&mut ctx);
        assert_eq!(w.status(), StatusCode::CREATED);
        assert_eq!(
            w.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        assert_eq!(w.body(), b"{\"id\":7}");
    }

    #[test]
    fn bare_u16_status_codes_are_accepted() {
        let mut ctx = RequestContext::new();
        ctx.insert("status", 404_u16);
        ctx.insert("response", json!({"error": "missing"}));

        let w = run(&mut ctx);
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn absent_response_value_writes_nothing() {
        let mut ctx = RequestContext::new();
        let w = run(&mut ctx);

        assert!(w.body().is_empty());
        assert!(w.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(w.status(), StatusCode::OK);
    }
}
