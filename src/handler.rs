//! Handler shapes and chain composition.
//!
//! # Responsibilities
//! - Normalize the accepted handler shapes into one canonical call form
//! - Carry the cooperative halt signal between handlers and chains
//! - Fold handler sequences into a single composite handler
//!
//! # Design Decisions
//! - The shape set is a closed union; anything else fails to construct,
//!   so shape errors surface at compile time rather than per request
//! - Handlers are `Fn + Send + Sync`: one registration serves any number
//!   of concurrent requests through a shared reference

use crate::context::{Context, NullContext};
use crate::http::request::Request;
use crate::http::response::ResponseWriter;

/// Continuation signal returned by flow-aware handlers.
///
/// `Halt` stops the remainder of the *current* chain only; the dispatch
/// service starts the post-chain with a fresh `Continue` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    Halt,
}

impl Flow {
    pub fn is_halt(self) -> bool {
        self == Flow::Halt
    }
}

/// Handler implemented as an object rather than a closure, typically a
/// struct carrying shared state. Counterpart of the plain closure shapes
/// for types.
pub trait RequestHandler: Send + Sync {
    fn handle(&self, w: &mut ResponseWriter, r: &mut Request);
}

type PlainFn = dyn Fn(&mut ResponseWriter, &mut Request) + Send + Sync;
type PlainFlowFn = dyn Fn(&mut ResponseWriter, &mut Request) -> Flow + Send + Sync;
type ContextFn = dyn Fn(&mut dyn Context, &mut ResponseWriter, &mut Request) + Send + Sync;
type ContextFlowFn =
    dyn Fn(&mut dyn Context, &mut ResponseWriter, &mut Request) -> Flow + Send + Sync;

enum Shape {
    Plain(Box<PlainFn>),
    PlainFlow(Box<PlainFlowFn>),
    WithContext(Box<ContextFn>),
    WithContextFlow(Box<ContextFlowFn>),
    Object(Box<dyn RequestHandler>),
}

/// A registered request handler in one of the five accepted shapes.
///
/// Every shape normalizes to the canonical form
/// `(context, response writer, request) -> Flow`; shapes without a `Flow`
/// return always continue, shapes without a context argument ignore it.
///
/// Anything outside the shape set does not construct:
///
/// ```compile_fail
/// // A zero-argument closure is not an accepted handler shape.
/// let h = waypost::Handler::plain(|| ());
/// ```
pub struct Handler {
    shape: Shape,
}

impl Handler {
    /// Shape 1: `(response, request)`, always continues.
    pub fn plain<F>(f: F) -> Handler
    where
        F: Fn(&mut ResponseWriter, &mut Request) + Send + Sync + 'static,
    {
        Handler { shape: Shape::Plain(Box::new(f)) }
    }

    /// Shape 2: `(response, request) -> Flow`.
    pub fn plain_flow<F>(f: F) -> Handler
    where
        F: Fn(&mut ResponseWriter, &mut Request) -> Flow + Send + Sync + 'static,
    {
        Handler { shape: Shape::PlainFlow(Box::new(f)) }
    }

    /// Shape 3: `(context, response, request)`, always continues.
    pub fn with_context<F>(f: F) -> Handler
    where
        F: Fn(&mut dyn Context, &mut ResponseWriter, &mut Request) + Send + Sync + 'static,
    {
        Handler { shape: Shape::WithContext(Box::new(f)) }
    }

    /// Shape 4: the canonical form, `(context, response, request) -> Flow`.
    pub fn with_context_flow<F>(f: F) -> Handler
    where
        F: Fn(&mut dyn Context, &mut ResponseWriter, &mut Request) -> Flow + Send + Sync + 'static,
    {
        Handler { shape: Shape::WithContextFlow(Box::new(f)) }
    }

    /// Shape 5: an object implementing [`RequestHandler`], always continues.
    pub fn object<H>(h: H) -> Handler
    where
        H: RequestHandler + 'static,
    {
        Handler { shape: Shape::Object(Box::new(h)) }
    }

    /// Invoke the handler in canonical form.
    pub fn call(&self, ctx: &mut dyn Context, w: &mut ResponseWriter, r: &mut Request) -> Flow {
        match &self.shape {
            Shape::Plain(f) => {
                f(w, r);
                Flow::Continue
            }
            Shape::PlainFlow(f) => f(w, r),
            Shape::WithContext(f) => {
                f(ctx, w, r);
                Flow::Continue
            }
            Shape::WithContextFlow(f) => f(ctx, w, r),
            Shape::Object(h) => {
                h.handle(w, r);
                Flow::Continue
            }
        }
    }

    /// Invoke the handler with a fresh inert context, for use outside a
    /// dispatch service.
    pub fn call_detached(&self, w: &mut ResponseWriter, r: &mut Request) -> Flow {
        let mut ctx = NullContext;
        self.call(&mut ctx, w, r)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match &self.shape {
            Shape::Plain(_) => "plain",
            Shape::PlainFlow(_) => "plain_flow",
            Shape::WithContext(_) => "with_context",
            Shape::WithContextFlow(_) => "with_context_flow",
            Shape::Object(_) => "object",
        };
        f.debug_struct("Handler").field("shape", &shape).finish()
    }
}

/// Fold a sequence of handlers into one composite handler.
///
/// The composite runs each element in order; a `Halt` from any element
/// stops the rest and the composite itself returns `Halt`, so halts
/// propagate through nested compositions. An empty sequence continues.
pub fn compose<I>(handlers: I) -> Handler
where
    I: IntoIterator<Item = Handler>,
{
    let handlers: Vec<Handler> = handlers.into_iter().collect();
    Handler::with_context_flow(move |ctx, w, r| {
        for handler in &handlers {
            if handler.call(ctx, w, r).is_halt() {
                return Flow::Halt;
            }
        }
        Flow::Continue
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextExt, RequestContext};
    use hyper::Method;

    fn request() -> Request {
        Request::new(Method::GET, "/".parse().unwrap())
    }

    fn push_order(ctx: &mut dyn Context, tag: char) {
        let mut order = ctx.get_as::<String>("order").cloned().unwrap_or_default();
        order.push(tag);
        ctx.insert("order", order);
    }

    struct Echo(&'static str);

    impl RequestHandler for Echo {
        fn handle(&self, w: &mut ResponseWriter, _r: &mut Request) {
            w.send(self.0);
        }
    }

    #[test]
    fn plain_shape_runs_and_continues() {
        let handler = Handler::plain(|w, _r| w.send("hi"));
        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(handler.call(&mut ctx, &mut w, &mut r), Flow::Continue);
        assert_eq!(w.body(), b"hi");
    }

    #[test]
    fn plain_flow_shape_returns_its_flow() {
        let handler = Handler::plain_flow(|_w, _r| Flow::Halt);
        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(handler.call(&mut ctx, &mut w, &mut r), Flow::Halt);
    }

    #[test]
    fn context_shapes_see_the_context() {
        let write = Handler::with_context(|ctx, _w, _r| ctx.insert("seen", true));
        let read = Handler::with_context_flow(|ctx, _w, _r| {
            if ctx.get_as::<bool>("seen").copied().unwrap_or(false) {
                Flow::Halt
            } else {
                Flow::Continue
            }
        });

        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(write.call(&mut ctx, &mut w, &mut r), Flow::Continue);
        assert_eq!(read.call(&mut ctx, &mut w, &mut r), Flow::Halt);
    }

    #[test]
    fn object_shape_runs_through_the_trait() {
        let handler = Handler::object(Echo("from-object"));
        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(handler.call(&mut ctx, &mut w, &mut r), Flow::Continue);
        assert_eq!(w.body(), b"from-object");
    }

    #[test]
    fn detached_call_runs_without_a_service_context() {
        let handler = Handler::with_context(|ctx, w, _r| {
            // Writes vanish into the inert context; the response still lands.
            ctx.insert("ignored", 1_i64);
            w.send("ok");
        });
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(handler.call_detached(&mut w, &mut r), Flow::Continue);
        assert_eq!(w.body(), b"ok");
    }

    #[test]
    fn compose_runs_in_order() {
        let composite = compose([
            Handler::with_context(|ctx, _w, _r| push_order(ctx, 'a')),
            Handler::with_context(|ctx, _w, _r| push_order(ctx, 'b')),
            Handler::with_context(|ctx, _w, _r| push_order(ctx, 'c')),
        ]);

        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(composite.call(&mut ctx, &mut w, &mut r), Flow::Continue);
        assert_eq!(ctx.get_as::<String>("order").map(String::as_str), Some("abc"));
    }

    #[test]
    fn compose_halts_at_the_first_halt() {
        let composite = compose([
            Handler::with_context(|ctx, _w, _r| push_order(ctx, 'a')),
            Handler::plain_flow(|_w, _r| Flow::Halt),
            Handler::with_context(|ctx, _w, _r| push_order(ctx, 'b')),
        ]);

        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(composite.call(&mut ctx, &mut w, &mut r), Flow::Halt);
        assert_eq!(ctx.get_as::<String>("order").map(String::as_str), Some("a"));
    }

    #[test]
    fn nested_compose_propagates_the_halt() {
        let inner = compose([Handler::plain_flow(|_w, _r| Flow::Halt)]);
        let outer = compose([
            inner,
            Handler::with_context(|ctx, _w, _r| push_order(ctx, 'x')),
        ]);

        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(outer.call(&mut ctx, &mut w, &mut r), Flow::Halt);
        assert_eq!(ctx.get_as::<String>("order"), None);
    }

    #[test]
    fn empty_compose_continues() {
        let composite = compose([]);
        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = request();

        assert_eq!(composite.call(&mut ctx, &mut w, &mut r), Flow::Continue);
    }
}
