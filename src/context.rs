//! Per-request key/value context.
//!
//! # Responsibilities
//! - Carry request-scoped values across pre-chain, route handler, and post-chain
//! - Offer an inert variant for callers that do not need storage
//! - Reserve the key under which the matched route's usage text is published
//!
//! # Design Decisions
//! - Object-safe core (`set`/`get` over boxed `Any`); typed access lives in
//!   an extension trait so it works through `&mut dyn Context`
//! - Values are `Send` so a request may be handed between worker threads

use std::any::Any;
use std::collections::HashMap;

/// Context key under which the dispatch service publishes the matched
/// route's usage text. The leading NUL byte keeps it out of the way of
/// ordinary application keys.
pub const ROUTE_USAGE_KEY: &str = "\u{0}usage";

/// String-keyed store of type-erased request-scoped values.
pub trait Context: Send {
    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Box<dyn Any + Send>);

    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<&(dyn Any + Send)>;
}

/// Typed conveniences over any [`Context`], including `dyn Context`.
pub trait ContextExt: Context {
    /// Store a typed value under `key`.
    fn insert<T: Any + Send>(&mut self, key: &str, value: T);

    /// Fetch the value under `key`, downcast to `T`. Returns `None` when
    /// the key is unset or holds a different type.
    fn get_as<T: Any>(&self, key: &str) -> Option<&T>;
}

impl<C: Context + ?Sized> ContextExt for C {
    fn insert<T: Any + Send>(&mut self, key: &str, value: T) {
        self.set(key, Box::new(value));
    }

    fn get_as<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key)?.downcast_ref::<T>()
    }
}

/// Context that stores nothing: writes are discarded and every read
/// answers `None`. Used when a handler is invoked detached from a service.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullContext;

impl Context for NullContext {
    fn set(&mut self, _key: &str, _value: Box<dyn Any + Send>) {}

    fn get(&self, _key: &str) -> Option<&(dyn Any + Send)> {
        None
    }
}

/// Map-backed context. One is created per request by
/// [`Service::serve`](crate::Service::serve).
#[derive(Debug, Default)]
pub struct RequestContext {
    values: HashMap<String, Box<dyn Any + Send>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Context for RequestContext {
    fn set(&mut self, key: &str, value: Box<dyn Any + Send>) {
        self.values.insert(key.to_owned(), value);
    }

    fn get(&self, key: &str) -> Option<&(dyn Any + Send)> {
        self.values.get(key).map(|v| v.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_context_stores_and_returns_values() {
        let mut ctx = RequestContext::new();
        ctx.insert("count", 3_i64);
        ctx.insert("label", String::from("fast"));

        assert_eq!(ctx.get_as::<i64>("count"), Some(&3));
        assert_eq!(ctx.get_as::<String>("label").map(String::as_str), Some("fast"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn set_replaces_previous_value() {
        let mut ctx = RequestContext::new();
        ctx.insert("k", 1_i64);
        ctx.insert("k", 2_i64);
        assert_eq!(ctx.get_as::<i64>("k"), Some(&2));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn wrong_type_reads_as_none() {
        let mut ctx = RequestContext::new();
        ctx.insert("k", 1_i64);
        assert_eq!(ctx.get_as::<String>("k"), None);
    }

    #[test]
    fn missing_key_reads_as_none() {
        let ctx = RequestContext::new();
        assert!(ctx.get("absent").is_none());
    }

    #[test]
    fn null_context_discards_writes() {
        let mut ctx = NullContext;
        ctx.insert("k", 1_i64);
        assert_eq!(ctx.get_as::<i64>("k"), None);
    }

    #[test]
    fn typed_access_works_through_dyn_context() {
        let mut owned = RequestContext::new();
        let ctx: &mut dyn Context = &mut owned;
        ctx.insert("k", 7_u16);
        assert_eq!(ctx.get_as::<u16>("k"), Some(&7));
    }

    #[test]
    fn usage_key_starts_with_nul() {
        assert!(ROUTE_USAGE_KEY.starts_with('\u{0}'));
        assert!(ROUTE_USAGE_KEY.ends_with("usage"));
    }
}
