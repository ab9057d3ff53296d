//! Path segment trie.
//!
//! # Responsibilities
//! - Store registered patterns as literal and parameter edges per segment
//! - Resolve an incoming path to a handler, its usage text, and captures
//!
//! # Design Decisions
//! - At most one parameter edge per node; a literal edge always wins over it
//! - Re-registering a pattern silently replaces the terminal record
//! - Segments are compared as received; no percent-decoding here

use std::collections::HashMap;

use crate::handler::Handler;
use crate::routing::RouteParams;

/// One trie node. The root represents the text before the first `/`.
#[derive(Default)]
pub(crate) struct Node {
    children: HashMap<String, Node>,
    param: Option<Box<ParamEdge>>,
    terminal: Option<Terminal>,
}

/// The single parameter-capture edge of a node, with its declared name.
struct ParamEdge {
    name: String,
    node: Node,
}

struct Terminal {
    usage: String,
    handler: Handler,
}

/// A successful lookup: the handler, its usage text, and ordered captures.
pub(crate) struct RouteMatch<'a> {
    pub handler: &'a Handler,
    pub usage: &'a str,
    pub params: RouteParams,
}

impl Node {
    /// Insert `pattern`, creating edges as needed. A segment starting with
    /// `:` follows the parameter edge and takes over its declared name;
    /// any other segment (the empty one included) follows a literal edge.
    /// The final node's terminal record is replaced unconditionally.
    pub(crate) fn add_route(&mut self, pattern: &str, usage: &str, handler: Handler) {
        let mut node = self;
        for segment in pattern.split('/') {
            if let Some(name) = segment.strip_prefix(':') {
                let edge = node.param.get_or_insert_with(|| {
                    Box::new(ParamEdge { name: String::new(), node: Node::default() })
                });
                edge.name = name.to_owned();
                node = &mut edge.node;
            } else {
                node = node.children.entry(segment.to_owned()).or_default();
            }
        }
        node.terminal = Some(Terminal { usage: usage.to_owned(), handler });
    }

    /// Walk `path` segment by segment. Literal edges are tried first; a
    /// parameter edge accepts any non-empty segment and records the
    /// capture. The walk succeeds only if it ends on a terminal node.
    pub(crate) fn get_value(&self, path: &str) -> Option<RouteMatch<'_>> {
        let mut node = self;
        let mut params = RouteParams::new();
        for segment in path.split('/') {
            if let Some(child) = node.children.get(segment) {
                node = child;
            } else {
                let edge = node.param.as_deref()?;
                if segment.is_empty() {
                    return None;
                }
                params.push(&edge.name, segment);
                node = &edge.node;
            }
        }
        let terminal = node.terminal.as_ref()?;
        Some(RouteMatch {
            handler: &terminal.handler,
            usage: &terminal.usage,
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::http::request::Request;
    use crate::http::response::ResponseWriter;
    use hyper::Method;

    fn marker(tag: &'static str) -> Handler {
        Handler::plain(move |w, _r| w.send(tag))
    }

    fn body_of(m: &RouteMatch<'_>) -> Vec<u8> {
        let mut ctx = RequestContext::new();
        let mut w = ResponseWriter::new();
        let mut r = Request::new(Method::GET, "/".parse().unwrap());
        m.handler.call(&mut ctx, &mut w, &mut r);
        w.body().to_vec()
    }

    #[test]
    fn literal_pattern_matches_exactly() {
        let mut root = Node::default();
        root.add_route("/users/active", "active users", marker("a"));

        let m = root.get_value("/users/active").unwrap();
        assert_eq!(m.usage, "active users");
        assert!(m.params.is_empty());
        assert!(root.get_value("/users").is_none());
        assert!(root.get_value("/users/active/extra").is_none());
    }

    #[test]
    fn parameter_segment_captures_the_text() {
        let mut root = Node::default();
        root.add_route("/users/:id", "one user", marker("u"));

        let m = root.get_value("/users/42").unwrap();
        assert_eq!(m.params.get("id"), Some("42"));
    }

    #[test]
    fn literal_wins_over_parameter() {
        let mut root = Node::default();
        root.add_route("/users/:id", "one user", marker("param"));
        root.add_route("/users/me", "current user", marker("literal"));

        let m = root.get_value("/users/me").unwrap();
        assert_eq!(body_of(&m), b"literal");
        assert!(m.params.is_empty());

        let m = root.get_value("/users/42").unwrap();
        assert_eq!(body_of(&m), b"param");
        assert_eq!(m.params.get("id"), Some("42"));
    }

    #[test]
    fn captures_come_back_in_path_order() {
        let mut root = Node::default();
        root.add_route("/repos/:owner/:repo/issues/:number", "an issue", marker("i"));

        let m = root.get_value("/repos/acme/site/issues/17").unwrap();
        let pairs: Vec<_> = m.params.iter().collect();
        assert_eq!(
            pairs,
            vec![("owner", "acme"), ("repo", "site"), ("number", "17")]
        );
    }

    #[test]
    fn empty_segment_never_binds_a_parameter() {
        let mut root = Node::default();
        root.add_route("/a/:x/b", "x", marker("x"));

        assert!(root.get_value("/a//b").is_none());
    }

    #[test]
    fn empty_segment_matches_an_explicit_empty_literal() {
        let mut root = Node::default();
        root.add_route("/a//b", "double slash", marker("d"));

        assert!(root.get_value("/a//b").is_some());
        assert!(root.get_value("/a/x/b").is_none());
    }

    #[test]
    fn intermediate_node_without_terminal_is_not_a_match() {
        let mut root = Node::default();
        root.add_route("/api/v1/items", "items", marker("i"));

        assert!(root.get_value("/api/v1").is_none());
    }

    #[test]
    fn re_registration_replaces_the_terminal() {
        let mut root = Node::default();
        root.add_route("/ping", "first", marker("first"));
        root.add_route("/ping", "second", marker("second"));

        let m = root.get_value("/ping").unwrap();
        assert_eq!(m.usage, "second");
        assert_eq!(body_of(&m), b"second");
    }

    #[test]
    fn empty_pattern_matches_the_bare_root() {
        let mut root = Node::default();
        root.add_route("", "root", marker("r"));

        assert!(root.get_value("").is_some());
        assert!(root.get_value("/").is_none());
    }

    #[test]
    fn later_declared_name_owns_the_parameter_edge() {
        let mut root = Node::default();
        root.add_route("/files/:name", "by name", marker("n"));
        root.add_route("/files/:id/raw", "raw by id", marker("raw"));

        let m = root.get_value("/files/99/raw").unwrap();
        assert_eq!(m.params.get("id"), Some("99"));
        let m = root.get_value("/files/99").unwrap();
        assert_eq!(m.params.get("id"), Some("99"));
        assert_eq!(m.params.get("name"), None);
    }
}
