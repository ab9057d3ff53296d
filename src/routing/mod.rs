//! Routing subsystem.
//!
//! One prefix tree per HTTP method per service, built over path segments.
//! Literal segments win over `:name` parameter captures at every step.

pub(crate) mod tree;

/// Parameters captured while matching a path, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    captures: Vec<(String, String)>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: &str, value: &str) {
        self.captures.push((name.to_owned(), value.to_owned()));
    }

    /// Value of the first capture with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Captures as `(name, value)` pairs, ordered by capture position.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.captures.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_the_first_capture_with_the_name() {
        let mut params = RouteParams::new();
        params.push("id", "1");
        params.push("id", "2");
        assert_eq!(params.get("id"), Some("1"));
    }

    #[test]
    fn iter_preserves_capture_order() {
        let mut params = RouteParams::new();
        params.push("owner", "acme");
        params.push("repo", "site");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("owner", "acme"), ("repo", "site")]);
    }

    #[test]
    fn missing_name_is_none() {
        let params = RouteParams::new();
        assert_eq!(params.get("absent"), None);
        assert!(params.is_empty());
    }
}
