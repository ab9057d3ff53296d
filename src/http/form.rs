//! Form parameter store.
//!
//! A multimap of string keys to string values, fed from the query string
//! (and form-encoded bodies) and from path captures. Values under one key
//! keep their insertion order; the typed decoder in [`crate::params`]
//! reads from here.

use std::collections::HashMap;

/// Decoded form parameters for one request.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    values: HashMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|vs| vs.first())
            .map(String::as_str)
    }

    /// Every value under `name`, oldest first.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace all values under `name` with the single `value`.
    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_owned(), vec![value.to_owned()]);
    }

    /// Add `value` under `name`, keeping existing values.
    pub fn append(&mut self, name: &str, value: &str) {
        self.values
            .entry(name.to_owned())
            .or_default()
            .push(value.to_owned());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// All `(name, values)` entries. Key order is unspecified; the values
    /// of each key are ordered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decode an `application/x-www-form-urlencoded` payload into the
    /// store. A key without `=` decodes to one empty-string value.
    pub fn extend_from_urlencoded(&mut self, raw: &[u8]) {
        for (key, value) in url::form_urlencoded::parse(raw) {
            self.append(&key, &value);
        }
    }
}
