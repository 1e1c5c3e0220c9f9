//! HTTP headers handling
//!
//! This module provides a type for managing HTTP headers with case-insensitive
//! lookups. A name that is inserted more than once is folded into a single
//! entry holding an ordered sequence of values.

use std::fmt;

/// Value of a header: a single string, or every value seen for a repeated
/// name in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// Append a value, turning a single value into a sequence
    pub fn push(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self {
            HeaderValue::Single(first) => {
                let first = std::mem::take(first);
                *self = HeaderValue::Multi(vec![first, value]);
            }
            HeaderValue::Multi(values) => values.push(value),
        }
    }

    /// First (or only) value
    pub fn as_str(&self) -> &str {
        match self {
            HeaderValue::Single(value) => value,
            HeaderValue::Multi(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// All values in arrival order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice = match self {
            HeaderValue::Single(value) => std::slice::from_ref(value),
            HeaderValue::Multi(values) => values.as_slice(),
        };
        slice.iter().map(String::as_str)
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, HeaderValue::Multi(_))
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Single(value) => f.write_str(value),
            HeaderValue::Multi(values) => f.write_str(&values.join(", ")),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

/// Capitalize a header name: first character upper-case, the rest lower-case
///
/// `content-type` and `CONTENT-TYPE` both become `Content-type`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// HTTP headers collection
///
/// Headers are stored in insertion order and support:
/// - Case-insensitive header name lookups
/// - Folding of repeated names into one multi-value entry
/// - Iteration over all headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, HeaderValue)>,
}

impl Headers {
    /// Create a new empty headers collection
    pub fn new() -> Self {
        Headers {
            headers: Vec::new(),
        }
    }

    /// Insert a header
    ///
    /// If a header with the same name (case-insensitive) already exists,
    /// the value is appended to it rather than replacing it. The spelling of
    /// the first insertion is kept.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.position(&name) {
            Some(idx) => self.headers[idx].1.push(value),
            None => self.headers.push((name, HeaderValue::Single(value))),
        }
    }

    /// Get the value(s) stored for a header (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.position(name).map(|idx| &self.headers[idx].1)
    }

    /// Get the first value for a header (case-insensitive)
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).map(HeaderValue::as_str)
    }

    /// Get all values for a header (case-insensitive)
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .map(|value| value.values().collect())
            .unwrap_or_default()
    }

    /// Check if a header exists
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a header (case-insensitive), returning its value(s)
    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.position(name).map(|idx| self.headers.remove(idx).1)
    }

    /// Get the number of distinct header names
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Check if there are no headers
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterate over all headers
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            for v in value.values() {
                writeln!(f, "{}: {}", name, v)?;
            }
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/html");
        headers.insert("Content-Length", "42");

        assert_eq!(headers.get_str("Content-Type"), Some("text/html"));
        assert_eq!(headers.get_str("Content-Length"), Some("42"));
        assert_eq!(headers.get_str("Missing"), None);
    }

    #[test]
    fn test_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/html");

        assert_eq!(headers.get_str("content-type"), Some("text/html"));
        assert_eq!(headers.get_str("CONTENT-TYPE"), Some("text/html"));
        assert!(headers.contains("CoNtEnT-TyPe"));
    }

    #[test]
    fn test_repeated_names_fold() {
        let mut headers = Headers::new();
        headers.insert("Set-Cookie", "a=1");
        headers.insert("set-cookie", "b=2");
        headers.insert("SET-COOKIE", "c=3");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_all("Set-Cookie"), vec!["a=1", "b=2", "c=3"]);
        assert_eq!(headers.get_str("Set-Cookie"), Some("a=1"));
        assert!(headers.get("set-cookie").unwrap().is_multi());

        let (name, _) = headers.iter().next().unwrap();
        assert_eq!(name, "Set-Cookie");
    }

    #[test]
    fn test_remove() {
        let mut headers = Headers::new();
        headers.insert("X-Remove", "value1");
        headers.insert("X-Keep", "value2");
        headers.insert("X-Remove", "value3");

        let removed = headers.remove("x-remove").unwrap();
        assert_eq!(
            removed,
            HeaderValue::Multi(vec!["value1".to_string(), "value3".to_string()])
        );
        assert_eq!(headers.get("X-Remove"), None);
        assert_eq!(headers.get_str("X-Keep"), Some("value2"));
        assert_eq!(headers.remove("X-Remove"), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("host"), "Host");
        assert_eq!(capitalize("CONTENT-TYPE"), "Content-type");
        assert_eq!(capitalize("x-Custom-Header"), "X-custom-header");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_header_value_display() {
        let mut value = HeaderValue::from("a");
        assert_eq!(value.to_string(), "a");
        value.push("b");
        assert_eq!(value.to_string(), "a, b");
        assert_eq!(value.values().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_from_iter_and_display() {
        let headers: Headers = vec![("Accept", "*/*"), ("Cookie", "a"), ("Cookie", "b")]
            .into_iter()
            .collect();

        assert_eq!(headers.to_string(), "Accept: */*\nCookie: a\nCookie: b\n");
    }
}
