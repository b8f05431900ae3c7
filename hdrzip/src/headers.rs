//! The header model shared by every codec.
//!
//! A [`HeaderMessage`] maps lowercase header names to string values. Repeated
//! occurrences of one header are packed into a single entry, joined with
//! [`MULTI_VALUE_SEPARATOR`]; [`HeaderMessage::values`] splits them back.
//! Names starting with [`PSEUDO_HEADER_PREFIX`] carry protocol framing
//! (method, path, status, ...) rather than literal wire headers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONNECTION_HEADER, COOKIE_HEADER, COOKIE_SEPARATOR, HOP_BY_HOP_HEADERS, MULTI_VALUE_SEPARATOR,
    PSEUDO_HEADER_PREFIX, PSEUDO_METHOD, PSEUDO_STATUS,
};
use crate::error::HdrzipError;
use crate::types::Direction;

/// Returns true if `name` denotes a pseudo-header.
#[inline]
pub fn is_pseudo_header(name: &str) -> bool {
    name.starts_with(PSEUDO_HEADER_PREFIX)
}

/// Headers of one HTTP message.
///
/// Iteration is in sorted name order, which keeps every serialization
/// deterministic for a given input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderMessage {
    fields: BTreeMap<String, String>,
}

impl HeaderMessage {
    /// Creates an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a message from wire-order `(name, value)` pairs.
    ///
    /// Names are lowercased; a name seen more than once has its values joined
    /// with [`MULTI_VALUE_SEPARATOR`] in arrival order.
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut message = Self::new();
        for (name, value) in pairs {
            message.append(name.as_ref().to_ascii_lowercase(), value.as_ref());
        }
        message
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.into(), value.into())
    }

    /// Adds one occurrence of `name`, packing it after any existing value.
    pub fn append(&mut self, name: impl Into<String>, value: &str) {
        self.fields
            .entry(name.into())
            .and_modify(|existing| {
                existing.push(MULTI_VALUE_SEPARATOR);
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Packed value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Individual occurrences of `name`, in arrival order.
    pub fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .get(name)
            .into_iter()
            .flat_map(|value| value.split(MULTI_VALUE_SEPARATOR))
    }

    /// Removes `name`, returning its packed value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// True if `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the message carries no headers at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates `(name, packed value)` pairs in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Iterates ordinary (non pseudo) headers.
    pub fn regular_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(name, _)| !is_pseudo_header(name))
    }

    /// Infers the direction from the pseudo-headers present.
    ///
    /// Returns `None` when neither `:method` nor `:status` is set.
    pub fn direction(&self) -> Option<Direction> {
        if self.contains(PSEUDO_METHOD) {
            Some(Direction::Request)
        } else if self.contains(PSEUDO_STATUS) {
            Some(Direction::Response)
        } else {
            None
        }
    }

    /// Checks the message against the header model.
    ///
    /// # Errors
    /// - [`HdrzipError::InvalidHeader`] - A name is empty, not lowercase, contains
    ///   whitespace, a comma or an interior `:`, or a value contains a line break
    pub fn validate(&self) -> Result<(), HdrzipError> {
        for (name, value) in self.iter() {
            let invalid = |description: &str| HdrzipError::InvalidHeader {
                name: name.to_string(),
                description: description.to_string(),
            };
            let bare = name.strip_prefix(PSEUDO_HEADER_PREFIX).unwrap_or(name);
            if bare.is_empty() {
                return Err(invalid("empty name"));
            }
            if bare.contains(PSEUDO_HEADER_PREFIX) {
                return Err(invalid("name contains ':' after the first character"));
            }
            if bare
                .chars()
                .any(|c| c.is_whitespace() || c == ',' || c.is_ascii_uppercase())
            {
                return Err(invalid("name must be lowercase without whitespace or commas"));
            }
            if value.contains(['\r', '\n']) {
                return Err(invalid("value contains a line break"));
            }
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMessage {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Removes hop-by-hop headers in place.
///
/// Drops `transfer-encoding`, `te`, `keep-alive`, `trailers` and every header
/// named in the `connection` value, then `connection` itself. Applying it twice
/// is a no-op.
pub fn strip_hop_by_hop(message: &mut HeaderMessage) {
    if let Some(listed) = message.remove(CONNECTION_HEADER) {
        for name in listed
            .split(|c: char| c == ',' || c.is_whitespace() || c == MULTI_VALUE_SEPARATOR)
            .filter(|name| !name.is_empty())
        {
            message.remove(&name.to_ascii_lowercase());
        }
    }
    for name in HOP_BY_HOP_HEADERS {
        message.remove(name);
    }
}

/// A single difference found by [`compare_headers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderDiff {
    /// Header present only in the original message.
    OnlyInOriginal { name: String },
    /// Header present only in the reconstructed message.
    OnlyInReconstructed { name: String },
    /// Header present in both with different normalized values.
    ValueMismatch {
        name: String,
        original: String,
        reconstructed: String,
    },
}

impl fmt::Display for HeaderDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderDiff::OnlyInOriginal { name } => write!(f, "{name} present in only one (A)"),
            HeaderDiff::OnlyInReconstructed { name } => {
                write!(f, "{name} present in only one (B)")
            }
            HeaderDiff::ValueMismatch {
                name,
                original,
                reconstructed,
            } => write!(
                f,
                "{name} has mismatched values:\n  a -> {original}\n  b -> {reconstructed}"
            ),
        }
    }
}

/// Compares an original message with its reconstruction.
///
/// Cookie values are compared as unordered sets of crumbs; every other value
/// is compared as a trimmed string. An empty result means the messages match.
pub fn compare_headers(original: &HeaderMessage, reconstructed: &HeaderMessage) -> Vec<HeaderDiff> {
    let mut diffs = Vec::new();
    for (name, value) in original.iter() {
        match reconstructed.get(name) {
            None => diffs.push(HeaderDiff::OnlyInOriginal {
                name: name.to_string(),
            }),
            Some(other) => {
                let (left, right) = (normalized_value(name, value), normalized_value(name, other));
                if left != right {
                    diffs.push(HeaderDiff::ValueMismatch {
                        name: name.to_string(),
                        original: value.to_string(),
                        reconstructed: other.to_string(),
                    });
                }
            }
        }
    }
    diffs.extend(
        reconstructed
            .iter()
            .filter(|(name, _)| !original.contains(name))
            .map(|(name, _)| HeaderDiff::OnlyInReconstructed {
                name: name.to_string(),
            }),
    );
    diffs
}

fn normalized_value(name: &str, value: &str) -> String {
    if name != COOKIE_HEADER {
        return value.trim().to_string();
    }
    let mut crumbs: Vec<&str> = value
        .split(COOKIE_SEPARATOR)
        .map(|crumb| crumb.trim_start_matches(' '))
        .collect();
    crumbs.sort_unstable();
    crumbs.join("; ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HeaderMessage {
        HeaderMessage::from_pairs([
            (":method", "GET"),
            (":path", "/index.html"),
            (":version", "HTTP/1.1"),
            (":scheme", "http"),
            (":host", "www.example.com"),
            ("Accept", "*/*"),
        ])
    }

    #[test]
    fn from_pairs_lowercases_and_packs_repeats() {
        let message = HeaderMessage::from_pairs([
            ("Set-Cookie", "a=1"),
            ("set-cookie", "b=2"),
            ("Server", "nginx"),
        ]);
        assert_eq!(message.get("set-cookie"), Some("a=1\0b=2"));
        assert_eq!(
            message.values("set-cookie").collect::<Vec<_>>(),
            vec!["a=1", "b=2"]
        );
        assert_eq!(message.get("server"), Some("nginx"));
        assert_eq!(message.len(), 2);
    }

    #[test]
    fn direction_is_inferred_from_pseudo_headers() {
        assert_eq!(request().direction(), Some(Direction::Request));
        let response = HeaderMessage::from_pairs([(":status", "200")]);
        assert_eq!(response.direction(), Some(Direction::Response));
        assert_eq!(HeaderMessage::new().direction(), None);
    }

    #[test]
    fn regular_headers_skip_pseudo_headers() {
        let request = request();
        let names: Vec<_> = request.regular_headers().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["accept"]);
    }

    #[test]
    fn validate_rejects_bad_names_and_values() {
        assert!(request().validate().is_ok());

        let mut bad = request();
        bad.insert("x:y", "1");
        assert!(matches!(
            bad.validate(),
            Err(HdrzipError::InvalidHeader { name, .. }) if name == "x:y"
        ));

        let mut bad = request();
        bad.insert("x-folded", "a\r\n b");
        assert!(bad.validate().is_err());

        let mut bad = request();
        bad.insert(":", "empty");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn strip_hop_by_hop_removes_listed_headers() {
        let mut message = HeaderMessage::from_pairs([
            ("connection", "keep-alive, X-Trace"),
            ("keep-alive", "timeout=5"),
            ("x-trace", "abc"),
            ("transfer-encoding", "chunked"),
            ("te", "trailers"),
            ("trailers", "x"),
            ("content-type", "text/html"),
        ]);
        strip_hop_by_hop(&mut message);
        assert_eq!(
            message.iter().collect::<Vec<_>>(),
            vec![("content-type", "text/html")]
        );

        let before = message.clone();
        strip_hop_by_hop(&mut message);
        assert_eq!(message, before);
    }

    #[test]
    fn compare_ignores_cookie_order_and_whitespace() {
        let a = HeaderMessage::from_pairs([("cookie", "a=1; b=2;c=3"), ("server", " nginx ")]);
        let b = HeaderMessage::from_pairs([("cookie", "c=3; a=1; b=2"), ("server", "nginx")]);
        assert!(compare_headers(&a, &b).is_empty());
    }

    #[test]
    fn compare_reports_every_difference() {
        let a = HeaderMessage::from_pairs([("server", "nginx"), ("vary", "accept")]);
        let b = HeaderMessage::from_pairs([("server", "apache"), ("etag", "\"x\"")]);
        let diffs = compare_headers(&a, &b);
        assert_eq!(
            diffs,
            vec![
                HeaderDiff::ValueMismatch {
                    name: "server".to_string(),
                    original: "nginx".to_string(),
                    reconstructed: "apache".to_string(),
                },
                HeaderDiff::OnlyInOriginal {
                    name: "vary".to_string()
                },
                HeaderDiff::OnlyInReconstructed {
                    name: "etag".to_string()
                },
            ]
        );
        assert_eq!(diffs[1].to_string(), "vary present in only one (A)");
    }
}
