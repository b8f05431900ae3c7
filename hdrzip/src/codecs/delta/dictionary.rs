//! Bijective header name dictionary.

use std::borrow::Cow;
use std::collections::HashMap;

use super::constants::{DELTA_ESCAPE_MARKER, DELTA_HEADER_TOKENS, DELTA_REF_HEADER, DELTA_REF_SEPARATOR};
use crate::constants::{HOST_HEADER, PSEUDO_HEADER_PREFIX};
use crate::error::{CodecError, ConfigError};
use crate::headers::is_pseudo_header;

/// Maps common header names to short tokens and back.
///
/// Construction fails unless the mapping is a bijection whose tokens cannot be
/// confused with escaped names, pseudo-headers or the `ref` header.
#[derive(Debug, Clone)]
pub struct HeaderDictionary {
    tokens_by_name: HashMap<String, String>,
    names_by_token: HashMap<String, String>,
}

impl HeaderDictionary {
    /// Builds a dictionary from `(name, token)` pairs.
    ///
    /// # Errors
    /// - [`ConfigError::DuplicateName`] - A name is listed twice
    /// - [`ConfigError::DuplicateToken`] - Two names share a token
    /// - [`ConfigError::ReservedToken`] - A token clashes with the line syntax
    pub fn new<I, N, T>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let mut tokens_by_name = HashMap::new();
        let mut names_by_token: HashMap<String, String> = HashMap::new();
        for (name, token) in entries {
            let (name, token) = (name.into(), token.into());
            if is_reserved_token(&token) {
                return Err(ConfigError::ReservedToken { token, name });
            }
            if let Some(first) = names_by_token.get(&token) {
                return Err(ConfigError::DuplicateToken {
                    token,
                    first: first.clone(),
                    second: name,
                });
            }
            if tokens_by_name.contains_key(&name) {
                return Err(ConfigError::DuplicateName { name });
            }
            names_by_token.insert(token.clone(), name.clone());
            tokens_by_name.insert(name, token);
        }
        Ok(Self {
            tokens_by_name,
            names_by_token,
        })
    }

    /// The dictionary used by the delta codec.
    ///
    /// # Errors
    /// - [`ConfigError`] - The built-in table is not a bijection
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(DELTA_HEADER_TOKENS)
    }

    /// Number of tokenized names.
    pub fn len(&self) -> usize {
        self.tokens_by_name.len()
    }

    /// True if the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.tokens_by_name.is_empty()
    }

    /// Wire form of `name`: its token, `!name` when untokenized, or the
    /// pseudo-header name unchanged.
    pub fn encode_name<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        if is_pseudo_header(name) {
            return Cow::Borrowed(name);
        }
        match self.tokens_by_name.get(name) {
            Some(token) => Cow::Borrowed(token.as_str()),
            None => Cow::Owned(format!("{DELTA_ESCAPE_MARKER}{name}")),
        }
    }

    /// Canonical header name for a wire form produced by [`encode_name`](Self::encode_name).
    ///
    /// # Errors
    /// - [`CodecError::UnknownToken`] - Neither escaped nor a known token
    pub fn decode_name(&self, wire_name: &str) -> Result<String, CodecError> {
        if is_pseudo_header(wire_name) {
            return Ok(wire_name.to_string());
        }
        if let Some(name) = wire_name.strip_prefix(DELTA_ESCAPE_MARKER) {
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }
        self.names_by_token
            .get(wire_name)
            .cloned()
            .ok_or_else(|| CodecError::UnknownToken {
                token: wire_name.to_string(),
            })
    }
}

fn is_reserved_token(token: &str) -> bool {
    token.is_empty()
        || token == DELTA_REF_HEADER
        || token == HOST_HEADER
        || token.starts_with(DELTA_ESCAPE_MARKER)
        || token.starts_with(PSEUDO_HEADER_PREFIX)
        || token.contains([DELTA_REF_SEPARATOR, ':'])
        || token.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_dictionary_is_a_bijection() {
        let dictionary = HeaderDictionary::standard().unwrap();
        assert_eq!(dictionary.len(), DELTA_HEADER_TOKENS.len());
        for (name, token) in DELTA_HEADER_TOKENS {
            assert_eq!(dictionary.encode_name(name), token);
            assert_eq!(dictionary.decode_name(token).unwrap(), name);
        }
    }

    #[test]
    fn duplicate_token_fails_construction() {
        let result = HeaderDictionary::new([("cookie", "c"), ("cache-control", "c")]);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::DuplicateToken {
                token: "c".to_string(),
                first: "cookie".to_string(),
                second: "cache-control".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_name_fails_construction() {
        let result = HeaderDictionary::new([("cookie", "c"), ("cookie", "k")]);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::DuplicateName {
                name: "cookie".to_string()
            }
        );
    }

    #[test]
    fn reserved_tokens_fail_construction() {
        for token in ["ref", "host", "!x", ":x", "a,b", "a:b", "", "a b"] {
            assert!(
                matches!(
                    HeaderDictionary::new([("x-test", token)]),
                    Err(ConfigError::ReservedToken { .. })
                ),
                "token {token:?} should be reserved"
            );
        }
    }

    #[test]
    fn untokenized_names_are_escaped() {
        let dictionary = HeaderDictionary::standard().unwrap();
        assert_eq!(dictionary.encode_name("x-powered-by"), "!x-powered-by");
        assert_eq!(dictionary.decode_name("!x-powered-by").unwrap(), "x-powered-by");
        assert_eq!(dictionary.encode_name(":status"), ":status");
        assert_eq!(dictionary.decode_name(":status").unwrap(), ":status");
    }

    #[test]
    fn unknown_token_is_rejected() {
        let dictionary = HeaderDictionary::standard().unwrap();
        assert_eq!(
            dictionary.decode_name("zz"),
            Err(CodecError::UnknownToken {
                token: "zz".to_string()
            })
        );
        assert!(dictionary.decode_name("!").is_err());
    }
}
