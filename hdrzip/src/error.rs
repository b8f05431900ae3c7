//! Header compression error types.
//!
//! This module separates failures that happen while a codec processes a single
//! message (`CodecError`) from failures that make the whole comparison run
//! meaningless (`ConfigError`). Configuration errors are raised before the first
//! message is processed. The `thiserror` crate is used for the definitions.

use thiserror::Error;

/// Errors raised by a codec while compressing or decompressing one message.
///
/// Only [`CodecError::DecompressionUnsupported`] is expected during a normal run;
/// every other variant indicates a broken codec or a corrupted stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The codec does not implement decompression; verification is skipped.
    #[error("Codec '{codec}' does not support decompression")]
    DecompressionUnsupported { codec: String },

    /// A `ref` pointed at a header the receiver never saw on this connection and direction.
    #[error("Stream desynchronized: reference to '{name}' has no previously received value")]
    StreamDesync { name: String },

    /// A header token is not part of the codec's dictionary.
    #[error("Unknown header token '{token}'")]
    UnknownToken { token: String },

    /// The compressed bytes do not follow the expected line grammar.
    #[error("Malformed compressed block at line {line}: {description}")]
    Malformed { line: usize, description: String },

    /// The message cannot be serialized by this codec.
    #[error("Cannot serialize message: missing pseudo-header '{name}'")]
    MissingPseudoHeader { name: String },

    /// Backend compression failure (e.g. the deflate stream).
    #[error("Compression backend error: {0}")]
    Compression(String),

    /// Unexpected internal logic error, likely a bug in a codec.
    #[error("Internal logic error: {0}")]
    Internal(String),
}

/// Configuration-time failures. All of them are fatal before processing starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two header names map to the same dictionary token.
    #[error("Dictionary token '{token}' is assigned to both '{first}' and '{second}'")]
    DuplicateToken {
        token: String,
        first: String,
        second: String,
    },

    /// A header name appears twice in a dictionary.
    #[error("Dictionary lists header '{name}' more than once")]
    DuplicateName { name: String },

    /// A dictionary token collides with reserved syntax of the line format.
    #[error("Dictionary token '{token}' for '{name}' is reserved")]
    ReservedToken { token: String, name: String },

    /// No codec is registered under the requested name.
    #[error("Unknown codec '{0}'")]
    UnknownCodec(String),

    /// A codec with this name was already registered.
    #[error("Codec '{0}' already registered")]
    DuplicateCodec(String),

    /// A codec parameter could not be interpreted.
    #[error("Invalid parameter '{parameter}' for codec '{codec}': {description}")]
    InvalidCodecParameter {
        codec: String,
        parameter: String,
        description: String,
    },

    /// A multiplex declaration failed to compile into a host pattern.
    #[error("Invalid host pattern '{pattern}': {description}")]
    InvalidHostPattern {
        pattern: String,
        description: String,
    },

    /// The baseline codec is not among the selected codecs.
    #[error("Baseline codec '{0}' is not selected")]
    BaselineNotSelected(String),
}

/// Umbrella error type for the `hdrzip` library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HdrzipError {
    /// Error from a codec operation.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Error in the run configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A header message violated the header model.
    #[error("Invalid header '{name}': {description}")]
    InvalidHeader { name: String, description: String },

    /// A connection or codec lookup failed inside the engine.
    #[error("Not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_desync_error_display() {
        let err = CodecError::StreamDesync {
            name: "user-agent".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Stream desynchronized: reference to 'user-agent' has no previously received value"
        );
    }

    #[test]
    fn duplicate_token_error_display() {
        let err = ConfigError::DuplicateToken {
            token: "c".to_string(),
            first: "cookie".to_string(),
            second: "cache-control".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Dictionary token 'c' is assigned to both 'cookie' and 'cache-control'"
        );
    }

    #[test]
    fn hdrzip_error_from_codec_error() {
        let codec_err = CodecError::UnknownToken {
            token: "zz".to_string(),
        };
        match HdrzipError::from(codec_err.clone()) {
            HdrzipError::Codec(inner) => assert_eq!(inner, codec_err),
            other => panic!("Incorrect HdrzipError variant: {other:?}"),
        }
    }

    #[test]
    fn hdrzip_error_from_config_error() {
        let config_err = ConfigError::UnknownCodec("spdy9".to_string());
        assert_eq!(
            format!("{}", HdrzipError::from(config_err)),
            "Configuration error: Unknown codec 'spdy9'"
        );
    }
}
