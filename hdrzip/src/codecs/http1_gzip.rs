//! HTTP/1 serialization compressed with gzip.

use std::any::Any;
use std::io::Write;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::constants::CODEC_HTTP1_GZIP;
use crate::error::{CodecError, ConfigError};
use crate::headers::HeaderMessage;
use crate::serialization::{LineFormat, write_block};
use crate::traits::{CodecContext, CodecHandler, downcast_context};
use crate::types::Direction;

/// Compression level used when none is configured.
pub const DEFAULT_GZIP_LEVEL: u32 = 6;
/// Highest level accepted by the deflate encoder.
pub const MAX_GZIP_LEVEL: u32 = 9;

/// State of the gzip baseline for one connection and direction.
#[derive(Debug, Clone)]
pub struct GzipContext {
    direction: Direction,
    level: u32,
    compressed_count: u64,
}

impl GzipContext {
    /// Level every message on this context is compressed with.
    pub fn level(&self) -> u32 {
        self.level
    }
}

impl CodecContext for GzipContext {
    fn codec_name(&self) -> &str {
        CODEC_HTTP1_GZIP
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn messages_compressed(&self) -> u64 {
        self.compressed_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Gzip of the literal HTTP/1 block, each message compressed on its own.
///
/// Cannot decompress; the harness skips its verification.
#[derive(Debug, Clone, Copy)]
pub struct Http1GzipHandler {
    level: u32,
}

impl Default for Http1GzipHandler {
    fn default() -> Self {
        Self {
            level: DEFAULT_GZIP_LEVEL,
        }
    }
}

impl Http1GzipHandler {
    /// Creates a handler compressing at `level`.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidCodecParameter`] - `level` is above 9
    pub fn new(level: u32) -> Result<Self, ConfigError> {
        if level > MAX_GZIP_LEVEL {
            return Err(ConfigError::InvalidCodecParameter {
                codec: CODEC_HTTP1_GZIP.to_string(),
                parameter: level.to_string(),
                description: format!("level must be between 0 and {MAX_GZIP_LEVEL}"),
            });
        }
        Ok(Self { level })
    }

    /// Builds a handler from codec parameters; the first one is the level.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidCodecParameter`] - The level is not a number in 0..=9,
    ///   or more than one parameter was given
    pub fn from_params(params: &[String]) -> Result<Self, ConfigError> {
        let invalid = |parameter: &str, description: &str| ConfigError::InvalidCodecParameter {
            codec: CODEC_HTTP1_GZIP.to_string(),
            parameter: parameter.to_string(),
            description: description.to_string(),
        };
        match params {
            [] => Ok(Self::default()),
            [level] => level
                .parse::<u32>()
                .map_err(|_| invalid(level, "level must be an integer"))
                .and_then(Self::new),
            [_, extra, ..] => Err(invalid(extra, "only a compression level is accepted")),
        }
    }

    /// Configured compression level.
    pub fn level(&self) -> u32 {
        self.level
    }
}

impl CodecHandler for Http1GzipHandler {
    fn name(&self) -> &str {
        CODEC_HTTP1_GZIP
    }

    fn create_context(&self, direction: Direction) -> Box<dyn CodecContext> {
        Box::new(GzipContext {
            direction,
            level: self.level,
            compressed_count: 0,
        })
    }

    fn compress(
        &self,
        context: &mut dyn CodecContext,
        message: &HeaderMessage,
        _host: &str,
    ) -> Result<Bytes, CodecError> {
        let context = downcast_context::<GzipContext>(context, CODEC_HTTP1_GZIP)?;
        let block = write_block(message, LineFormat::HTTP1)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::new(context.level));
        encoder
            .write_all(block.as_bytes())
            .map_err(|e| CodecError::Compression(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| CodecError::Compression(e.to_string()))?;

        context.compressed_count += 1;
        Ok(Bytes::from(compressed))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;

    fn request() -> HeaderMessage {
        HeaderMessage::from_pairs([
            (":method", "GET"),
            (":path", "/"),
            (":version", "HTTP/1.1"),
            (":host", "example.com"),
            ("accept", "*/*"),
        ])
    }

    #[test]
    fn output_inflates_to_http1_block() {
        let handler = Http1GzipHandler::default();
        let mut context = handler.create_context(Direction::Request);
        let bytes = handler.compress(context.as_mut(), &request(), "h").unwrap();

        let mut inflated = String::new();
        GzDecoder::new(&bytes[..])
            .read_to_string(&mut inflated)
            .unwrap();
        assert_eq!(
            inflated,
            write_block(&request(), LineFormat::HTTP1).unwrap()
        );
        assert_eq!(context.messages_compressed(), 1);
    }

    #[test]
    fn decompression_is_unsupported() {
        let handler = Http1GzipHandler::default();
        let mut context = handler.create_context(Direction::Request);
        assert_eq!(
            handler.decompress(context.as_mut(), b"anything"),
            Err(CodecError::DecompressionUnsupported {
                codec: CODEC_HTTP1_GZIP.to_string()
            })
        );
    }

    #[test]
    fn level_comes_from_params() {
        assert_eq!(Http1GzipHandler::from_params(&[]).unwrap().level(), 6);
        assert_eq!(
            Http1GzipHandler::from_params(&["9".to_string()])
                .unwrap()
                .level(),
            9
        );
        for bad in ["10", "fast", "-1"] {
            assert!(matches!(
                Http1GzipHandler::from_params(&[bad.to_string()]),
                Err(ConfigError::InvalidCodecParameter { .. })
            ));
        }
        assert!(Http1GzipHandler::from_params(&["1".to_string(), "2".to_string()]).is_err());
    }

    #[test]
    fn context_carries_the_level() {
        let handler = Http1GzipHandler::new(1).unwrap();
        let mut context = handler.create_context(Direction::Response);
        let gzip = context.as_any_mut().downcast_mut::<GzipContext>().unwrap();
        assert_eq!(gzip.level(), 1);
    }
}
