//! Identity HTTP/1 codec, the default baseline.

use std::any::Any;

use bytes::Bytes;

use crate::constants::CODEC_HTTP1;
use crate::error::CodecError;
use crate::headers::HeaderMessage;
use crate::serialization::{LineFormat, parse_block, write_block};
use crate::traits::{CodecContext, CodecHandler, downcast_context};
use crate::types::Direction;

/// Context of a codec that keeps no state besides a message counter.
#[derive(Debug, Clone)]
pub struct StatelessContext {
    codec: &'static str,
    direction: Direction,
    compressed_count: u64,
}

impl StatelessContext {
    /// Creates a counter-only context for `codec`.
    pub fn new(codec: &'static str, direction: Direction) -> Self {
        Self {
            codec,
            direction,
            compressed_count: 0,
        }
    }

    /// Records one compressed message.
    pub fn record(&mut self) {
        self.compressed_count += 1;
    }
}

impl CodecContext for StatelessContext {
    fn codec_name(&self) -> &str {
        self.codec
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

/// Serializes messages as literal HTTP/1 header blocks.
///
/// Its output size is what an uncompressed HTTP/1.1 connection would carry,
/// which makes it the reference every ratio is computed against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Http1Handler;

impl Http1Handler {
    /// Creates the handler.
    pub fn new() -> Self {
        Self
    }
}

impl CodecHandler for Http1Handler {
    fn name(&self) -> &str {
        CODEC_HTTP1
    }

    fn create_context(&self, direction: Direction) -> Box<dyn CodecContext> {
        Box::new(StatelessContext::new(CODEC_HTTP1, direction))
    }

    fn compress(
        &self,
        context: &mut dyn CodecContext,
        message: &HeaderMessage,
        _host: &str,
    ) -> Result<Bytes, CodecError> {
        let context = downcast_context::<StatelessContext>(context, CODEC_HTTP1)?;
        let block = write_block(message, LineFormat::HTTP1)?;
        context.record();
        Ok(Bytes::from(block))
    }

    fn decompress(
        &self,
        _context: &mut dyn CodecContext,
        compressed: &[u8],
    ) -> Result<HeaderMessage, CodecError> {
        parse_block(compressed, LineFormat::HTTP1)
    }
}
