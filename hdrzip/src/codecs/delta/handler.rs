//! Delta codec handler.
//!
//! Implements [`CodecHandler`] for the `delta` codec, delegating the block
//! construction to `compression` and its reversal to `decompression`.

use bytes::Bytes;

use super::compression::compress_message;
use super::context::DeltaContext;
use super::decompression::decompress_block;
use super::dictionary::HeaderDictionary;
use crate::constants::CODEC_DELTA;
use crate::error::{CodecError, ConfigError};
use crate::headers::HeaderMessage;
use crate::traits::{CodecContext, CodecHandler, downcast_context};
use crate::types::Direction;

/// Stateful delta/reference codec.
///
/// Every header whose value repeats the previous message on the same
/// connection and direction is replaced by an entry in a `ref` header.
#[derive(Debug, Clone)]
pub struct DeltaHandler {
    dictionary: HeaderDictionary,
}

impl DeltaHandler {
    /// Creates a handler using the standard dictionary.
    ///
    /// # Errors
    /// - [`ConfigError`] - The standard dictionary failed validation
    pub fn new() -> Result<Self, ConfigError> {
        HeaderDictionary::standard().map(Self::with_dictionary)
    }

    /// Creates a handler using a caller-supplied dictionary.
    pub fn with_dictionary(dictionary: HeaderDictionary) -> Self {
        Self { dictionary }
    }

    /// Dictionary used to tokenize header names.
    pub fn dictionary(&self) -> &HeaderDictionary {
        &self.dictionary
    }
}

impl CodecHandler for DeltaHandler {
    fn name(&self) -> &str {
        CODEC_DELTA
    }

    fn create_context(&self, direction: Direction) -> Box<dyn CodecContext> {
        Box::new(DeltaContext::new(direction))
    }

    fn compress(
        &self,
        context: &mut dyn CodecContext,
        message: &HeaderMessage,
        _host: &str,
    ) -> Result<Bytes, CodecError> {
        let context = downcast_context::<DeltaContext>(context, CODEC_DELTA)?;
        compress_message(context, &self.dictionary, message)
    }

    fn decompress(
        &self,
        context: &mut dyn CodecContext,
        compressed: &[u8],
    ) -> Result<HeaderMessage, CodecError> {
        let context = downcast_context::<DeltaContext>(context, CODEC_DELTA)?;
        decompress_block(context, &self.dictionary, compressed)
    }
}
