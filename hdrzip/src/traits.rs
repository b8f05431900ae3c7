//! Core codec traits.
//!
//! A codec is split into a stateless [`CodecHandler`], registered once per run,
//! and a [`CodecContext`] holding the state of one (connection, direction)
//! pair. The engine owns the contexts and hands them to the handler for every
//! message, so any number of competing codecs can be driven side by side.

use std::any::Any;
use std::fmt::Debug;

use bytes::Bytes;

use crate::error::CodecError;
use crate::headers::HeaderMessage;
use crate::types::Direction;

/// State of one codec on one simulated connection, for one direction.
pub trait CodecContext: Debug {
    /// Name of the codec this context belongs to.
    fn codec_name(&self) -> &str;
    /// Direction of the messages this context sees.
    fn direction(&self) -> Direction;
    /// Number of messages compressed through this context so far.
    fn messages_compressed(&self) -> u64;
    /// Provides a reference to the context as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Provides a mutable reference to the context as `&mut dyn Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A header compression strategy.
pub trait CodecHandler: Debug {
    /// Unique name under which the codec is selected and reported.
    fn name(&self) -> &str;

    /// Creates fresh state for one direction of a new connection.
    fn create_context(&self, direction: Direction) -> Box<dyn CodecContext>;

    /// Compresses `message`, updating `context`.
    ///
    /// # Parameters
    /// - `context`: State for the message's connection and direction.
    /// - `message`: Headers to compress; hop-by-hop headers already stripped.
    /// - `host`: Host of the request the message belongs to.
    ///
    /// # Returns
    /// The compressed representation. Its length is what gets compared.
    ///
    /// # Errors
    /// - [`CodecError`] - The message cannot be represented by this codec
    fn compress(
        &self,
        context: &mut dyn CodecContext,
        message: &HeaderMessage,
        host: &str,
    ) -> Result<Bytes, CodecError>;

    /// Reconstructs a message from bytes produced by [`compress`](Self::compress)
    /// on the peer context.
    ///
    /// The default implementation reports that decompression is unsupported,
    /// which makes callers skip verification for this codec.
    ///
    /// # Errors
    /// - [`CodecError::DecompressionUnsupported`] - The codec cannot decompress
    /// - [`CodecError::StreamDesync`] - The stream references unseen state
    /// - [`CodecError::Malformed`] - The bytes do not follow the codec's grammar
    fn decompress(
        &self,
        context: &mut dyn CodecContext,
        compressed: &[u8],
    ) -> Result<HeaderMessage, CodecError> {
        let _ = (context, compressed);
        Err(CodecError::DecompressionUnsupported {
            codec: self.name().to_string(),
        })
    }
}

/// Downcasts a context to the concrete type a handler expects.
///
/// # Errors
/// - [`CodecError::Internal`] - The context was created by another codec
pub fn downcast_context<'a, T: 'static>(
    context: &'a mut dyn CodecContext,
    codec: &str,
) -> Result<&'a mut T, CodecError> {
    let owner = context.codec_name().to_string();
    context.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
        CodecError::Internal(format!(
            "{codec}: context belongs to codec '{owner}', not '{codec}'"
        ))
    })
}
