//! Per-connection, per-direction state of the delta codec.

use std::any::Any;

use crate::constants::CODEC_DELTA;
use crate::headers::HeaderMessage;
use crate::traits::CodecContext;
use crate::types::Direction;

/// Delta codec state for one (connection, direction) pair.
///
/// Both sides of the simulated link live here: `last_sent` is what the
/// compressor diffs against, `last_received` is what the decompressor resolves
/// references from. Each always holds the most recent message processed on
/// this pair, in input order.
#[derive(Debug, Clone)]
pub struct DeltaContext {
    /// Direction of the messages flowing through this context.
    pub direction: Direction,
    /// Last message compressed, after hop-by-hop stripping and before tokenizing.
    pub last_sent: Option<HeaderMessage>,
    /// Last message fully reconstructed by the decompressor.
    pub last_received: Option<HeaderMessage>,
    /// Messages compressed so far.
    pub compressed_count: u64,
    /// References emitted so far, across all messages.
    pub references_emitted: u64,
}

impl DeltaContext {
    /// Creates an empty context: the first message has nothing to diff against.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            last_sent: None,
            last_received: None,
            compressed_count: 0,
            references_emitted: 0,
        }
    }
}

impl CodecContext for DeltaContext {
    fn codec_name(&self) -> &str {
        CODEC_DELTA
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
