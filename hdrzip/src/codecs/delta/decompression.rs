//! Delta codec decompression.

use super::constants::{DELTA_DATE_HEADERS, DELTA_REF_HEADER, DELTA_REF_SEPARATOR};
use super::context::DeltaContext;
use super::dates::decode_date;
use super::dictionary::HeaderDictionary;
use crate::error::CodecError;
use crate::headers::{HeaderMessage, is_pseudo_header};
use crate::serialization::{LineFormat, parse_block};

/// Reconstructs a message from a delta block.
///
/// References are resolved against the context's last received message; the
/// reconstruction then replaces it.
///
/// # Errors
/// - [`CodecError::Malformed`] - The block violates the line grammar
/// - [`CodecError::UnknownToken`] - A name is neither escaped nor in the dictionary
/// - [`CodecError::StreamDesync`] - A reference has no previously received value
pub(super) fn decompress_block(
    context: &mut DeltaContext,
    dictionary: &HeaderDictionary,
    block: &[u8],
) -> Result<HeaderMessage, CodecError> {
    let parsed = parse_block(block, LineFormat::COMPACT)?;

    let mut message = HeaderMessage::new();
    for (wire_name, value) in parsed.iter() {
        if wire_name == DELTA_REF_HEADER {
            continue;
        }
        if is_pseudo_header(wire_name) {
            message.insert(wire_name, value);
            continue;
        }
        let name = dictionary.decode_name(wire_name)?;
        let value = if DELTA_DATE_HEADERS.contains(&name.as_str()) {
            decode_date(value).unwrap_or_else(|| value.to_string())
        } else {
            value.to_string()
        };
        message.insert(name, value);
    }

    if let Some(references) = parsed.get(DELTA_REF_HEADER) {
        for reference in references.split(DELTA_REF_SEPARATOR) {
            let name = dictionary.decode_name(reference)?;
            let value = context
                .last_received
                .as_ref()
                .and_then(|last| last.get(&name))
                .ok_or_else(|| CodecError::StreamDesync { name: name.clone() })?;
            message.insert(name, value);
        }
    }

    context.last_received = Some(message.clone());
    Ok(message)
}
