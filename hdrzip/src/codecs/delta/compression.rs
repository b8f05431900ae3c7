//! Delta codec compression.

use bytes::Bytes;
use tracing::trace;

use super::constants::{DELTA_DATE_HEADERS, DELTA_REF_HEADER, DELTA_REF_SEPARATOR};
use super::context::DeltaContext;
use super::dates::encode_date;
use super::dictionary::HeaderDictionary;
use crate::error::CodecError;
use crate::headers::{HeaderMessage, is_pseudo_header, strip_hop_by_hop};
use crate::serialization::{LineFormat, write_block};

/// Compresses `message` against the context's last sent message.
///
/// Date headers are sent as hexadecimal epoch seconds and never referenced.
/// Any other header whose value is identical to the previous message on this
/// context is listed in the `ref` header instead of being sent. Everything
/// else goes out under its dictionary token or escaped name.
///
/// # Errors
/// - [`CodecError::MissingPseudoHeader`] - The top line cannot be built
pub(super) fn compress_message(
    context: &mut DeltaContext,
    dictionary: &HeaderDictionary,
    message: &HeaderMessage,
) -> Result<Bytes, CodecError> {
    let mut message = message.clone();
    strip_hop_by_hop(&mut message);

    let mut encoded = HeaderMessage::new();
    let mut references: Vec<String> = Vec::new();
    for (name, value) in message.iter() {
        if is_pseudo_header(name) {
            encoded.insert(name, value);
        } else if DELTA_DATE_HEADERS.contains(&name) {
            let value = encode_date(value).unwrap_or_else(|| value.to_string());
            encoded.insert(dictionary.encode_name(name), value);
        } else if repeats_last_sent(context, name, value) {
            references.push(dictionary.encode_name(name).into_owned());
        } else {
            encoded.insert(dictionary.encode_name(name), value);
        }
    }

    if !references.is_empty() {
        encoded.insert(
            DELTA_REF_HEADER,
            references.join(&DELTA_REF_SEPARATOR.to_string()),
        );
    }

    let block = write_block(&encoded, LineFormat::COMPACT)?;
    trace!(
        direction = %context.direction,
        references = references.len(),
        bytes = block.len(),
        "delta block built"
    );

    context.references_emitted += references.len() as u64;
    context.compressed_count += 1;
    context.last_sent = Some(message);
    Ok(Bytes::from(block))
}

fn repeats_last_sent(context: &DeltaContext, name: &str, value: &str) -> bool {
    context
        .last_sent
        .as_ref()
        .and_then(|last| last.get(name))
        .is_some_and(|last_value| last_value == value)
}
