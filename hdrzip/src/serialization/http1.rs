//! HTTP/1 style header block writer and tokenizer.
//!
//! Block grammar, with `DELIM` and `SEP` taken from a [`LineFormat`]:
//!
//! ```text
//! block    = top-line DELIM *( field DELIM ) DELIM
//! top-line = METHOD " " PATH " " VERSION | VERSION " " STATUS " " STATUS-TEXT
//! field    = name SEP value | ":" name SEP value
//! ```
//!
//! `:host` travels as a plain `host` field. Other pseudo-headers that are not
//! part of the top line keep their `:` marker. A packed multi-value entry is
//! written as one field per occurrence and joined again when parsed.

use crate::constants::{
    HOST_HEADER, HTTP_VERSION_PREFIX, HTTP1_LINE_DELIMITER, HTTP1_VALUE_SEPARATOR,
    MULTI_VALUE_SEPARATOR, PSEUDO_HEADER_PREFIX, PSEUDO_HOST, PSEUDO_METHOD, PSEUDO_PATH,
    PSEUDO_STATUS, PSEUDO_STATUS_TEXT, PSEUDO_VERSION, REQUEST_TOP_LINE, RESPONSE_TOP_LINE,
};
use crate::error::CodecError;
use crate::headers::HeaderMessage;

/// Delimiters of one line-oriented block format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFormat {
    /// Terminates every line, including the final empty one.
    pub delimiter: &'static str,
    /// Written between a field name and its value.
    pub value_separator: &'static str,
}

impl LineFormat {
    /// Literal HTTP/1 wire syntax: `\r\n` lines, `": "` separator.
    pub const HTTP1: LineFormat = LineFormat {
        delimiter: HTTP1_LINE_DELIMITER,
        value_separator: HTTP1_VALUE_SEPARATOR,
    };

    /// Compact syntax: `\n` lines, `:` separator with no space.
    pub const COMPACT: LineFormat = LineFormat {
        delimiter: "\n",
        value_separator: ":",
    };
}

/// First line of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLine<'a> {
    /// `METHOD PATH VERSION`
    Request {
        method: &'a str,
        path: &'a str,
        version: &'a str,
    },
    /// `VERSION STATUS STATUS-TEXT`
    Response {
        version: &'a str,
        status: &'a str,
        status_text: &'a str,
    },
}

impl TopLine<'_> {
    fn is_request(&self) -> bool {
        matches!(self, TopLine::Request { .. })
    }

    fn into_pseudo_headers(self, message: &mut HeaderMessage) {
        match self {
            TopLine::Request {
                method,
                path,
                version,
            } => {
                message.insert(PSEUDO_METHOD, method);
                message.insert(PSEUDO_PATH, path);
                message.insert(PSEUDO_VERSION, version);
            }
            TopLine::Response {
                version,
                status,
                status_text,
            } => {
                message.insert(PSEUDO_VERSION, version);
                message.insert(PSEUDO_STATUS, status);
                message.insert(PSEUDO_STATUS_TEXT, status_text);
            }
        }
    }
}

/// Serializes `message` as a block in the given format.
///
/// Field names are written as they appear in `message`, so callers that
/// tokenize names do so before calling this.
///
/// # Errors
/// - [`CodecError::MissingPseudoHeader`] - A top-line pseudo-header is absent
pub fn write_block(message: &HeaderMessage, format: LineFormat) -> Result<String, CodecError> {
    let is_request = message.contains(PSEUDO_METHOD);
    let top_line_names: &[&str] = if is_request {
        &REQUEST_TOP_LINE
    } else {
        &RESPONSE_TOP_LINE
    };

    let mut out = String::with_capacity(256);
    for (index, name) in top_line_names.iter().enumerate() {
        let value = match (message.get(name), *name) {
            (Some(value), _) => value,
            (None, PSEUDO_STATUS_TEXT) => "",
            (None, _) => {
                return Err(CodecError::MissingPseudoHeader {
                    name: name.to_string(),
                });
            }
        };
        if index > 0 {
            out.push(' ');
        }
        out.push_str(value);
    }
    out.push_str(format.delimiter);

    for (name, value) in message.iter() {
        if top_line_names.contains(&name) {
            continue;
        }
        let wire_name = if name == PSEUDO_HOST {
            HOST_HEADER
        } else {
            name
        };
        for occurrence in value.split(MULTI_VALUE_SEPARATOR) {
            out.push_str(wire_name);
            out.push_str(format.value_separator);
            out.push_str(occurrence);
            out.push_str(format.delimiter);
        }
    }
    out.push_str(format.delimiter);
    Ok(out)
}

/// Parses a block produced by [`write_block`].
///
/// Field names are lowercased and values trimmed; repeated names are packed
/// with [`MULTI_VALUE_SEPARATOR`]. In a request block `host` becomes `:host`.
///
/// # Errors
/// - [`CodecError::Malformed`] - Invalid UTF-8, a bad top line, a field without a
///   separator, a missing terminating empty line, or data after it
pub fn parse_block(block: &[u8], format: LineFormat) -> Result<HeaderMessage, CodecError> {
    let text = std::str::from_utf8(block).map_err(|e| CodecError::Malformed {
        line: 0,
        description: format!("not UTF-8: {e}"),
    })?;
    let mut lines = Lines::new(text, format.delimiter);

    let (_, first) = lines.next_line()?;
    let top_line = parse_top_line(first)?;
    let is_request = top_line.is_request();

    let mut message = HeaderMessage::new();
    loop {
        let (number, line) = lines.next_line()?;
        if line.is_empty() {
            break;
        }
        let (name, value) = split_field(line).ok_or_else(|| CodecError::Malformed {
            line: number,
            description: format!("field without separator: {line:?}"),
        })?;
        let name = name.to_ascii_lowercase();
        let name = if is_request && name == HOST_HEADER {
            PSEUDO_HOST.to_string()
        } else {
            name
        };
        message.append(name, value.trim());
    }
    if !lines.rest().is_empty() {
        return Err(CodecError::Malformed {
            line: lines.line_number + 1,
            description: "data after the terminating empty line".to_string(),
        });
    }

    top_line.into_pseudo_headers(&mut message);
    Ok(message)
}

fn parse_top_line(line: &str) -> Result<TopLine<'_>, CodecError> {
    let mut parts = line.splitn(3, ' ');
    let (Some(first), Some(second), Some(third)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(CodecError::Malformed {
            line: 1,
            description: format!("top line needs three fields: {line:?}"),
        });
    };
    if first.is_empty() || second.is_empty() {
        return Err(CodecError::Malformed {
            line: 1,
            description: format!("empty top line field: {line:?}"),
        });
    }
    if first.starts_with(HTTP_VERSION_PREFIX) {
        Ok(TopLine::Response {
            version: first,
            status: second,
            status_text: third,
        })
    } else {
        Ok(TopLine::Request {
            method: first,
            path: second,
            version: third,
        })
    }
}

/// Splits `name:value`, skipping the leading `:` of a pseudo-header name.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let search_from = usize::from(line.starts_with(PSEUDO_HEADER_PREFIX));
    let colon = line[search_from..].find(':')? + search_from;
    let name = &line[..colon];
    if name.len() == search_from {
        return None;
    }
    Some((name, &line[colon + 1..]))
}

/// Delimiter-driven line cursor that tracks line numbers for diagnostics.
struct Lines<'a> {
    remaining: &'a str,
    delimiter: &'a str,
    line_number: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str, delimiter: &'a str) -> Self {
        Self {
            remaining: text,
            delimiter,
            line_number: 0,
        }
    }

    fn next_line(&mut self) -> Result<(usize, &'a str), CodecError> {
        self.line_number += 1;
        let end = self
            .remaining
            .find(self.delimiter)
            .ok_or_else(|| CodecError::Malformed {
                line: self.line_number,
                description: "unterminated line".to_string(),
            })?;
        let line = &self.remaining[..end];
        self.remaining = &self.remaining[end + self.delimiter.len()..];
        Ok((self.line_number, line))
    }

    fn rest(&self) -> &'a str {
        self.remaining
    }
}
