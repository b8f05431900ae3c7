//! Line-oriented header block serialization.
//!
//! Contains the writer and tokenizer for the HTTP/1 style header block shared
//! by the baseline codec and the delta codec. Only the line delimiter and the
//! name/value separator differ between them.

pub mod http1;

pub use http1::{LineFormat, TopLine, parse_block, write_block};
