//! Stateful delta/reference header codec.
//!
//! Each (connection, direction) pair remembers the last message it carried.
//! A header that repeats with an identical value is sent as a reference
//! instead of a literal; common names travel as short dictionary tokens and
//! HTTP dates as hexadecimal epoch seconds.
//!
//! Key components:
//! - `handler`: Implements the `CodecHandler` trait for the delta codec.
//! - `context`: Defines `DeltaContext`, holding `last_sent` and `last_received`.
//! - `dictionary`: The validated name-to-token bijection.
//! - `dates`: HTTP date parsing and hexadecimal encoding.
//! - `constants`: Dictionary table, date headers and wire markers.

mod compression;
pub mod constants;
pub mod context;
pub mod dates;
mod decompression;
pub mod dictionary;
pub mod handler;


pub use self::context::DeltaContext;
pub use self::dictionary::HeaderDictionary;
pub use self::handler::DeltaHandler;
