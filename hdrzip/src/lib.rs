//! `hdrzip`: HTTP header compression codecs and a harness-ready engine to compare them.
//!
//! This library models HTTP/1 request and response headers, defines a codec
//! contract, and replays messages through any number of codecs side by side,
//! each with its own state per simulated connection and direction.
//! The primary entry point for using the library is the [`CompressionEngine`].
//!
//! ## Core Concepts
//!
//! - **[`HeaderMessage`]**: Lowercase header names mapped to values, with
//!   pseudo-headers (`:method`, `:status`, ...) carrying the top line.
//! - **Codecs**: Implementations of [`CodecHandler`]. The crate ships `http1`
//!   (the uncompressed baseline), `http1_gzip` and the stateful `delta` codec.
//! - **Contexts**: State kept for each (connection, codec, direction). Managed
//!   internally by the [`CompressionEngine`] and [`ConnectionManager`].
//! - **Connections**: Hosts are multiplexed onto simulated persistent
//!   connections by name, patterns or shared domain.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdrzip::codecs::{CodecRegistry, CodecSpec};
//! use hdrzip::{CompressionEngine, Direction, HeaderMessage};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = CodecRegistry::builtin();
//!     let mut engine = CompressionEngine::new(true);
//!     engine.register_codec(registry.create(&CodecSpec::named("http1"))?)?;
//!     engine.register_codec(registry.create(&"delta".parse::<CodecSpec>()?)?)?;
//!
//!     let request = HeaderMessage::from_pairs([
//!         (":method", "GET"),
//!         (":path", "/index.html"),
//!         (":version", "HTTP/1.1"),
//!         (":host", "www.example.com"),
//!         ("user-agent", "hdrzip-doc"),
//!     ]);
//!
//!     for _ in 0..2 {
//!         let result = engine.compress(Direction::Request, "www.example.com", &request)?;
//!         let baseline = result.size_of("http1").unwrap_or_default();
//!         let delta = result.size_of("delta").unwrap_or_default();
//!         println!("delta: {delta} bytes, http1: {baseline} bytes");
//!
//!         for (codec, output) in &result.outputs {
//!             let bytes = output.clone()?;
//!             let reconstructed =
//!                 engine.decompress(Direction::Request, &result.connection, codec, &bytes)?;
//!             assert_eq!(reconstructed, request);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! [`ConnectionManager`]: crate::connection_manager::ConnectionManager

pub mod codecs;
pub mod connection_manager;
pub mod constants;
pub mod engine;
pub mod error;
pub mod headers;
pub mod serialization;
pub mod traits;
pub mod types;

pub use engine::{CompressedMessage, CompressionEngine};
pub use error::{CodecError, ConfigError, HdrzipError};
pub use headers::{HeaderDiff, HeaderMessage, compare_headers, strip_hop_by_hop};
pub use traits::{CodecContext, CodecHandler};
pub use types::{Direction, PerDirection};
