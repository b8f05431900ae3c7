//! The compression engine.
//!
//! This module provides the `CompressionEngine`, which owns every registered
//! codec handler and the simulated connections, and drives each message
//! through the context of every codec on the connection its host resolves to.

use bytes::Bytes;
use tracing::trace;

use crate::connection_manager::{CodecHandlers, Connection, ConnectionManager};
use crate::error::{CodecError, ConfigError, HdrzipError};
use crate::headers::HeaderMessage;
use crate::traits::CodecHandler;
use crate::types::Direction;

/// Output of every codec for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedMessage {
    /// Connection the message was routed to.
    pub connection: String,
    /// Result per codec, in codec name order.
    pub outputs: Vec<(String, Result<Bytes, CodecError>)>,
}

impl CompressedMessage {
    /// Compressed size reported by `codec`, if it succeeded.
    pub fn size_of(&self, codec: &str) -> Option<usize> {
        self.outputs
            .iter()
            .find(|(name, _)| name == codec)
            .and_then(|(_, result)| result.as_ref().ok())
            .map(Bytes::len)
    }
}

/// Central orchestrator of a comparison run.
///
/// ## Usage
///
/// 1. Create an engine with [`CompressionEngine::new`]
/// 2. Register codecs using [`register_codec`]
/// 3. Optionally declare multiplexed connections with [`declare_connection`]
/// 4. Feed messages in order to [`compress`], and [`decompress`] the outputs
///
/// Codecs must be registered before the first connection exists, because a
/// connection creates its contexts once.
///
/// [`register_codec`]: Self::register_codec
/// [`declare_connection`]: Self::declare_connection
/// [`compress`]: Self::compress
/// [`decompress`]: Self::decompress
#[derive(Debug)]
pub struct CompressionEngine {
    /// Registered codec handlers, keyed by codec name.
    handlers: CodecHandlers,
    /// Simulated connections and their per-codec contexts.
    connections: ConnectionManager,
}

impl CompressionEngine {
    /// Creates an engine with no codecs.
    ///
    /// # Parameters
    /// - `domain_multiplex`: Whether connections absorb every host of their
    ///   two-label domain.
    pub fn new(domain_multiplex: bool) -> Self {
        Self {
            handlers: CodecHandlers::new(),
            connections: ConnectionManager::new(domain_multiplex),
        }
    }

    /// Registers a codec handler.
    ///
    /// # Errors
    /// - [`ConfigError::DuplicateCodec`] - A codec with the same name is registered
    pub fn register_codec(&mut self, handler: Box<dyn CodecHandler>) -> Result<(), ConfigError> {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(ConfigError::DuplicateCodec(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Names of registered codecs in sorted order.
    pub fn codec_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// True if `name` is a registered codec.
    pub fn has_codec(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Eagerly creates a connection from a multiplex declaration.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidHostPattern`] - An alternative does not compile
    pub fn declare_connection(&mut self, declaration: &str) -> Result<&Connection, ConfigError> {
        self.connections
            .declare(declaration, &self.handlers)
            .map(|connection| &*connection)
    }

    /// Name of the connection carrying traffic for `host`, creating it if needed.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidHostPattern`] - A new connection for `host` cannot be built
    pub fn resolve_connection(&mut self, host: &str) -> Result<&Connection, ConfigError> {
        self.connections
            .connection_for(host, &self.handlers)
            .map(|connection| &*connection)
    }

    /// Compresses `message` with every registered codec.
    ///
    /// The message is routed by `host`; each codec uses the context of that
    /// connection and `direction`. A failing codec does not stop the others.
    ///
    /// # Parameters
    /// - `direction`: Whether `message` is a request or a response.
    /// - `host`: Host of the request the message belongs to.
    /// - `message`: Headers with hop-by-hop headers already removed.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidHostPattern`] - A new connection for `host` cannot be built
    pub fn compress(
        &mut self,
        direction: Direction,
        host: &str,
        message: &HeaderMessage,
    ) -> Result<CompressedMessage, ConfigError> {
        let connection = self.connections.connection_for(host, &self.handlers)?;
        connection.record_message(direction);

        let mut outputs = Vec::with_capacity(self.handlers.len());
        for (codec, handler) in &self.handlers {
            let result = match connection.context_mut(codec, direction) {
                Some(context) => handler.compress(context, message, host),
                None => Err(CodecError::Internal(format!(
                    "connection '{}' has no context for codec '{codec}'",
                    connection.name()
                ))),
            };
            if let Ok(bytes) = &result {
                trace!(
                    codec = %codec,
                    connection = connection.name(),
                    %direction,
                    payload = %String::from_utf8_lossy(bytes).escape_debug(),
                    "compressed"
                );
            }
            outputs.push((codec.clone(), result));
        }

        Ok(CompressedMessage {
            connection: connection.name().to_string(),
            outputs,
        })
    }

    /// Reconstructs a message from bytes a codec produced on a connection.
    ///
    /// # Parameters
    /// - `direction`: Direction the bytes were compressed in.
    /// - `connection`: Name of the connection they were compressed on.
    /// - `codec`: Codec that produced them.
    /// - `compressed`: The codec's output.
    ///
    /// # Errors
    /// - [`HdrzipError::NotFound`] - Unknown connection or codec
    /// - [`HdrzipError::Codec`] - The codec failed, including
    ///   [`CodecError::DecompressionUnsupported`]
    pub fn decompress(
        &mut self,
        direction: Direction,
        connection: &str,
        codec: &str,
        compressed: &[u8],
    ) -> Result<HeaderMessage, HdrzipError> {
        let handler = self
            .handlers
            .get(codec)
            .ok_or_else(|| HdrzipError::NotFound(format!("codec '{codec}'")))?;
        let context = self
            .connections
            .get_mut(connection)
            .ok_or_else(|| HdrzipError::NotFound(format!("connection '{connection}'")))?
            .context_mut(codec, direction)
            .ok_or_else(|| {
                HdrzipError::NotFound(format!("codec '{codec}' on connection '{connection}'"))
            })?;
        Ok(handler.decompress(context, compressed)?)
    }

    /// Simulated connections created so far.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{DeltaHandler, Http1GzipHandler, Http1Handler};

    fn engine(domain_multiplex: bool) -> CompressionEngine {
        let mut engine = CompressionEngine::new(domain_multiplex);
        engine.register_codec(Box::new(Http1Handler::new())).unwrap();
        engine
            .register_codec(Box::new(Http1GzipHandler::default()))
            .unwrap();
        engine
            .register_codec(Box::new(DeltaHandler::new().unwrap()))
            .unwrap();
        engine
    }

    fn request(host: &str) -> HeaderMessage {
        HeaderMessage::from_pairs([
            (":method", "GET"),
            (":path", "/"),
            (":version", "HTTP/1.1"),
            (":scheme", "http"),
            (":host", host),
            ("user-agent", "bench/1.0"),
        ])
    }

    #[test]
    fn duplicate_codec_registration_fails() {
        let mut engine = engine(true);
        assert_eq!(
            engine.register_codec(Box::new(Http1Handler::new())),
            Err(ConfigError::DuplicateCodec("http1".to_string()))
        );
        assert_eq!(
            engine.codec_names().collect::<Vec<_>>(),
            vec!["delta", "http1", "http1_gzip"]
        );
    }

    #[test]
    fn compress_runs_every_codec_in_name_order() {
        let mut engine = engine(true);
        let message = request("www.example.com");
        let result = engine
            .compress(Direction::Request, "www.example.com", &message)
            .unwrap();
        assert_eq!(result.connection, "www.example.com");
        let names: Vec<_> = result.outputs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["delta", "http1", "http1_gzip"]);
        assert!(result.outputs.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(
            result.size_of("http1"),
            Some(
                crate::serialization::write_block(&message, crate::serialization::LineFormat::HTTP1)
                    .unwrap()
                    .len()
            )
        );
    }

    #[test]
    fn decompress_uses_the_same_connection_context() {
        let mut engine = engine(true);
        for _ in 0..3 {
            let message = request("www.example.com");
            let result = engine
                .compress(Direction::Request, "www.example.com", &message)
                .unwrap();
            for (codec, output) in &result.outputs {
                let bytes = output.as_ref().unwrap();
                match engine.decompress(Direction::Request, &result.connection, codec, bytes) {
                    Ok(reconstructed) => assert_eq!(reconstructed, message),
                    Err(HdrzipError::Codec(CodecError::DecompressionUnsupported { codec })) => {
                        assert_eq!(codec, "http1_gzip")
                    }
                    Err(other) => panic!("unexpected error {other}"),
                }
            }
        }
    }

    #[test]
    fn hosts_on_one_domain_share_delta_state() {
        let mut engine = engine(true);
        engine
            .compress(Direction::Request, "www.example.com", &request("www.example.com"))
            .unwrap();
        let second = engine
            .compress(Direction::Request, "img.example.com", &request("img.example.com"))
            .unwrap();
        assert_eq!(second.connection, "www.example.com");
        assert_eq!(engine.connections().len(), 1);
        assert_eq!(
            engine
                .connections()
                .get("www.example.com")
                .unwrap()
                .message_count(Direction::Request),
            2
        );

        let mut isolated = CompressionEngine::new(false);
        isolated
            .register_codec(Box::new(DeltaHandler::new().unwrap()))
            .unwrap();
        isolated
            .compress(Direction::Request, "www.example.com", &request("www.example.com"))
            .unwrap();
        isolated
            .compress(Direction::Request, "img.example.com", &request("img.example.com"))
            .unwrap();
        assert_eq!(isolated.connections().len(), 2);
    }

    #[test]
    fn directions_keep_separate_state() {
        let mut engine = engine(false);
        engine
            .compress(Direction::Request, "a.test", &request("a.test"))
            .unwrap();
        let connection = engine.connections().get("a.test").unwrap();
        assert_eq!(
            connection
                .context("delta", Direction::Request)
                .unwrap()
                .messages_compressed(),
            1
        );
        assert_eq!(
            connection
                .context("delta", Direction::Response)
                .unwrap()
                .messages_compressed(),
            0
        );
    }

    #[test]
    fn declared_connections_are_created_up_front() {
        let mut engine = engine(true);
        let connection = engine.declare_connection("*.example.com").unwrap();
        assert_eq!(connection.domain_suffixes(), &["example.com"]);
        let routed = engine.resolve_connection("cdn.example.com").unwrap();
        assert_eq!(routed.name(), "*.example.com");
    }

    #[test]
    fn decompress_reports_unknown_names() {
        let mut engine = engine(true);
        assert!(matches!(
            engine.decompress(Direction::Request, "nowhere", "delta", b""),
            Err(HdrzipError::NotFound(_))
        ));
        engine.resolve_connection("a.test").unwrap();
        assert!(matches!(
            engine.decompress(Direction::Request, "a.test", "spdy", b""),
            Err(HdrzipError::NotFound(_))
        ));
    }
}
