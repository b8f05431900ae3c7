//! Common test utilities for hdrzip integration tests.
//!
//! Builders for realistic request/response messages and engines with the
//! built-in codecs registered.

#![allow(dead_code)]

use hdrzip::codecs::{CodecRegistry, CodecSpec};
use hdrzip::{CompressionEngine, HeaderMessage};

/// Browser-like GET request for `path` on `host`.
pub fn create_request(host: &str, path: &str) -> HeaderMessage {
    HeaderMessage::from_pairs([
        (":method", "GET"),
        (":path", path),
        (":version", "HTTP/1.1"),
        (":scheme", "https"),
        (":host", host),
        ("accept", "text/html,application/xhtml+xml"),
        ("accept-encoding", "gzip, deflate"),
        ("accept-language", "en-US,en;q=0.8"),
        ("user-agent", "Mozilla/5.0 (X11; Linux x86_64) hdrzip-tests"),
        ("cookie", "session=abc123; theme=dark"),
        ("connection", "keep-alive"),
    ])
}

/// Typical `200 OK` response carrying a body of `length` bytes.
pub fn create_response(length: usize) -> HeaderMessage {
    HeaderMessage::from_pairs([
        (":version", "HTTP/1.1"),
        (":status", "200"),
        (":status-text", "OK"),
        ("content-type", "text/html; charset=utf-8"),
        ("content-length", length.to_string().as_str()),
        ("date", "Sun, 06 Nov 1994 08:49:37 GMT"),
        ("last-modified", "Sat, 05 Nov 1994 10:00:00 GMT"),
        ("server", "nginx/1.25"),
        ("cache-control", "max-age=3600"),
        ("x-powered-by", "hdrzip"),
    ])
}

/// Engine with the named built-in codecs registered.
pub fn create_engine(codecs: &[&str], domain_multiplex: bool) -> CompressionEngine {
    let registry = CodecRegistry::builtin();
    let mut engine = CompressionEngine::new(domain_multiplex);
    for name in codecs {
        let handler = registry
            .create(&CodecSpec::named(*name))
            .expect("built-in codec");
        engine.register_codec(handler).expect("unique codec");
    }
    engine
}

/// `message` as the harness hands it to the codecs.
pub fn stripped(message: &HeaderMessage) -> HeaderMessage {
    let mut message = message.clone();
    hdrzip::strip_hop_by_hop(&mut message);
    message
}
