//! Benchmark harness comparing HTTP header compression codecs.
//!
//! Captured exchanges are replayed in order through every configured codec
//! of the `hdrzip` crate. The harness verifies reconstructions, aggregates
//! compressed sizes against a baseline codec and renders a summary report
//! plus optional per-message TSV files.

pub mod capture;
pub mod harness;
pub mod report;
pub mod stats;
pub mod tsv;

use hdrzip::codecs::{CodecRegistry, CodecSpec};
use hdrzip::connection_manager::{CodecHandlers, Connection};
use hdrzip::constants::DEFAULT_BASELINE_CODEC;
use hdrzip::{CodecError, CodecHandler, ConfigError};
use thiserror::Error;

pub use capture::{Exchange, parse_har, read_har_file};
pub use harness::{Harness, WorkItem, flatten};
pub use report::Report;

/// Errors that abort a benchmark run.
#[derive(Error, Debug)]
pub enum BenchError {
    /// The run configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A codec failed in a way that invalidates the comparison.
    #[error("Codec '{codec}' failed on connection '{connection}': {source}")]
    Codec {
        codec: String,
        connection: String,
        #[source]
        source: CodecError,
    },

    /// A capture file could not be interpreted.
    #[error("Cannot read capture '{path}': {description}")]
    Capture { path: String, description: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration of a benchmark run.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Codecs to compare; a later spec with the same name replaces an earlier one.
    pub codecs: Vec<CodecSpec>,
    /// Codec whose sizes every ratio is relative to.
    pub baseline: String,
    /// Connection declarations, each `PATTERN[/PATTERN...]`.
    pub multiplex: Vec<String>,
    /// Whether hosts sharing a two-label domain share a connection.
    pub domain_multiplex: bool,
    /// Whether every output is decompressed and compared with its input.
    pub verify: bool,
    /// Whether per-message TSV files are written.
    pub tsv: bool,
    /// Prefix of the TSV file paths.
    pub prefix: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            codecs: vec![CodecSpec::named(DEFAULT_BASELINE_CODEC)],
            baseline: DEFAULT_BASELINE_CODEC.to_string(),
            multiplex: Vec::new(),
            domain_multiplex: true,
            verify: true,
            tsv: false,
            prefix: String::new(),
        }
    }
}

impl BenchConfig {
    /// Adds `spec`, replacing any codec already configured under its name.
    pub fn add_codec(&mut self, spec: CodecSpec) {
        match self.codecs.iter_mut().find(|c| c.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.codecs.push(spec),
        }
    }

    /// Resolves every codec and checks the rest of the configuration.
    ///
    /// # Returns
    /// The codec handlers, in configuration order.
    ///
    /// # Errors
    /// - [`ConfigError::UnknownCodec`] - A codec name is not registered
    /// - [`ConfigError::InvalidCodecParameter`] - A codec rejected its parameters
    /// - [`ConfigError::BaselineNotSelected`] - The baseline is not among the codecs
    /// - [`ConfigError::InvalidHostPattern`] - A multiplex pattern does not compile
    pub fn validate(&self) -> Result<Vec<Box<dyn CodecHandler>>, ConfigError> {
        let registry = CodecRegistry::builtin();
        let handlers = self
            .codecs
            .iter()
            .map(|spec| registry.create(spec))
            .collect::<Result<Vec<_>, _>>()?;

        if !self.codecs.iter().any(|spec| spec.name == self.baseline) {
            return Err(ConfigError::BaselineNotSelected(self.baseline.clone()));
        }

        for declaration in &self.multiplex {
            Connection::new(declaration, &CodecHandlers::new(), self.domain_multiplex)?;
        }
        Ok(handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_http1_baseline() {
        let config = BenchConfig::default();
        let handlers = config.validate().unwrap();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].name(), "http1");
        assert!(config.verify);
        assert!(config.domain_multiplex);
    }

    #[test]
    fn later_codec_spec_replaces_earlier() {
        let mut config = BenchConfig::default();
        config.add_codec("http1_gzip=1".parse().unwrap());
        config.add_codec("http1_gzip=9".parse().unwrap());
        assert_eq!(config.codecs.len(), 2);
        assert_eq!(config.codecs[1].params, vec!["9".to_string()]);
    }

    #[test]
    fn baseline_must_be_selected() {
        let config = BenchConfig {
            baseline: "delta".to_string(),
            ..BenchConfig::default()
        };
        assert_eq!(
            config.validate().err(),
            Some(ConfigError::BaselineNotSelected("delta".to_string()))
        );
    }

    #[test]
    fn unknown_codec_is_rejected() {
        let mut config = BenchConfig::default();
        config.add_codec(CodecSpec::named("brotli"));
        assert_eq!(
            config.validate().err(),
            Some(ConfigError::UnknownCodec("brotli".to_string()))
        );
    }

    #[test]
    fn invalid_multiplex_pattern_is_rejected() {
        let config = BenchConfig {
            multiplex: vec!["www\\.(example".to_string()],
            ..BenchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHostPattern { .. })
        ));
    }
}
