//! Built-in codecs and the registry that instantiates them by name.
//!
//! A codec is selected with a spec string of the form `name` or
//! `name=p1,p2`; the parameter list may be wrapped in double quotes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{CODEC_DELTA, CODEC_HTTP1, CODEC_HTTP1_GZIP};
use crate::error::ConfigError;
use crate::traits::CodecHandler;

pub mod delta;
pub mod http1;
pub mod http1_gzip;

pub use self::delta::DeltaHandler;
pub use self::http1::{Http1Handler, StatelessContext};
pub use self::http1_gzip::Http1GzipHandler;

/// A codec name plus the parameters it should be built with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodecSpec {
    /// Registered codec name.
    pub name: String,
    /// Trimmed parameters, in the order given.
    pub params: Vec<String>,
}

impl CodecSpec {
    /// A spec without parameters.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }
}

impl FromStr for CodecSpec {
    type Err = ConfigError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (name, params) = match spec.split_once('=') {
            Some((name, raw)) => {
                let raw = raw
                    .strip_prefix('"')
                    .and_then(|inner| inner.strip_suffix('"'))
                    .unwrap_or(raw);
                let params = raw.split(',').map(|p| p.trim().to_string()).collect();
                (name.trim(), params)
            }
            None => (spec.trim(), Vec::new()),
        };
        if name.is_empty() {
            return Err(ConfigError::UnknownCodec(spec.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            params,
        })
    }
}

impl fmt::Display for CodecSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            write!(f, "={}", self.params.join(","))?;
        }
        Ok(())
    }
}

/// Builds a handler from its parameters.
pub type CodecFactory = fn(&[String]) -> Result<Box<dyn CodecHandler>, ConfigError>;

/// Name-to-factory table resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct CodecRegistry {
    factories: BTreeMap<String, CodecFactory>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `http1`, `http1_gzip` and `delta`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(CODEC_HTTP1.to_string(), http1_factory);
        registry
            .factories
            .insert(CODEC_HTTP1_GZIP.to_string(), http1_gzip_factory);
        registry.factories.insert(CODEC_DELTA.to_string(), delta_factory);
        registry
    }

    /// Adds a factory under `name`.
    ///
    /// # Errors
    /// - [`ConfigError::DuplicateCodec`] - `name` is already registered
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: CodecFactory,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(ConfigError::DuplicateCodec(name));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Instantiates the codec described by `spec`.
    ///
    /// # Errors
    /// - [`ConfigError::UnknownCodec`] - No factory is registered under the name
    /// - [`ConfigError::InvalidCodecParameter`] - The factory rejected the parameters
    pub fn create(&self, spec: &CodecSpec) -> Result<Box<dyn CodecHandler>, ConfigError> {
        let factory = self
            .factories
            .get(&spec.name)
            .ok_or_else(|| ConfigError::UnknownCodec(spec.name.clone()))?;
        factory(&spec.params)
    }

    /// True if a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

fn reject_params(codec: &str, params: &[String]) -> Result<(), ConfigError> {
    match params.first() {
        None => Ok(()),
        Some(param) => Err(ConfigError::InvalidCodecParameter {
            codec: codec.to_string(),
            parameter: param.clone(),
            description: "codec takes no parameters".to_string(),
        }),
    }
}

fn http1_factory(params: &[String]) -> Result<Box<dyn CodecHandler>, ConfigError> {
    reject_params(CODEC_HTTP1, params)?;
    Ok(Box::new(Http1Handler::new()))
}

fn http1_gzip_factory(params: &[String]) -> Result<Box<dyn CodecHandler>, ConfigError> {
    Ok(Box::new(Http1GzipHandler::from_params(params)?))
}

fn delta_factory(params: &[String]) -> Result<Box<dyn CodecHandler>, ConfigError> {
    reject_params(CODEC_DELTA, params)?;
    Ok(Box::new(DeltaHandler::new()?))
}
