//! The benchmark loop.
//!
//! Messages are processed strictly in capture order. For each message every
//! codec compresses it on the connection its host resolves to; when
//! verification is on, the output is decompressed on the same context pair
//! and compared with the input.

use std::collections::HashSet;

use hdrzip::{
    CodecError, CodecHandler, CompressionEngine, ConfigError, Direction, HdrzipError,
    HeaderMessage, compare_headers, strip_hop_by_hop,
};
use tracing::{debug, info, warn};

use crate::capture::Exchange;
use crate::report::Report;
use crate::stats::Statistics;
use crate::tsv::TsvWriter;
use crate::{BenchConfig, BenchError};

/// One message to process, with the host that routes it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub direction: Direction,
    pub message: HeaderMessage,
    /// Host of the request; a response shares its request's host.
    pub host: String,
}

/// Turns exchanges into a request item followed by its response item.
pub fn flatten(exchanges: impl IntoIterator<Item = Exchange>) -> Vec<WorkItem> {
    let mut items = Vec::new();
    for exchange in exchanges {
        let host = exchange.host().to_string();
        items.push(WorkItem {
            direction: Direction::Request,
            message: exchange.request,
            host: host.clone(),
        });
        items.push(WorkItem {
            direction: Direction::Response,
            message: exchange.response,
            host,
        });
    }
    items
}

/// Drives work items through a [`CompressionEngine`] and aggregates results.
#[derive(Debug)]
pub struct Harness {
    engine: CompressionEngine,
    stats: Statistics,
    tsv: Option<TsvWriter>,
    baseline: String,
    verify: bool,
    /// Codecs already reported as unable to decompress.
    warned: HashSet<String>,
    mismatches: u64,
}

impl Harness {
    /// Builds a harness from a validated configuration.
    ///
    /// Codecs are registered and multiplex connections declared before any
    /// message is processed.
    ///
    /// # Errors
    /// - [`BenchError::Config`] - The configuration does not validate
    pub fn new(config: &BenchConfig) -> Result<Self, BenchError> {
        let handlers = config.validate()?;
        Self::with_handlers(config, handlers)
    }

    /// Builds a harness around already constructed codec handlers.
    ///
    /// `config.codecs` is ignored; the rest of the configuration applies.
    ///
    /// # Errors
    /// - [`BenchError::Config`] - Two handlers share a name, the baseline is not
    ///   among them, or a multiplex declaration does not compile
    pub fn with_handlers(
        config: &BenchConfig,
        handlers: Vec<Box<dyn CodecHandler>>,
    ) -> Result<Self, BenchError> {
        let mut engine = CompressionEngine::new(config.domain_multiplex);
        for handler in handlers {
            engine.register_codec(handler)?;
        }
        if !engine.has_codec(&config.baseline) {
            return Err(ConfigError::BaselineNotSelected(config.baseline.clone()).into());
        }
        for declaration in &config.multiplex {
            engine.declare_connection(declaration)?;
        }

        let tsv = config
            .tsv
            .then(|| TsvWriter::new(engine.codec_names().map(str::to_string).collect()));
        info!(
            codecs = ?engine.codec_names().collect::<Vec<_>>(),
            baseline = %config.baseline,
            "harness ready"
        );

        Ok(Self {
            engine,
            stats: Statistics::new(),
            tsv,
            baseline: config.baseline.clone(),
            verify: config.verify,
            warned: HashSet::new(),
            mismatches: 0,
        })
    }

    /// Processes one message with every codec.
    ///
    /// # Errors
    /// - [`BenchError::Codec`] - A codec failed to compress, or failed to
    ///   decompress for a reason other than lacking support
    /// - [`BenchError::Config`] - A connection for the host cannot be built
    pub fn process_message(&mut self, item: &WorkItem) -> Result<(), BenchError> {
        let mut message = item.message.clone();
        strip_hop_by_hop(&mut message);

        let result = self.engine.compress(item.direction, &item.host, &message)?;
        let baseline_size = result.size_of(&self.baseline).unwrap_or(0);
        self.stats.count_message(item.direction);

        let mut sizes = Vec::with_capacity(result.outputs.len());
        let mut table = Vec::with_capacity(result.outputs.len());
        for (codec, output) in &result.outputs {
            let bytes = output.clone().map_err(|source| BenchError::Codec {
                codec: codec.clone(),
                connection: result.connection.clone(),
                source,
            })?;
            if self.verify {
                self.verify_output(item.direction, &result.connection, codec, &bytes, &message)?;
            }

            let size = bytes.len();
            let ratio = (baseline_size > 0).then(|| size as f64 / baseline_size as f64);
            self.stats.record(item.direction, codec, size, ratio);
            sizes.push(size);
            table.push(format!(
                "  {codec:>12} {size:>8} {:>6}",
                ratio.map_or_else(|| "-".to_string(), |r| format!("{r:.2}"))
            ));
        }

        if let Some(tsv) = self.tsv.as_mut() {
            tsv.record(item.direction, &sizes, &result.connection);
        }
        debug!(
            direction = %item.direction,
            host = %item.host,
            connection = %result.connection,
            "message processed:\n{}",
            table.join("\n")
        );
        Ok(())
    }

    fn verify_output(
        &mut self,
        direction: Direction,
        connection: &str,
        codec: &str,
        bytes: &[u8],
        original: &HeaderMessage,
    ) -> Result<(), BenchError> {
        match self.engine.decompress(direction, connection, codec, bytes) {
            Ok(reconstructed) => {
                let diffs = compare_headers(original, &reconstructed);
                if !diffs.is_empty() {
                    let details: Vec<String> = diffs.iter().map(ToString::to_string).collect();
                    warn!(
                        %connection,
                        %direction,
                        "*** COMPRESSION ERROR in {codec}\n{}",
                        details.join("\n")
                    );
                    self.mismatches += 1;
                }
                Ok(())
            }
            Err(HdrzipError::Codec(CodecError::DecompressionUnsupported { .. })) => {
                if self.warned.insert(codec.to_string()) {
                    warn!("{codec} decompression not checked.");
                }
                Ok(())
            }
            Err(HdrzipError::Codec(source)) => Err(BenchError::Codec {
                codec: codec.to_string(),
                connection: connection.to_string(),
                source,
            }),
            Err(other) => Err(BenchError::Codec {
                codec: codec.to_string(),
                connection: connection.to_string(),
                source: CodecError::Internal(other.to_string()),
            }),
        }
    }

    /// Processes every item in order and builds the report.
    ///
    /// # Errors
    /// Stops at the first error of [`Harness::process_message`].
    pub fn run(&mut self, items: &[WorkItem]) -> Result<Report, BenchError> {
        if items.is_empty() {
            warn!("Nothing to process.");
            return Ok(Report::empty());
        }
        for item in items {
            self.process_message(item)?;
        }
        info!(
            messages = items.len(),
            mismatches = self.mismatches,
            "run complete"
        );
        Ok(self.report())
    }

    /// Report of everything processed so far.
    pub fn report(&self) -> Report {
        Report::new(
            &self.stats,
            &self.baseline,
            self.engine.connections().len(),
            self.mismatches,
        )
    }

    /// Writes the TSV files, if TSV output is enabled.
    ///
    /// # Errors
    /// - [`BenchError::Io`] - A file could not be written
    pub fn write_tsv(&self, prefix: &str) -> Result<(), BenchError> {
        if let Some(tsv) = &self.tsv {
            tsv.write_files(prefix)?;
        }
        Ok(())
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn tsv(&self) -> Option<&TsvWriter> {
        self.tsv.as_ref()
    }

    /// Messages whose reconstruction differed from the input.
    pub fn mismatches(&self) -> u64 {
        self.mismatches
    }

    /// Codecs that were reported as unable to decompress.
    pub fn unverified_codecs(&self) -> impl Iterator<Item = &str> {
        self.warned.iter().map(String::as_str)
    }

    pub fn engine(&self) -> &CompressionEngine {
        &self.engine
    }
}
