//! hdrzip-bench CLI.
//!
//! Replays HAR captures through the selected header compression codecs and
//! prints a comparison against the baseline codec.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hdrzip::codecs::CodecSpec;
use hdrzip_bench::{BenchConfig, BenchError, Harness, Report, flatten, read_har_file};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP header compression comparison bench", long_about = None)]
struct CliArgs {
    /// Verbosity: 0 warnings, 1 progress, 2 per-message tables, 3 compressed payloads.
    #[arg(short, long, default_value_t = 0)]
    verbose: u8,

    /// Codec to compare, as NAME or NAME=PARAM[,PARAM]. Repeatable; http1 is always included.
    #[arg(short, long = "codec", value_name = "NAME[=PARAMS]")]
    codecs: Vec<CodecSpec>,

    /// Codec every ratio is relative to.
    #[arg(short, long, default_value = "http1")]
    baseline: String,

    /// Hosts sharing one connection, as PATTERN[/PATTERN]. Repeatable.
    #[arg(short, long, value_name = "PATTERN")]
    multiplex: Vec<String>,

    /// Do not share connections between hosts of the same domain.
    #[arg(short, long)]
    no_domain_multiplex: bool,

    /// Write per-message sizes to {prefix}req.tsv and {prefix}res.tsv.
    #[arg(short, long)]
    tsv: bool,

    /// Prefix of the TSV file paths.
    #[arg(long, default_value = "")]
    prefix: String,

    /// Skip decompressing and comparing every output.
    #[arg(long)]
    no_verify: bool,

    /// HAR files to replay, in order.
    files: Vec<PathBuf>,
}

impl From<&CliArgs> for BenchConfig {
    fn from(args: &CliArgs) -> Self {
        let mut config = BenchConfig {
            baseline: args.baseline.clone(),
            multiplex: args.multiplex.clone(),
            domain_multiplex: !args.no_domain_multiplex,
            verify: !args.no_verify,
            tsv: args.tsv,
            prefix: args.prefix.clone(),
            ..BenchConfig::default()
        };
        for spec in &args.codecs {
            config.add_codec(spec.clone());
        }
        config
    }
}

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &CliArgs) -> Result<Report, BenchError> {
    let config = BenchConfig::from(args);
    let mut harness = Harness::new(&config)?;

    let mut exchanges = Vec::new();
    for path in &args.files {
        exchanges.extend(read_har_file(path)?);
    }
    let report = harness.run(&flatten(exchanges))?;
    if config.tsv {
        harness.write_tsv(&config.prefix)?;
    }
    Ok(report)
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeatable_options() {
        let args = CliArgs::parse_from([
            "hdrzip-bench",
            "-c",
            "delta",
            "--codec",
            "http1_gzip=9",
            "-m",
            "*.example.com/example.org",
            "-n",
            "-v",
            "2",
            "capture.har",
        ]);
        let config = BenchConfig::from(&args);
        let names: Vec<&str> = config.codecs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["http1", "delta", "http1_gzip"]);
        assert_eq!(config.codecs[2].params, ["9"]);
        assert_eq!(config.multiplex, ["*.example.com/example.org"]);
        assert!(!config.domain_multiplex);
        assert!(config.verify);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.files, [PathBuf::from("capture.har")]);
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(7), "trace");
    }
}
