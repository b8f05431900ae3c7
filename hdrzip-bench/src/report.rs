//! Summary report printed at the end of a run.

use std::fmt;

use hdrzip::Direction;
use serde::Serialize;

use crate::stats::{CodecSummary, Statistics};

/// Width of the compressed-size column.
const SIZE_WIDTH: usize = 13;

/// Results of one direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionReport {
    pub direction: Direction,
    pub messages: u64,
    /// One row per codec, sorted by codec name.
    pub codecs: Vec<CodecSummary>,
}

/// Results of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Connections simulated during the run.
    pub connections: usize,
    /// Requests first, then responses.
    pub directions: Vec<DirectionReport>,
    /// Messages whose reconstruction differed from the original.
    pub mismatches: u64,
}

impl Report {
    /// Builds the report from accumulated statistics.
    pub fn new(stats: &Statistics, baseline: &str, connections: usize, mismatches: u64) -> Self {
        let directions = Direction::ALL
            .into_iter()
            .map(|direction| DirectionReport {
                direction,
                messages: stats.direction(direction).messages,
                codecs: stats.summarize(direction, baseline),
            })
            .collect();
        Self {
            connections,
            directions,
            mismatches,
        }
    }

    /// Report of a run that processed nothing.
    pub fn empty() -> Self {
        Self::new(&Statistics::new(), "", 0, 0)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} connections simulated to different hosts",
            self.connections
        )?;
        let name_width = self
            .directions
            .iter()
            .flat_map(|d| d.codecs.iter())
            .map(|c| c.codec.len())
            .max()
            .unwrap_or(0);

        for section in &self.directions {
            writeln!(
                f,
                "{} {} messages processed",
                section.messages, section.direction
            )?;
            writeln!(
                f,
                "{:name_width$}        compressed | ratio min   max   std",
                ""
            )?;
            for row in &section.codecs {
                writeln!(
                    f,
                    "{} {:>name_width$} {:>size_width$} | {:.2}  {:.2}  {:.2}  {:.2}",
                    section.direction,
                    row.codec,
                    row.compressed,
                    row.ratio,
                    row.min_ratio,
                    row.max_ratio,
                    row.std_dev,
                    size_width = SIZE_WIDTH,
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
