//! Per-codec aggregation of compressed sizes and ratios.

use std::collections::BTreeMap;

use hdrzip::{Direction, PerDirection};
use serde::Serialize;

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); `0.0` below two samples.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Running totals of one codec in one direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    /// Sum of compressed sizes.
    pub size: u64,
    /// Per-message ratios, in processing order.
    pub ratios: Vec<f64>,
    min_ratio: Option<f64>,
    max_ratio: Option<f64>,
}

impl Accumulator {
    /// Adds one message. `ratio` is `None` when the baseline produced zero bytes.
    pub fn record(&mut self, size: usize, ratio: Option<f64>) {
        self.size += size as u64;
        if let Some(ratio) = ratio {
            self.min_ratio = Some(self.min_ratio.map_or(ratio, |min| min.min(ratio)));
            self.max_ratio = Some(self.max_ratio.map_or(ratio, |max| max.max(ratio)));
            self.ratios.push(ratio);
        }
    }

    /// Smallest per-message ratio seen.
    pub fn min_ratio(&self) -> Option<f64> {
        self.min_ratio
    }

    /// Largest per-message ratio seen.
    pub fn max_ratio(&self) -> Option<f64> {
        self.max_ratio
    }

    /// Final figures, given the baseline's cumulative size in the same direction.
    pub fn summarize(&self, codec: &str, baseline_size: u64) -> CodecSummary {
        CodecSummary {
            codec: codec.to_string(),
            compressed: self.size,
            ratio: if baseline_size == 0 {
                0.0
            } else {
                self.size as f64 / baseline_size as f64
            },
            min_ratio: self.min_ratio.unwrap_or(0.0),
            max_ratio: self.max_ratio.unwrap_or(0.0),
            mean_ratio: mean(&self.ratios),
            std_dev: sample_std_dev(&self.ratios),
        }
    }
}

/// Final figures of one codec in one direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodecSummary {
    pub codec: String,
    /// Cumulative compressed bytes.
    pub compressed: u64,
    /// Cumulative size over the baseline's cumulative size.
    pub ratio: f64,
    pub min_ratio: f64,
    pub max_ratio: f64,
    pub mean_ratio: f64,
    pub std_dev: f64,
}

/// Accumulators of every codec for one direction.
#[derive(Debug, Clone, Default)]
pub struct DirectionStats {
    /// Messages processed in this direction.
    pub messages: u64,
    /// Accumulator per codec name.
    pub codecs: BTreeMap<String, Accumulator>,
}

/// Statistics of a whole run, split by direction.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    directions: PerDirection<DirectionStats>,
}

impl Statistics {
    /// Creates empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one message in `direction`.
    pub fn count_message(&mut self, direction: Direction) {
        self.directions.get_mut(direction).messages += 1;
    }

    /// Adds one codec's result for the current message.
    pub fn record(&mut self, direction: Direction, codec: &str, size: usize, ratio: Option<f64>) {
        self.directions
            .get_mut(direction)
            .codecs
            .entry(codec.to_string())
            .or_default()
            .record(size, ratio);
    }

    /// Raw accumulators of `direction`.
    pub fn direction(&self, direction: Direction) -> &DirectionStats {
        self.directions.get(direction)
    }

    /// Summaries of `direction` in codec name order, relative to `baseline`.
    pub fn summarize(&self, direction: Direction, baseline: &str) -> Vec<CodecSummary> {
        let stats = self.directions.get(direction);
        let baseline_size = stats.codecs.get(baseline).map_or(0, |acc| acc.size);
        stats
            .codecs
            .iter()
            .map(|(codec, acc)| acc.summarize(codec, baseline_size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn std_dev_uses_n_minus_one() {
        let values = [0.2, 0.3, 0.25];
        assert!(approx(mean(&values), 0.25));
        // squared deviations sum to 0.005, divided by 2
        assert!(approx(sample_std_dev(&values), 0.0025_f64.sqrt()));
        assert!(approx(sample_std_dev(&values), 0.05));
    }

    #[test]
    fn fewer_than_two_samples_have_no_spread() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[0.7]), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn accumulator_tracks_extremes() {
        let mut acc = Accumulator::default();
        acc.record(250, Some(0.25));
        acc.record(100, Some(0.5));
        acc.record(0, None);
        assert_eq!(acc.size, 350);
        assert_eq!(acc.min_ratio(), Some(0.25));
        assert_eq!(acc.max_ratio(), Some(0.5));
        assert_eq!(acc.ratios, vec![0.25, 0.5]);
    }

    #[test]
    fn final_ratio_is_relative_to_baseline_total() {
        let mut stats = Statistics::new();
        stats.count_message(Direction::Request);
        stats.record(Direction::Request, "http1", 1000, Some(1.0));
        stats.record(Direction::Request, "delta", 250, Some(0.25));

        let summary = stats.summarize(Direction::Request, "http1");
        assert_eq!(summary[0].codec, "delta");
        assert!(approx(summary[0].ratio, 0.25));
        assert_eq!(summary[0].compressed, 250);
        assert_eq!(summary[1].codec, "http1");
        assert!(approx(summary[1].ratio, 1.0));
        assert_eq!(stats.direction(Direction::Request).messages, 1);
        assert!(stats.summarize(Direction::Response, "http1").is_empty());
    }
}
