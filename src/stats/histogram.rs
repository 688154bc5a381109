//! Per-image latency histogram using HdrHistogram
//!
//! Tracks how long each image took to load, transform and write, from 1
//! nanosecond up to 1 hour with 3 significant digits.
//!
//! # Features
//!
//! - **Wide range**: a small PNG and a multi-megapixel JPEG fit the same histogram
//! - **Constant cost**: recording and percentile queries are O(1)
//! - **Mergeable**: one histogram per worker, combined after the join
//!
//! # Example
//!
//! ```
//! use imgbench::stats::histogram::LatencyHistogram;
//! use std::time::Duration;
//!
//! let mut hist = LatencyHistogram::new();
//! hist.record(Duration::from_millis(12));
//! hist.record(Duration::from_millis(15));
//!
//! assert_eq!(hist.len(), 2);
//! assert!(hist.percentile(50.0).is_some());
//! ```

use crate::Result;
use hdrhistogram::Histogram;
use serde::Serialize;
use std::time::Duration;

const MAX_NANOS: u64 = 3_600_000_000_000;

/// Latency histogram wrapper
///
/// Each worker owns one and records every successful image into it. The
/// aggregator merges them into the run's histogram.
///
/// # Precision
///
/// 3 significant digits:
/// - Values are accurate to within 0.1%
/// - Memory usage is a few KB per histogram
///
/// # Range
///
/// - **Minimum**: 1 nanosecond (a zero duration is recorded as 1ns)
/// - **Maximum**: 3,600,000,000,000 nanoseconds (1 hour); longer samples are clamped
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    /// Samples in nanoseconds
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create an empty histogram (1ns to 1 hour, 3 significant digits)
    pub fn new() -> Self {
        // Bounds are constants, so construction cannot fail
        let histogram = Histogram::new_with_bounds(1, MAX_NANOS, 3)
            .expect("Failed to create histogram with valid bounds");

        Self { histogram }
    }

    /// Record a latency sample, clamped to the histogram range
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = latency.as_nanos().min(MAX_NANOS as u128) as u64;
        let _ = self.histogram.record(nanos.max(1));
    }

    /// Latency at `percentile` (0.0 - 100.0), or None if empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.value_at_percentile(percentile)))
    }

    pub fn min(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.max()))
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.mean() as u64))
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Merge another histogram into this one
    ///
    /// Used to combine the histograms of all workers of a run.
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| anyhow::anyhow!("Failed to merge histograms: {}", e))?;
        Ok(())
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of a histogram for reports, in milliseconds
///
/// Every field except `count` is `None` for an empty histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    /// Number of recorded samples
    pub count: u64,
    pub min_ms: Option<f64>,
    pub mean_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

impl LatencySummary {
    pub fn from_histogram(hist: &LatencyHistogram) -> Self {
        let ms = |d: Option<Duration>| d.map(|d| d.as_secs_f64() * 1_000.0);
        Self {
            count: hist.len(),
            min_ms: ms(hist.min()),
            mean_ms: ms(hist.mean()),
            p50_ms: ms(hist.percentile(50.0)),
            p99_ms: ms(hist.percentile(99.0)),
            max_ms: ms(hist.max()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let hist = LatencyHistogram::new();
        assert!(hist.is_empty());
        assert_eq!(hist.min(), None);
        assert_eq!(hist.mean(), None);
        assert_eq!(hist.percentile(99.0), None);
    }

    #[test]
    fn test_record_and_query() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::from_millis(10));
        hist.record(Duration::from_millis(20));
        hist.record(Duration::from_millis(30));

        assert_eq!(hist.len(), 3);
        let min = hist.min().unwrap();
        let max = hist.max().unwrap();
        // 3 significant digits
        assert!(min >= Duration::from_micros(9_990) && min <= Duration::from_micros(10_010));
        assert!(max >= Duration::from_micros(29_970) && max <= Duration::from_micros(30_030));
    }

    #[test]
    fn test_zero_latency_is_recorded() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::ZERO);
        assert_eq!(hist.len(), 1);
    }

    #[test]
    fn test_merge() {
        let mut hist1 = LatencyHistogram::new();
        hist1.record(Duration::from_micros(100));

        let mut hist2 = LatencyHistogram::new();
        hist2.record(Duration::from_micros(200));
        hist2.record(Duration::from_micros(300));

        hist1.merge(&hist2).unwrap();
        assert_eq!(hist1.len(), 3);
    }

    #[test]
    fn test_summary() {
        assert_eq!(LatencySummary::from_histogram(&LatencyHistogram::new()), LatencySummary::default());

        let mut hist = LatencyHistogram::new();
        hist.record(Duration::from_millis(4));
        let summary = LatencySummary::from_histogram(&hist);
        assert_eq!(summary.count, 1);
        let p50 = summary.p50_ms.unwrap();
        assert!((p50 - 4.0).abs() < 0.01);
    }
}
