// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Calibration summary statistics and their labeled-line file format.
//!
//! One `label: value` pair per line, fixed order, 15 fractional digits —
//! enough to round-trip an f64 latency in seconds. The file hands
//! calibration results to a separately invoked synchronization run.

use std::io::{self, BufRead, Write};

use crate::drift::DriftTracker;
use crate::percentile::PercentileTracker;
use crate::stats::RunningStats;

/// Percentile levels reported in the summary, in file order.
const SUMMARY_PERCENTILES: [f64; 4] = [0.10, 0.25, 0.50, 0.99];

/// A snapshot of the calibration run's latency distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryStats {
    /// Number of accepted samples.
    pub count: u64,
    /// Smallest corrected delta.
    pub min: f64,
    /// Largest corrected delta.
    pub max: f64,
    /// Mean corrected delta.
    pub mean: f64,
    /// Sample standard deviation.
    pub stddev: f64,
    /// Standard deviation of the mean.
    pub mean_stddev: f64,
    /// p10, p25, p50, p99 of the corrected deltas.
    pub percentiles: [f64; 4],
    /// Last-minus-first window minimum over the run.
    pub cumulative_drift: f64,
    /// Windowed-minimum drift slope, rounded to parts per billion.
    pub drift_ppb: i64,
}

impl SummaryStats {
    /// Assemble a summary from the calibration trackers.
    pub fn from_trackers(
        stats: &RunningStats,
        tracker: &PercentileTracker,
        drift: &DriftTracker,
    ) -> Self {
        let mut percentiles = [f64::NAN; 4];
        for (slot, p) in percentiles.iter_mut().zip(SUMMARY_PERCENTILES) {
            if let Some(v) = tracker.percentile(p) {
                *slot = v;
            }
        }
        SummaryStats {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            stddev: stats.stddev(),
            mean_stddev: stats.mean_stddev(),
            percentiles,
            cumulative_drift: drift.cumulative_drift(),
            drift_ppb: (drift.drift() * 1e9).round() as i64,
        }
    }

    /// Write the labeled-line format.
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "count: {}", self.count)?;
        writeln!(w, "min: {:.15}", self.min)?;
        writeln!(w, "max: {:.15}", self.max)?;
        writeln!(w, "mean: {:.15}", self.mean)?;
        writeln!(w, "stddev: {:.15}", self.stddev)?;
        writeln!(w, "mean_stddev: {:.15}", self.mean_stddev)?;
        writeln!(w, "p10: {:.15}", self.percentiles[0])?;
        writeln!(w, "p25: {:.15}", self.percentiles[1])?;
        writeln!(w, "p50: {:.15}", self.percentiles[2])?;
        writeln!(w, "p99: {:.15}", self.percentiles[3])?;
        writeln!(w, "cumul_drift: {:.15}", self.cumulative_drift)?;
        writeln!(w, "drift_ppb: {}", self.drift_ppb)?;
        Ok(())
    }

    /// Parse the labeled-line format, enforcing label order.
    pub fn read_from<R: BufRead>(mut r: R) -> io::Result<Self> {
        let count = labeled_line(&mut r, "count")?;
        let min = labeled_line(&mut r, "min")?;
        let max = labeled_line(&mut r, "max")?;
        let mean = labeled_line(&mut r, "mean")?;
        let stddev = labeled_line(&mut r, "stddev")?;
        let mean_stddev = labeled_line(&mut r, "mean_stddev")?;
        let p10 = labeled_line(&mut r, "p10")?;
        let p25 = labeled_line(&mut r, "p25")?;
        let p50 = labeled_line(&mut r, "p50")?;
        let p99 = labeled_line(&mut r, "p99")?;
        let cumulative_drift = labeled_line(&mut r, "cumul_drift")?;
        let drift_ppb = labeled_line(&mut r, "drift_ppb")?;
        Ok(SummaryStats {
            count: count as u64,
            min,
            max,
            mean,
            stddev,
            mean_stddev,
            percentiles: [p10, p25, p50, p99],
            cumulative_drift,
            drift_ppb: drift_ppb as i64,
        })
    }
}

/// Read one `label: value` line and parse the value as f64.
fn labeled_line<R: BufRead>(r: &mut R, label: &str) -> io::Result<f64> {
    let mut line = String::new();
    r.read_line(&mut line)?;
    let rest = line
        .trim_end()
        .strip_prefix(label)
        .and_then(|s| s.strip_prefix(": "))
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("statistics file: expected '{label}:' line"),
            )
        })?;
    rest.parse::<f64>().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("statistics file: invalid value for '{label}'"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> SummaryStats {
        SummaryStats {
            count: 1000,
            min: 0.001,
            max: 0.009,
            mean: 0.0042,
            stddev: 0.0011,
            mean_stddev: 0.0011 / 1000f64.sqrt(),
            percentiles: [0.002, 0.003, 0.004, 0.0088],
            cumulative_drift: 1.5e-5,
            drift_ppb: 312,
        }
    }

    #[test]
    fn test_roundtrip() {
        let summary = sample_summary();
        let mut buf = Vec::new();
        summary.write_to(&mut buf).unwrap();
        let parsed = SummaryStats::read_from(buf.as_slice()).unwrap();
        assert_eq!(parsed.count, summary.count);
        assert_eq!(parsed.drift_ppb, summary.drift_ppb);
        assert!((parsed.mean - summary.mean).abs() < 1e-12);
        assert!((parsed.percentiles[3] - summary.percentiles[3]).abs() < 1e-12);
    }

    #[test]
    fn test_file_format_lines() {
        let mut buf = Vec::new();
        sample_summary().write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "count: 1000");
        assert!(lines[1].starts_with("min: 0.001"));
        assert_eq!(lines[11], "drift_ppb: 312");
    }

    #[test]
    fn test_read_rejects_out_of_order_labels() {
        let text = "min: 1.0\ncount: 5\n";
        let err = SummaryStats::read_from(text.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_rejects_garbage_value() {
        let text = "count: abc\n";
        let err = SummaryStats::read_from(text.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_from_trackers() {
        let mut stats = RunningStats::new();
        let mut tracker = PercentileTracker::new(16);
        let mut drift = DriftTracker::new(2);
        for i in 0..8 {
            let v = i as f64 * 0.001;
            stats.add(v);
            tracker.add(v);
            drift.add(i as f64, v);
        }
        let summary = SummaryStats::from_trackers(&stats, &tracker, &drift);
        assert_eq!(summary.count, 8);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 0.007);
        assert_eq!(summary.percentiles[2], tracker.percentile(0.5).unwrap());
    }
}
