// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Calibration: reference path-latency estimation.
//!
//! With the frequency offset known from pre-calibration, each observed
//! delta is de-skewed (`delta − freq_offset × elapsed`) so the whole
//! run can be treated as one stationary distribution. The median of the
//! corrected deltas over the full packet budget becomes the reference
//! latency offset — the synchronization target. Optionally the phase
//! also tracks a windowed-minimum drift estimate and writes a summary
//! statistics file; both are diagnostic only.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::config::SlaveConfig;
use crate::drift::DriftTracker;
use crate::error::{ConfigError, SlaveError};
use crate::percentile::PercentileTracker;
use crate::phase::{PhaseStatus, SampleHandler};
use crate::precalibr::PRECALIBR_RESULTS_FILE;
use crate::results::{read_scalar, write_scalar};
use crate::stats::RunningStats;
use crate::summary::SummaryStats;

/// File the reference latency offset is written to.
pub const CALIBR_RESULTS_FILE: &str = "calibr_results.txt";

/// File the optional summary statistics are written to.
pub const CALIBR_STATS_FILE: &str = "calibr_stats.txt";

/// The calibration phase.
#[derive(Debug)]
pub struct Calibration {
    /// Correction applied per second of elapsed time: the negated
    /// pre-calibration frequency offset.
    freq_corr: f64,
    tracker: PercentileTracker,
    stats: RunningStats,
    drift: Option<DriftTracker>,
    first_clk_time: Option<f64>,
    out_path: PathBuf,
    stats_path: PathBuf,
}

impl Calibration {
    /// Build the phase from configuration, reading back the
    /// pre-calibration result.
    ///
    /// A missing pre-calibration file means a zero frequency offset
    /// (the phases may legitimately be run without pre-calibration); an
    /// unreadable one is fatal.
    pub fn new(config: &SlaveConfig) -> Result<Self, SlaveError> {
        let budget = config.max_pkt_cnt.ok_or(ConfigError::InvalidParameter {
            name: "max_pkt_cnt",
            reason: "calibration requires a finite packet budget",
        })?;

        let precalibr_path = config.results_dir.join(PRECALIBR_RESULTS_FILE);
        let freq_corr = match read_scalar(&precalibr_path) {
            Ok(freq_off) => -freq_off,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!("cannot open pre-calibration results; assuming zero frequency offset");
                0.0
            }
            Err(err) => return Err(SlaveError::Io(err)),
        };

        Ok(Calibration {
            freq_corr,
            // The whole run is one window: the tracker holds every
            // accepted sample up to the packet budget.
            tracker: PercentileTracker::new(budget as usize),
            stats: RunningStats::new(),
            drift: config.drift_win.map(DriftTracker::new),
            first_clk_time: None,
            out_path: config.results_dir.join(CALIBR_RESULTS_FILE),
            stats_path: config.results_dir.join(CALIBR_STATS_FILE),
        })
    }

    /// Median of the corrected deltas accumulated so far.
    pub fn median(&self) -> Option<f64> {
        self.tracker.percentile(0.5)
    }

    /// The frequency correction in effect (negated pre-calibration
    /// offset).
    pub fn frequency_correction(&self) -> f64 {
        self.freq_corr
    }
}

impl SampleHandler for Calibration {
    fn handle(&mut self, clk_time: f64, time_delta: f64) -> Result<PhaseStatus, SlaveError> {
        let first_clk = *self.first_clk_time.get_or_insert(clk_time);
        let corrected = time_delta + self.freq_corr * (clk_time - first_clk);

        self.stats.add(corrected);
        if let Some(drift) = &mut self.drift {
            drift.add(clk_time, corrected);
        }
        self.tracker.add(corrected);

        if let Some(median) = self.tracker.percentile(0.5) {
            debug!("median time delta: {:.9}", median);
        }

        if self.tracker.count() == self.tracker.capacity() {
            Ok(PhaseStatus::Complete)
        } else {
            Ok(PhaseStatus::Continue)
        }
    }

    fn finish(&mut self) -> Result<(), SlaveError> {
        let Some(median) = self.tracker.percentile(0.5) else {
            return Err(SlaveError::Sequence(
                "calibration finished without any accepted samples",
            ));
        };
        info!("reference latency offset: {:.9}", median);
        write_scalar(&self.out_path, median)?;

        if let Some(drift) = &self.drift {
            let summary = SummaryStats::from_trackers(&self.stats, &self.tracker, drift);
            let file = File::create(&self.stats_path)?;
            summary.write_to(BufWriter::new(file))?;
            info!(
                "calibration drift: {} ppb over {} windows",
                summary.drift_ppb,
                drift.windows()
            );
        }
        Ok(())
    }
}
