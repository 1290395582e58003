// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Pre-calibration: local-clock frequency offset estimation.
//!
//! Path latency is noisy but its median over an observation window is
//! stable; if the slave clock runs fast or slow relative to the master,
//! consecutive window medians drift linearly. The phase collects one
//! median per filled window, pairs it with the window's midpoint time,
//! and fits a line through the pairs: the slope is the fractional
//! frequency offset. The result is written for calibration to read
//! back.

use std::path::PathBuf;

use log::{debug, info};

use crate::config::SlaveConfig;
use crate::error::SlaveError;
use crate::least_squares::LeastSquaresWindow;
use crate::percentile::PercentileTracker;
use crate::phase::{PhaseStatus, SampleHandler};
use crate::results::write_scalar;

/// File the estimated frequency offset is written to.
pub const PRECALIBR_RESULTS_FILE: &str = "precalibr_results.txt";

/// Capacity of the median-pair regression window.
const FREQ_REGRESSION_SLOTS: usize = 1000;

/// The pre-calibration phase.
#[derive(Debug)]
pub struct Precalibration {
    obs_win: usize,
    tracker: PercentileTracker,
    regression: LeastSquaresWindow,
    first_clk_time: Option<f64>,
    first_delta: f64,
    win_start_time: Option<f64>,
    out_path: PathBuf,
}

impl Precalibration {
    /// Build the phase from configuration.
    pub fn new(config: &SlaveConfig) -> Self {
        Precalibration {
            obs_win: config.obs_win,
            tracker: PercentileTracker::new(config.obs_win),
            regression: LeastSquaresWindow::new(FREQ_REGRESSION_SLOTS),
            first_clk_time: None,
            first_delta: 0.0,
            win_start_time: None,
            out_path: config.results_dir.join(PRECALIBR_RESULTS_FILE),
        }
    }

    /// Current frequency-offset estimate (fractional rate).
    pub fn frequency_offset(&self) -> f64 {
        self.regression.slope()
    }

    /// Number of completed observation windows.
    pub fn windows_completed(&self) -> usize {
        self.regression.count()
    }
}

impl SampleHandler for Precalibration {
    fn handle(&mut self, clk_time: f64, time_delta: f64) -> Result<PhaseStatus, SlaveError> {
        if self.first_clk_time.is_none() {
            self.first_clk_time = Some(clk_time);
            self.first_delta = time_delta;
        }
        let win_start = *self.win_start_time.get_or_insert(clk_time);

        self.tracker.add(time_delta);
        if self.tracker.count() == self.obs_win {
            let first_clk = self.first_clk_time.unwrap_or(clk_time);
            // Window midpoint relative to the first sample ever seen;
            // median relative to the first delta (intercept only, the
            // slope is unaffected).
            let mid_x = win_start + (clk_time - win_start) / 2.0 - first_clk;
            let Some(median) = self.tracker.percentile(0.5) else {
                return Err(SlaveError::Sequence("observation window is empty"));
            };
            self.regression.add(mid_x, median - self.first_delta);

            if self.regression.count() > 1 {
                info!("frequency delta: {:.9}", self.regression.slope());
            } else {
                debug!("first observation window complete");
            }

            self.win_start_time = None;
            self.tracker.reset();
        }
        Ok(PhaseStatus::Continue)
    }

    fn finish(&mut self) -> Result<(), SlaveError> {
        let freq_off = self.regression.slope();
        info!("estimated frequency offset: {:.9}", freq_off);
        write_scalar(&self.out_path, freq_off)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::read_scalar;

    fn config(dir: &std::path::Path, obs_win: usize) -> SlaveConfig {
        SlaveConfig {
            obs_win,
            results_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tsync-precalibr-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_no_regression_point_until_window_fills() {
        let dir = temp_dir("window");
        let mut phase = Precalibration::new(&config(&dir, 4));
        for i in 0..3 {
            phase.handle(i as f64, 0.001).unwrap();
        }
        assert_eq!(phase.windows_completed(), 0);
        phase.handle(3.0, 0.001).unwrap();
        assert_eq!(phase.windows_completed(), 1);
    }

    #[test]
    fn test_recovers_synthetic_skew() {
        let dir = temp_dir("skew");
        let mut phase = Precalibration::new(&config(&dir, 10));
        // delta grows at 5 ppm of elapsed time plus bounded noise.
        for i in 0..200u64 {
            let t = i as f64;
            let noise = (((i * 2654435761) % 997) as f64 / 997.0 - 0.5) * 1e-7;
            let delta = 0.002 + 5e-6 * t + noise;
            phase.handle(t, delta).unwrap();
        }
        assert_eq!(phase.windows_completed(), 20);
        let est = phase.frequency_offset();
        assert!(
            (est - 5e-6).abs() < 1e-6,
            "estimated {est}, expected ~5e-6"
        );
    }

    #[test]
    fn test_finish_writes_result_file() {
        let dir = temp_dir("finish");
        let mut phase = Precalibration::new(&config(&dir, 2));
        for (t, d) in [(0.0, 0.0), (1.0, 1e-6), (2.0, 2e-6), (3.0, 3e-6)] {
            phase.handle(t, d).unwrap();
        }
        phase.finish().unwrap();
        let stored = read_scalar(dir.join(PRECALIBR_RESULTS_FILE)).unwrap();
        assert!((stored - phase.frequency_offset()).abs() < 1e-9);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_zero_skew_gives_zero_slope() {
        let dir = temp_dir("flat");
        let mut phase = Precalibration::new(&config(&dir, 5));
        for i in 0..50 {
            phase.handle(i as f64, 0.0042).unwrap();
        }
        assert!(phase.frequency_offset().abs() < 1e-12);
    }

    #[test]
    fn test_window_resets_between_medians() {
        let dir = temp_dir("reset");
        let mut phase = Precalibration::new(&config(&dir, 3));
        for i in 0..9 {
            phase.handle(i as f64, i as f64).unwrap();
        }
        // 9 samples with a window of 3 → 3 completed windows.
        assert_eq!(phase.windows_completed(), 3);
    }
}
