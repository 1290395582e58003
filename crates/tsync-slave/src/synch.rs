// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Synchronization: the clock-discipline feedback loop.
//!
//! Every accepted sample is corrected by the residual the kernel has
//! not yet applied (`uncorr_delta`) and collected into an observation
//! window. When the window fills, the median delta is compared against
//! the calibrated reference latency; the resulting time error — and,
//! for the FREQ method, a frequency error regressed from recent window
//! medians — is turned into a damped, clamped correction and handed to
//! the OS clock interface:
//!
//! - **STEP** sets the clock absolutely on every window.
//! - **SMOOTH** slews small errors, stepping only past the threshold.
//! - **FREQ** drives the kernel PLL with a combined offset+frequency
//!   target, stepping only past the threshold.
//!
//! Quickstart trades early precision for convergence speed: the first
//! windows are short, doubling after each correction until the
//! configured rounds are exhausted, and the window then keeps its final
//! size.

use log::{info, warn};

use crate::calibr::CALIBR_RESULTS_FILE;
use crate::clock::{ClockControl, ClockError};
use crate::config::{SlaveConfig, SyncMethod};
use crate::error::SlaveError;
use crate::least_squares::LeastSquaresWindow;
use crate::percentile::PercentileTracker;
use crate::phase::{PhaseStatus, SampleHandler};
use crate::results::read_scalar;

/// One planned correction, before it is applied to the clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correction {
    /// Time correction in seconds.
    pub time_corr: f64,
    /// Frequency correction as a fractional rate.
    pub freq_corr: f64,
    /// Whether the time correction is an immediate step rather than a
    /// gradual adjustment.
    pub step: bool,
}

/// The pure correction policy: strategy dispatch, damping, clamping.
///
/// Kept free of clock and I/O concerns so the control law can be
/// exercised directly.
#[derive(Clone, Debug)]
pub struct Controller {
    method: SyncMethod,
    time_step_thr: f64,
    time_corr_gain: f64,
    time_corr_max: f64,
    freq_corr_gain: f64,
    freq_corr_max: f64,
}

impl Controller {
    /// Build the controller from configuration.
    pub fn new(config: &SlaveConfig) -> Self {
        Controller {
            method: config.method,
            time_step_thr: config.time_step_thr,
            time_corr_gain: config.time_corr_gain,
            time_corr_max: config.time_corr_max,
            freq_corr_gain: config.freq_corr_gain,
            freq_corr_max: config.freq_corr_max,
        }
    }

    /// Compute the correction for one filled observation window.
    ///
    /// `time_error` is the median delta minus the reference latency
    /// offset; `frequency_error` is the regressed slope (zero outside
    /// the FREQ method or between estimates).
    pub fn plan(&self, time_error: f64, frequency_error: f64) -> Correction {
        let large = time_error.abs() >= self.time_step_thr;
        match self.method {
            SyncMethod::Step => Correction {
                // Small errors are clamped through the same step
                // mechanism; large ones are applied unclamped to
                // converge fast.
                time_corr: if large {
                    -time_error
                } else {
                    clamp_abs(-time_error, self.time_corr_max)
                },
                freq_corr: 0.0,
                step: true,
            },
            SyncMethod::Smooth => {
                if large {
                    Correction {
                        time_corr: -time_error,
                        freq_corr: 0.0,
                        step: true,
                    }
                } else {
                    Correction {
                        time_corr: clamp_abs(-time_error * self.time_corr_gain, self.time_corr_max),
                        freq_corr: 0.0,
                        step: false,
                    }
                }
            }
            SyncMethod::Freq => {
                let freq_corr = clamp_abs(-frequency_error * self.freq_corr_gain, self.freq_corr_max);
                if large {
                    Correction {
                        time_corr: -time_error,
                        freq_corr,
                        step: true,
                    }
                } else {
                    Correction {
                        time_corr: clamp_abs(-time_error * self.time_corr_gain, self.time_corr_max),
                        freq_corr,
                        step: false,
                    }
                }
            }
        }
    }
}

/// Clamp `value` to `[-bound, bound]`.
fn clamp_abs(value: f64, bound: f64) -> f64 {
    value.clamp(-bound, bound)
}

/// The synchronization phase, generic over the clock seam.
#[derive(Debug)]
pub struct Synchronization<C: ClockControl> {
    clock: C,
    controller: Controller,
    method: SyncMethod,
    reference_offset: f64,
    tracker: PercentileTracker,
    regression: LeastSquaresWindow,
    obs_win: usize,
    qs_rounds: u32,
    freq_estim_slots: usize,
    time_cumul_corr: f64,
    freq_cumul_corr: f64,
    win_start_time: Option<f64>,
}

impl<C: ClockControl> Synchronization<C> {
    /// Build the phase: read the calibrated reference latency (its
    /// absence is fatal) and reset the kernel discipline.
    pub fn new(config: &SlaveConfig, mut clock: C) -> Result<Self, SlaveError> {
        let reference_offset = read_scalar(config.results_dir.join(CALIBR_RESULTS_FILE))?;
        info!("reference latency offset: {:.9}", reference_offset);

        clock.reset_discipline()?;
        info!("system clock discipline reset");
        info!("setting observation window to {} samples", config.obs_win);

        // Quickstart doubles the window in place; the tracker storage
        // is allocated once for the largest size it can reach.
        let max_window = config.obs_win << config.qs_rounds;

        Ok(Synchronization {
            clock,
            controller: Controller::new(config),
            method: config.method,
            reference_offset,
            tracker: PercentileTracker::new(max_window),
            regression: LeastSquaresWindow::new(config.freq_estim_slots),
            obs_win: config.obs_win,
            qs_rounds: config.qs_rounds,
            freq_estim_slots: config.freq_estim_slots,
            time_cumul_corr: 0.0,
            freq_cumul_corr: 0.0,
            win_start_time: None,
        })
    }

    /// Current observation window size in samples.
    pub fn observation_window(&self) -> usize {
        self.obs_win
    }

    /// Borrow the underlying clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Sum of all time corrections applied so far, in seconds.
    pub fn cumulative_time_correction(&self) -> f64 {
        self.time_cumul_corr
    }

    /// Sum of all frequency corrections applied so far.
    pub fn cumulative_frequency_correction(&self) -> f64 {
        self.freq_cumul_corr
    }

    /// Apply a planned correction through the clock seam.
    ///
    /// A failed slew or PLL adjustment degrades to a step (the error is
    /// still outstanding and must not be dropped); a failed step is
    /// fatal.
    fn apply(&mut self, corr: Correction) -> Result<(), ClockError> {
        if corr.step {
            self.clock.step(corr.time_corr)?;
            info!("time correction step: {:.9}", corr.time_corr);
            if self.method == SyncMethod::Freq && corr.freq_corr != 0.0 {
                self.clock
                    .set_pll_frequency(self.freq_cumul_corr + corr.freq_corr)?;
                info!("frequency offset correction: {:.9}", corr.freq_corr);
            }
            return Ok(());
        }

        let applied = match self.method {
            SyncMethod::Smooth => self.clock.slew(corr.time_corr),
            SyncMethod::Freq => self
                .clock
                .adjust_pll(corr.time_corr, self.freq_cumul_corr + corr.freq_corr),
            // STEP plans are always marked `step`.
            SyncMethod::Step => self.clock.step(corr.time_corr),
        };
        match applied {
            Ok(()) => {
                info!("time adjustment: {:.9}", corr.time_corr);
                if corr.freq_corr != 0.0 {
                    info!("frequency offset correction: {:.9}", corr.freq_corr);
                }
                Ok(())
            }
            Err(err) => {
                warn!("failure adjusting system clock ({err}); stepping instead");
                self.clock.step(corr.time_corr)
            }
        }
    }
}

impl<C: ClockControl> SampleHandler for Synchronization<C> {
    fn handle(&mut self, clk_time: f64, time_delta: f64) -> Result<PhaseStatus, SlaveError> {
        // Fold in whatever part of the previous correction the kernel
        // has not applied yet, so it is not measured as fresh error.
        let uncorr_delta = match self.method {
            SyncMethod::Step => 0.0,
            SyncMethod::Smooth => self.clock.pending_slew()?,
            SyncMethod::Freq => self.clock.pending_pll_offset()?,
        };
        let corrected_delta = time_delta + uncorr_delta;

        let win_start = *self.win_start_time.get_or_insert(clk_time);
        self.tracker.add(corrected_delta);
        if self.tracker.count() < self.obs_win {
            return Ok(PhaseStatus::Continue);
        }

        let Some(median_delta) = self.tracker.percentile(0.5) else {
            return Err(SlaveError::Sequence("observation window is empty"));
        };
        let time_error = median_delta - self.reference_offset;

        let mut frequency_error = 0.0;
        if self.method == SyncMethod::Freq {
            // Regress the uncorrected trajectory: subtracting the
            // cumulative correction recovers what the clock would have
            // done on its own.
            let mid_x = win_start + (clk_time - win_start) / 2.0;
            self.regression
                .add(mid_x, median_delta - self.time_cumul_corr);
            if self.regression.count() == self.freq_estim_slots {
                frequency_error = self.regression.slope();
                self.regression.reset();
            }
        }

        let corr = self.controller.plan(time_error, frequency_error);
        self.apply(corr)?;
        self.time_cumul_corr += corr.time_corr;
        self.freq_cumul_corr += corr.freq_corr;

        if self.qs_rounds > 0 {
            self.qs_rounds -= 1;
            self.obs_win *= 2;
            info!("setting observation window to {} samples", self.obs_win);
        }

        self.tracker.reset();
        self.win_start_time = None;
        Ok(PhaseStatus::Continue)
    }

    fn finish(&mut self) -> Result<(), SlaveError> {
        // Synchronization is terminal; there is no downstream phase to
        // hand a result to.
        info!(
            "synchronization done: cumulative time correction {:.9}, frequency correction {:.9}",
            self.time_cumul_corr, self.freq_cumul_corr
        );
        Ok(())
    }
}
