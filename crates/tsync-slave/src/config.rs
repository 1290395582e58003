// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Slave configuration.
//!
//! Gathered by whatever front end launches the slave (flags, file,
//! environment — out of scope here) and validated once before any phase
//! starts. A violated bound is a [`ConfigError`]: the process exits
//! before touching the network or the clock.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use tsync_proto::PORT;

use crate::error::ConfigError;
use crate::phase::PhaseKind;

/// Largest accepted observation window, in samples.
pub const MAX_OBS_WIN: usize = 1_000_000;

/// How the synchronization phase applies corrections.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SyncMethod {
    /// Immediate absolute clock sets on every correction.
    #[default]
    Step,
    /// Gradual slew for small errors, step fallback for large ones.
    Smooth,
    /// Kernel PLL offset+frequency discipline.
    Freq,
}

/// Configuration for a slave run (one phase per process invocation).
#[derive(Clone, Debug)]
pub struct SlaveConfig {
    /// Local address the UDP socket binds to.
    pub bind_addr: SocketAddr,
    /// Which phase this invocation runs.
    pub phase: PhaseKind,
    /// Number of accepted packets before a clean exit; `None` runs
    /// until interrupted (Synchronization only).
    pub max_pkt_cnt: Option<u64>,
    /// Observation window in samples.
    pub obs_win: usize,
    /// Correction strategy for Synchronization.
    pub method: SyncMethod,
    /// Window-median count per frequency estimate (FREQ method).
    pub freq_estim_slots: usize,
    /// Error magnitude (seconds) at which corrections step instead of
    /// slewing.
    pub time_step_thr: f64,
    /// Damping gain applied to the time error.
    pub time_corr_gain: f64,
    /// Clamp bound (seconds) on a single damped time correction.
    pub time_corr_max: f64,
    /// Damping gain applied to the frequency error.
    pub freq_corr_gain: f64,
    /// Clamp bound (fractional rate) on a single frequency correction.
    pub freq_corr_max: f64,
    /// Quickstart rounds: the observation window doubles after each of
    /// the first `qs_rounds` corrections.
    pub qs_rounds: u32,
    /// Path to the 32-byte shared key; `None` disables authentication.
    pub key_file: Option<PathBuf>,
    /// Drift-estimation window for calibration diagnostics; `None`
    /// disables the drift estimate and the summary file.
    pub drift_win: Option<usize>,
    /// Directory holding the phase result files.
    pub results_dir: PathBuf,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        SlaveConfig {
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, PORT)),
            phase: PhaseKind::Precalibration,
            max_pkt_cnt: None,
            obs_win: 100,
            method: SyncMethod::default(),
            freq_estim_slots: 10,
            time_step_thr: 0.128,
            time_corr_gain: 0.5,
            time_corr_max: 0.0005,
            freq_corr_gain: 0.5,
            freq_corr_max: 0.0001,
            qs_rounds: 0,
            key_file: None,
            drift_win: None,
            results_dir: PathBuf::from("."),
        }
    }
}

impl SlaveConfig {
    /// Check all bounds; every violation is fatal before startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.obs_win == 0 || self.obs_win > MAX_OBS_WIN {
            return Err(ConfigError::InvalidParameter {
                name: "obs_win",
                reason: "must be between 1 and 1000000 samples",
            });
        }
        if self.max_pkt_cnt == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_pkt_cnt",
                reason: "must be at least 1 when bounded",
            });
        }
        if self.phase == PhaseKind::Calibration && self.max_pkt_cnt.is_none() {
            return Err(ConfigError::InvalidParameter {
                name: "max_pkt_cnt",
                reason: "calibration requires a finite packet budget",
            });
        }
        if self.freq_estim_slots < 2 {
            return Err(ConfigError::InvalidParameter {
                name: "freq_estim_slots",
                reason: "a frequency estimate needs at least 2 points",
            });
        }
        if !(self.time_step_thr > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "time_step_thr",
                reason: "must be positive",
            });
        }
        if !(self.time_corr_gain > 0.0) || !(self.freq_corr_gain > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "corr_gain",
                reason: "damping gains must be positive",
            });
        }
        if !(self.time_corr_max > 0.0) || !(self.freq_corr_max > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "corr_max",
                reason: "clamp bounds must be positive",
            });
        }
        if self.qs_rounds > 20 {
            return Err(ConfigError::InvalidParameter {
                name: "qs_rounds",
                reason: "more than 20 doublings would overflow the window",
            });
        }
        if self
            .obs_win
            .checked_shl(self.qs_rounds)
            .is_none_or(|w| w > MAX_OBS_WIN)
        {
            return Err(ConfigError::InvalidParameter {
                name: "qs_rounds",
                reason: "fully doubled observation window exceeds the maximum",
            });
        }
        if let Some(win) = self.drift_win
            && win < 2
        {
            return Err(ConfigError::InvalidParameter {
                name: "drift_win",
                reason: "a drift window needs at least 2 samples",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        SlaveConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = SlaveConfig {
            obs_win: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_calibration_requires_budget() {
        let mut config = SlaveConfig {
            phase: PhaseKind::Calibration,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.max_pkt_cnt = Some(1000);
        config.validate().unwrap();
    }

    #[test]
    fn test_quickstart_overflow_rejected() {
        let config = SlaveConfig {
            obs_win: 1000,
            qs_rounds: 15,
            ..Default::default()
        };
        // 1000 << 15 > MAX_OBS_WIN
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_gain_rejected() {
        let config = SlaveConfig {
            time_corr_gain: -0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let config = SlaveConfig {
            time_step_thr: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tiny_drift_window_rejected() {
        let config = SlaveConfig {
            drift_win: Some(1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_slot_freq_estimate_rejected() {
        let config = SlaveConfig {
            freq_estim_slots: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
