// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared test helpers: a recording fake clock and temp-dir plumbing.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use tsync_slave::clock::{ClockControl, ClockError};

static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

/// Create a unique scratch directory for one test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "tsync-it-{}-{}-{name}",
        std::process::id(),
        DIR_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A clock that records every discipline call instead of touching the
/// system.
#[derive(Debug, Default)]
pub struct FakeClock {
    /// Value returned by `read_time`.
    pub now: f64,
    /// Residual reported to `pending_slew`.
    pub pending_slew: f64,
    /// Residual reported to `pending_pll_offset`.
    pub pending_pll: f64,
    /// When set, slew and PLL adjustments fail (exercises the step
    /// fallback).
    pub fail_adjust: bool,
    /// Recorded step offsets.
    pub steps: Vec<f64>,
    /// Recorded slew offsets.
    pub slews: Vec<f64>,
    /// Recorded `(offset, frequency)` PLL targets.
    pub pll_targets: Vec<(f64, f64)>,
    /// Recorded frequency-only pushes.
    pub freq_sets: Vec<f64>,
    /// Number of discipline resets.
    pub resets: usize,
}

impl ClockControl for FakeClock {
    fn read_time(&mut self) -> Result<f64, ClockError> {
        Ok(self.now)
    }

    fn pending_slew(&mut self) -> Result<f64, ClockError> {
        Ok(self.pending_slew)
    }

    fn pending_pll_offset(&mut self) -> Result<f64, ClockError> {
        Ok(self.pending_pll)
    }

    fn step(&mut self, offset_seconds: f64) -> Result<(), ClockError> {
        self.steps.push(offset_seconds);
        Ok(())
    }

    fn slew(&mut self, offset_seconds: f64) -> Result<(), ClockError> {
        if self.fail_adjust {
            return Err(ClockError::OsError(1));
        }
        self.slews.push(offset_seconds);
        Ok(())
    }

    fn adjust_pll(&mut self, offset_seconds: f64, frequency: f64) -> Result<(), ClockError> {
        if self.fail_adjust {
            return Err(ClockError::OsError(1));
        }
        self.pll_targets.push((offset_seconds, frequency));
        Ok(())
    }

    fn set_pll_frequency(&mut self, frequency: f64) -> Result<(), ClockError> {
        self.freq_sets.push(frequency);
        Ok(())
    }

    fn reset_discipline(&mut self) -> Result<(), ClockError> {
        self.resets += 1;
        Ok(())
    }
}
