// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! System clock discipline interface.
//!
//! The synchronization phase steers the system clock through three
//! mechanisms, all blocking synchronous calls with no concurrent
//! callers:
//!
//! - **Step**: immediate absolute set — used for large errors and by the
//!   STEP method unconditionally.
//! - **Slew**: gradual rate adjustment of a signed sub-second offset —
//!   the SMOOTH method.
//! - **PLL**: a combined offset+frequency target handed to the kernel
//!   phase-locked loop — the FREQ method. Damping and clamping have
//!   already been applied by the caller.
//!
//! Both slew and PLL adjustments are applied asynchronously by the
//! kernel, so the residual not yet applied can be read back and folded
//! into the next measurement (`pending_slew`, `pending_pll_offset`).
//!
//! # Privileges
//!
//! Mutating calls require root. `EPERM` maps to
//! [`ClockError::PermissionDenied`].
//!
//! # Platform Support
//!
//! Linux only (`clock_gettime`/`clock_settime`/`adjtime`/
//! `clock_adjtime`). Other platforms return [`ClockError::Unsupported`].

#![allow(unsafe_code)]

use std::fmt;

/// Kernel PLL frequency unit: parts per million with a 16-bit binary
/// fraction, as consumed by `clock_adjtime`.
#[cfg(target_os = "linux")]
const PPM_16BIT_FRAC: f64 = 65536e6;

/// Error type for clock discipline operations.
#[derive(Debug)]
pub enum ClockError {
    /// The operation requires elevated privileges (root).
    PermissionDenied,
    /// Platform-specific error with an OS error code.
    OsError(i32),
    /// Clock discipline is not supported on this platform.
    Unsupported,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::PermissionDenied => write!(f, "permission denied (requires root)"),
            ClockError::OsError(code) => write!(f, "OS error: {}", code),
            ClockError::Unsupported => {
                write!(f, "clock discipline not supported on this platform")
            }
        }
    }
}

impl std::error::Error for ClockError {}

/// The clock discipline seam between the synchronization phase and the
/// operating system.
///
/// The phase logic is generic over this trait so correction behavior
/// can be exercised against a fake clock; [`SystemClock`] is the
/// production implementation.
pub trait ClockControl {
    /// Current wall-clock time in seconds.
    fn read_time(&mut self) -> Result<f64, ClockError>;

    /// Residual of an in-progress gradual adjustment, in seconds.
    /// Zero when no slew is pending.
    fn pending_slew(&mut self) -> Result<f64, ClockError>;

    /// Residual offset the kernel PLL has not yet applied, in seconds.
    fn pending_pll_offset(&mut self) -> Result<f64, ClockError>;

    /// Immediately set the clock `offset_seconds` away from its current
    /// reading.
    fn step(&mut self, offset_seconds: f64) -> Result<(), ClockError>;

    /// Gradually adjust the clock by `offset_seconds`.
    fn slew(&mut self, offset_seconds: f64) -> Result<(), ClockError>;

    /// Hand the kernel PLL a combined offset and frequency target.
    /// `frequency` is a fractional rate (s/s); damping and clamping are
    /// the caller's responsibility.
    fn adjust_pll(&mut self, offset_seconds: f64, frequency: f64) -> Result<(), ClockError>;

    /// Set only the PLL frequency, leaving phase untouched. Used when a
    /// step preempts the damped offset path but a frequency correction
    /// is pending.
    fn set_pll_frequency(&mut self, frequency: f64) -> Result<(), ClockError>;

    /// Zero any prior offset/frequency adjustment and mark the clock
    /// unsynchronized. Called once when synchronization starts.
    fn reset_discipline(&mut self) -> Result<(), ClockError>;
}

/// The real system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl ClockControl for SystemClock {
    fn read_time(&mut self) -> Result<f64, ClockError> {
        platform::read_time()
    }

    fn pending_slew(&mut self) -> Result<f64, ClockError> {
        platform::pending_slew()
    }

    fn pending_pll_offset(&mut self) -> Result<f64, ClockError> {
        platform::pending_pll_offset()
    }

    fn step(&mut self, offset_seconds: f64) -> Result<(), ClockError> {
        platform::step(offset_seconds)
    }

    fn slew(&mut self, offset_seconds: f64) -> Result<(), ClockError> {
        platform::slew(offset_seconds)
    }

    fn adjust_pll(&mut self, offset_seconds: f64, frequency: f64) -> Result<(), ClockError> {
        platform::adjust_pll(offset_seconds, frequency)
    }

    fn set_pll_frequency(&mut self, frequency: f64) -> Result<(), ClockError> {
        platform::set_pll_frequency(frequency)
    }

    fn reset_discipline(&mut self) -> Result<(), ClockError> {
        platform::reset_discipline()
    }
}

/// Convert an OS errno to a [`ClockError`].
#[cfg(target_os = "linux")]
fn os_error_from_errno() -> ClockError {
    let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(-1);
    if errno == libc::EPERM {
        ClockError::PermissionDenied
    } else {
        ClockError::OsError(errno)
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::*;

    pub(super) fn read_time() -> Result<f64, ClockError> {
        let mut tp: libc::timespec = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut tp) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }
        Ok(tp.tv_sec as f64 + tp.tv_nsec as f64 * 1e-9)
    }

    pub(super) fn pending_slew() -> Result<f64, ClockError> {
        let mut tv = libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        let ret = unsafe { libc::adjtime(std::ptr::null(), &mut tv) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }
        Ok(tv.tv_sec as f64 + tv.tv_usec as f64 * 1e-6)
    }

    pub(super) fn pending_pll_offset() -> Result<f64, ClockError> {
        let mut tx: libc::timex = unsafe { std::mem::zeroed() };
        // modes = 0 reads the current adjustment without modifying it.
        let ret = unsafe { libc::clock_adjtime(libc::CLOCK_REALTIME, &mut tx) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }
        // Offset is reported in nanoseconds when STA_NANO is set,
        // microseconds otherwise.
        let scale = if tx.status & libc::STA_NANO != 0 {
            1e-9
        } else {
            1e-6
        };
        Ok(tx.offset as f64 * scale)
    }

    pub(super) fn step(offset_seconds: f64) -> Result<(), ClockError> {
        let mut tp: libc::timespec = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut tp) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }

        let offset_nanos = (offset_seconds * 1e9) as i64;
        #[allow(clippy::unnecessary_cast)] // tv_sec/tv_nsec types differ across targets
        let total_nanos = tp.tv_sec as i64 * 1_000_000_000 + tp.tv_nsec as i64 + offset_nanos;
        tp.tv_sec = total_nanos.div_euclid(1_000_000_000) as _;
        tp.tv_nsec = total_nanos.rem_euclid(1_000_000_000) as _;

        let ret = unsafe { libc::clock_settime(libc::CLOCK_REALTIME, &tp) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }
        Ok(())
    }

    pub(super) fn slew(offset_seconds: f64) -> Result<(), ClockError> {
        // Normalized timeval: floor seconds, non-negative microseconds.
        let secs = offset_seconds.floor();
        let delta = libc::timeval {
            tv_sec: secs as libc::time_t,
            tv_usec: ((offset_seconds - secs) * 1e6) as libc::suseconds_t,
        };
        let ret = unsafe { libc::adjtime(&delta, std::ptr::null_mut()) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }
        Ok(())
    }

    pub(super) fn adjust_pll(offset_seconds: f64, frequency: f64) -> Result<(), ClockError> {
        let mut tx: libc::timex = unsafe { std::mem::zeroed() };
        tx.modes = libc::ADJ_OFFSET
            | libc::ADJ_FREQUENCY
            | libc::ADJ_STATUS
            | libc::ADJ_TIMECONST
            | libc::ADJ_NANO;
        tx.offset = (offset_seconds * 1e9) as _;
        tx.freq = (frequency * PPM_16BIT_FRAC) as _;
        tx.status = libc::STA_PLL | libc::STA_NANO | libc::STA_UNSYNC | libc::STA_FREQHOLD;
        tx.constant = 1;
        let ret = unsafe { libc::clock_adjtime(libc::CLOCK_REALTIME, &mut tx) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }
        Ok(())
    }

    pub(super) fn set_pll_frequency(frequency: f64) -> Result<(), ClockError> {
        let mut tx: libc::timex = unsafe { std::mem::zeroed() };
        tx.modes = libc::ADJ_FREQUENCY | libc::ADJ_STATUS;
        tx.freq = (frequency * PPM_16BIT_FRAC) as _;
        tx.status = libc::STA_PLL | libc::STA_UNSYNC | libc::STA_FREQHOLD;
        let ret = unsafe { libc::clock_adjtime(libc::CLOCK_REALTIME, &mut tx) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }
        Ok(())
    }

    pub(super) fn reset_discipline() -> Result<(), ClockError> {
        let mut tx: libc::timex = unsafe { std::mem::zeroed() };
        tx.modes = libc::ADJ_OFFSET | libc::ADJ_FREQUENCY | libc::ADJ_STATUS;
        tx.offset = 0;
        tx.freq = 0;
        tx.status = libc::STA_UNSYNC;
        let ret = unsafe { libc::clock_adjtime(libc::CLOCK_REALTIME, &mut tx) };
        if ret < 0 {
            return Err(os_error_from_errno());
        }
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::*;

    pub(super) fn read_time() -> Result<f64, ClockError> {
        Err(ClockError::Unsupported)
    }

    pub(super) fn pending_slew() -> Result<f64, ClockError> {
        Err(ClockError::Unsupported)
    }

    pub(super) fn pending_pll_offset() -> Result<f64, ClockError> {
        Err(ClockError::Unsupported)
    }

    pub(super) fn step(_offset_seconds: f64) -> Result<(), ClockError> {
        Err(ClockError::Unsupported)
    }

    pub(super) fn slew(_offset_seconds: f64) -> Result<(), ClockError> {
        Err(ClockError::Unsupported)
    }

    pub(super) fn adjust_pll(_offset_seconds: f64, _frequency: f64) -> Result<(), ClockError> {
        Err(ClockError::Unsupported)
    }

    pub(super) fn set_pll_frequency(_frequency: f64) -> Result<(), ClockError> {
        Err(ClockError::Unsupported)
    }

    pub(super) fn reset_discipline() -> Result<(), ClockError> {
        Err(ClockError::Unsupported)
    }
}
