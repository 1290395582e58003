// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Slave-side clock discipline for the tsync timestamp protocol.
//!
//! A slave receives authenticated timestamp packets from a master,
//! estimates path latency and local-clock frequency offset with
//! streaming statistics, and — in the final phase — drives a feedback
//! controller that disciplines the system clock toward the master's.
//!
//! Operation is split into three phases, each run as a separate process
//! invocation against the same packet stream:
//!
//! 1. [`Precalibration`](precalibr::Precalibration) estimates the
//!    local-clock frequency offset from the slope of window medians.
//! 2. [`Calibration`](calibr::Calibration) estimates the reference path
//!    latency as the median of frequency-corrected deltas.
//! 3. [`Synchronization`](synch::Synchronization) steers the clock with
//!    step, smooth-slew, or PLL-frequency corrections.
//!
//! Phases hand results to each other only through small persisted
//! scalar files ([`results`]), never shared memory.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod calibr;
pub mod clock;
pub mod config;
pub mod drift;
pub mod error;
pub mod least_squares;
pub mod percentile;
pub mod phase;
pub mod precalibr;
pub mod receiver;
pub mod results;
pub mod stats;
pub mod summary;
pub mod synch;

pub use clock::{ClockControl, ClockError, SystemClock};
pub use config::{SlaveConfig, SyncMethod};
pub use error::{ConfigError, SlaveError};
pub use phase::{PhaseKind, PhaseStatus, SampleHandler};
pub use receiver::Receiver;
