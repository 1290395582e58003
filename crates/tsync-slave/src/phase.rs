// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The phase abstraction.
//!
//! A slave run executes exactly one phase; the phases form a linear
//! pipeline with no cycles, connected only through persisted result
//! files. Each phase consumes the stream of accepted `(local_time,
//! master_time_delta)` pairs the receive loop produces and may declare
//! itself complete before the packet budget runs out.

use crate::error::SlaveError;

/// Which phase a slave invocation runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PhaseKind {
    /// Estimate the local-clock frequency offset.
    Precalibration,
    /// Estimate the reference path latency.
    Calibration,
    /// Discipline the clock toward the master.
    Synchronization,
}

/// Whether the phase wants more samples.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PhaseStatus {
    /// Keep feeding samples.
    Continue,
    /// The phase has everything it needs; exit the receive loop.
    Complete,
}

/// A consumer of accepted timestamp samples.
///
/// `clk_time` is the slave's wall-clock reading at packet reception;
/// `time_delta` is `clk_time − master_time` — path latency plus clock
/// offset, the raw observable everything downstream works from.
pub trait SampleHandler {
    /// Consume one accepted sample.
    fn handle(&mut self, clk_time: f64, time_delta: f64) -> Result<PhaseStatus, SlaveError>;

    /// Persist the phase's result. Runs on every clean exit from the
    /// receive loop, including budget exhaustion.
    fn finish(&mut self) -> Result<(), SlaveError>;
}
