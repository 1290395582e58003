// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

// Runs one slave phase against a live master.
//
//   RUST_LOG=info cargo run -p tsync-slave --example slave -- precalibr
//   RUST_LOG=info cargo run -p tsync-slave --example slave -- calibr
//   RUST_LOG=info cargo run -p tsync-slave --example slave -- synch
//
// The synchronization phase needs root to touch the system clock.

use std::process::ExitCode;

use tsync_slave::calibr::Calibration;
use tsync_slave::clock::SystemClock;
use tsync_slave::config::{SlaveConfig, SyncMethod};
use tsync_slave::phase::PhaseKind;
use tsync_slave::precalibr::Precalibration;
use tsync_slave::receiver::Receiver;
use tsync_slave::synch::Synchronization;

fn main() -> ExitCode {
    env_logger::init();

    let phase = match std::env::args().nth(1).as_deref() {
        Some("precalibr") => PhaseKind::Precalibration,
        Some("calibr") => PhaseKind::Calibration,
        Some("synch") => PhaseKind::Synchronization,
        _ => {
            eprintln!("usage: slave <precalibr|calibr|synch>");
            return ExitCode::FAILURE;
        }
    };

    let config = SlaveConfig {
        phase,
        obs_win: 100,
        max_pkt_cnt: match phase {
            PhaseKind::Synchronization => None,
            _ => Some(1000),
        },
        method: SyncMethod::Smooth,
        qs_rounds: if phase == PhaseKind::Synchronization { 3 } else { 0 },
        ..Default::default()
    };

    let outcome = match phase {
        PhaseKind::Precalibration => Receiver::bind(&config, Precalibration::new(&config))
            .and_then(|mut receiver| receiver.run()),
        PhaseKind::Calibration => Calibration::new(&config)
            .and_then(|handler| Receiver::bind(&config, handler))
            .and_then(|mut receiver| receiver.run()),
        PhaseKind::Synchronization => Synchronization::new(&config, SystemClock)
            .and_then(|handler| Receiver::bind(&config, handler))
            .and_then(|mut receiver| receiver.run()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("slave failed: {err}");
            ExitCode::FAILURE
        }
    }
}
