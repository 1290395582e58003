// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

// Emits timestamp packets to a slave.
//
//   RUST_LOG=info cargo run -p tsync-master --example master -- 192.0.2.17:4242
//
// Without an argument the packets go to a slave on localhost.

use std::process::ExitCode;

use tsync_master::{Emitter, MasterConfig};

fn main() -> ExitCode {
    env_logger::init();

    let mut config = MasterConfig {
        period_ms: 1000,
        stagger_ms: 250,
        ..Default::default()
    };
    if let Some(dest) = std::env::args().nth(1) {
        match dest.parse() {
            Ok(addr) => config.dest_addr = addr,
            Err(_) => {
                eprintln!("usage: master [slave-address:port]");
                return ExitCode::FAILURE;
            }
        }
    }

    match Emitter::from_config(&config).and_then(|mut emitter| emitter.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("master failed: {err}");
            ExitCode::FAILURE
        }
    }
}
