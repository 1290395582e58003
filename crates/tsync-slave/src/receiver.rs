// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The blocking receive loop.
//!
//! One datagram in, fully processed, synchronously, before the next
//! receive — there is no concurrency anywhere in the slave. Every
//! datagram passes three gates before it reaches the phase handler:
//!
//! 1. **Exact size.** The buffer is one byte larger than the wire size,
//!    so over-long datagrams are observed as such rather than silently
//!    truncated, and rejected together with short ones.
//! 2. **Authentication.** With a key configured, the trailing MAC must
//!    verify.
//! 3. **Replay.** The packet index must be strictly greater than any
//!    previously accepted index.
//!
//! Failing any gate drops the packet with a warning and the loop keeps
//! going; dropped packets are never retried and never escalate. The
//! loop exits cleanly when the packet budget is exhausted or the phase
//! declares itself complete, and the phase's `finish()` runs on every
//! exit path.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use tsync_proto::{DecodeError, Key, TimestampPacket, packet_size};

use crate::config::SlaveConfig;
use crate::error::{ConfigError, SlaveError};
use crate::phase::{PhaseStatus, SampleHandler};
use crate::stats::RunningStats;

/// Why an incoming datagram was discarded. Always non-fatal.
#[derive(Debug)]
enum Discard {
    Decode(DecodeError),
    Stale { index: u32, last: u32 },
}

impl std::fmt::Display for Discard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discard::Decode(err) => write!(f, "{}", err),
            Discard::Stale { index, last } => {
                write!(f, "stale index {} (last accepted {})", index, last)
            }
        }
    }
}

/// The slave's receive loop, owning the socket and the phase handler.
pub struct Receiver<H: SampleHandler> {
    socket: UdpSocket,
    key: Option<Key>,
    buf: Vec<u8>,
    last_idx: u32,
    budget: Option<u64>,
    delta_stats: RunningStats,
    handler: H,
}

impl<H: SampleHandler> Receiver<H> {
    /// Validate the configuration, load the key, and bind the socket.
    pub fn bind(config: &SlaveConfig, handler: H) -> Result<Self, SlaveError> {
        config.validate()?;
        let key = match &config.key_file {
            Some(path) => Some(Key::from_file(path).map_err(ConfigError::Key)?),
            None => None,
        };
        let socket = UdpSocket::bind(config.bind_addr)?;
        let pkt_size = packet_size(key.is_some());
        info!(
            "listening on {} ({})",
            socket.local_addr()?,
            if key.is_some() {
                "authenticated"
            } else {
                "unauthenticated"
            }
        );
        Ok(Receiver {
            socket,
            key,
            // One extra byte so datagrams longer than the wire size are
            // detected instead of truncated to a valid length.
            buf: vec![0u8; pkt_size + 1],
            last_idx: 0,
            budget: config.max_pkt_cnt,
            delta_stats: RunningStats::new(),
            handler,
        })
    }

    /// The bound local address (useful when binding port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Access the phase handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Run the receive loop to completion, then finalize the phase.
    pub fn run(&mut self) -> Result<(), SlaveError> {
        let outcome = self.recv_loop();
        // The phase result is persisted on every exit path; an error
        // during finalization only surfaces if the loop itself was
        // healthy.
        match self.handler.finish() {
            Ok(()) => outcome,
            Err(fin_err) => match outcome {
                Ok(()) => Err(fin_err),
                Err(loop_err) => {
                    warn!("failure finalizing phase: {fin_err}");
                    Err(loop_err)
                }
            },
        }
    }

    fn recv_loop(&mut self) -> Result<(), SlaveError> {
        loop {
            let (len, src) = match self.socket.recv_from(&mut self.buf) {
                Ok(received) => received,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(SlaveError::Io(err)),
            };
            let clk_time = wall_clock_seconds();
            debug!("received packet from {}", src);

            let pkt = match self.accept(len) {
                Ok(pkt) => pkt,
                Err(reason) => {
                    warn!("discarded packet: {}", reason);
                    continue;
                }
            };

            let ts_time = pkt.seconds as f64 + pkt.nanoseconds as f64 * 1e-9;
            let time_delta = clk_time - ts_time;
            debug!(
                "idx {:09} secs: {:09} nsecs: {:09}",
                pkt.index, pkt.seconds, pkt.nanoseconds
            );
            debug!("time delta: {:.9}", time_delta);
            self.delta_stats.add(time_delta);

            let status = self.handler.handle(clk_time, time_delta)?;

            if let Some(budget) = &mut self.budget {
                *budget -= 1;
                if *budget == 0 {
                    info!("finished receiving timestamps");
                    return Ok(());
                }
            }
            if status == PhaseStatus::Complete {
                info!("phase complete");
                return Ok(());
            }
        }
    }

    /// Size, authentication, and replay gates. The codec enforces the
    /// exact wire size, so a datagram that filled the oversized buffer
    /// is rejected here as a size mismatch.
    fn accept(&mut self, len: usize) -> Result<TimestampPacket, Discard> {
        let pkt = TimestampPacket::decode(&self.buf[..len], self.key.as_ref())
            .map_err(Discard::Decode)?;
        if pkt.index <= self.last_idx {
            return Err(Discard::Stale {
                index: pkt.index,
                last: self.last_idx,
            });
        }
        self.last_idx = pkt.index;
        Ok(pkt)
    }
}

/// Wall-clock reading as fractional seconds since the Unix epoch.
/// A pre-epoch clock (never the case on a sane system) reads as zero.
fn wall_clock_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
