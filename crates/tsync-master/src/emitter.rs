// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The emission scheduler.
//!
//! An explicit single-threaded loop: read the wall clock, encode and
//! send one packet, persist the next index, sleep a freshly drawn
//! staggered delay, repeat. The loop owns all of its state — there are
//! no timers, signals, or globals involved.

use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use rand::Rng;
use tsync_proto::{Key, TimestampPacket, packet_size};

use crate::config::MasterConfig;
use crate::error::{ConfigError, MasterError};
use crate::nonce::NonceStore;

/// What a single emission attempt did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EmitOutcome {
    /// Packet sent; more remain in the budget.
    Sent,
    /// Transient send failure; the packet was not sent and the index
    /// was not consumed.
    Skipped,
    /// Packet sent and the budget is now exhausted.
    Finished,
}

/// Periodic timestamp packet emitter.
pub struct Emitter {
    socket: UdpSocket,
    dest: SocketAddr,
    period: Duration,
    stagger_ms: u64,
    idx: u32,
    budget: Option<u64>,
    key: Option<Key>,
    nonce: Option<NonceStore>,
    buf: Vec<u8>,
}

impl Emitter {
    /// Validate the configuration, load the key, open the socket, and
    /// resume the index sequence from the nonce store.
    pub fn from_config(config: &MasterConfig) -> Result<Self, MasterError> {
        config.validate()?;
        let key = match &config.key_file {
            Some(path) => Some(Key::from_file(path).map_err(ConfigError::Key)?),
            None => None,
        };
        let socket = config.open_socket()?;

        // Without authentication there is no replay protection to
        // preserve across restarts, so no nonce file is kept.
        let (nonce, idx) = if key.is_some() {
            let (store, idx) = NonceStore::load_or_create(&config.nonce_file, 1)?;
            (Some(store), idx)
        } else {
            (None, 1)
        };

        info!(
            "emitting to {} every {}ms (±{}ms), starting at index {}",
            config.dest_addr, config.period_ms, config.stagger_ms, idx
        );

        Ok(Emitter {
            socket,
            dest: config.dest_addr,
            period: Duration::from_millis(config.period_ms),
            stagger_ms: config.stagger_ms,
            idx,
            budget: config.max_pkt_cnt,
            buf: vec![0u8; packet_size(key.is_some())],
            key,
            nonce,
        })
    }

    /// The next packet index to be emitted.
    pub fn next_index(&self) -> u32 {
        self.idx
    }

    /// Emit one timestamp packet.
    pub fn emit_once(&mut self) -> Result<EmitOutcome, MasterError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        let pkt = TimestampPacket {
            index: self.idx,
            seconds: now.as_secs() as u32,
            nanoseconds: now.subsec_nanos(),
        };
        // The buffer is sized exactly at construction.
        pkt.encode_into(&mut self.buf, self.key.as_ref())
            .map_err(std::io::Error::from)?;

        match self.socket.send_to(&self.buf, self.dest) {
            Ok(_) => {}
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
                ) =>
            {
                warn!("transient send failure: {err}");
                return Ok(EmitOutcome::Skipped);
            }
            Err(err) => return Err(MasterError::Io(err)),
        }

        info!("sending packet to {}", self.dest);
        debug!(
            "idx {:09} secs: {:09} nsecs: {:09}",
            pkt.index, pkt.seconds, pkt.nanoseconds
        );

        self.idx += 1;
        if let Some(nonce) = &mut self.nonce {
            nonce.store(self.idx)?;
        }
        if let Some(budget) = &mut self.budget {
            *budget -= 1;
            if *budget == 0 {
                return Ok(EmitOutcome::Finished);
            }
        }
        Ok(EmitOutcome::Sent)
    }

    /// Draw the delay until the next emission:
    /// `period − stagger + uniform(0, 2 × stagger)`.
    pub fn next_delay(&self) -> Duration {
        if self.stagger_ms == 0 {
            return self.period;
        }
        let jitter = rand::thread_rng().gen_range(0..2 * self.stagger_ms);
        self.period - Duration::from_millis(self.stagger_ms) + Duration::from_millis(jitter)
    }

    /// Emit until the budget is exhausted, sleeping a staggered delay
    /// between packets.
    pub fn run(&mut self) -> Result<(), MasterError> {
        loop {
            if self.emit_once()? == EmitOutcome::Finished {
                info!("finished emitting timestamps");
                return Ok(());
            }
            let delay = self.next_delay();
            debug!("waiting for {}ms", delay.as_millis());
            thread::sleep(delay);
        }
    }
}
