// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Master configuration and socket setup.
//!
//! Validated once before the first emission; violations are fatal.
//! Socket options the std API does not expose (IP TOS) go through
//! `socket2`.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6, UdpSocket};
use std::path::PathBuf;

use socket2::{Domain, Protocol, Socket, Type};
use tsync_proto::PORT;

use crate::error::ConfigError;

/// Longest accepted emission period: one day in milliseconds.
pub const MAX_PERIOD_MS: u64 = 86_400_000;

/// Configuration for a master run.
#[derive(Clone, Debug)]
pub struct MasterConfig {
    /// Destination (slave) address; may be a broadcast address when
    /// `broadcast` is set.
    pub dest_addr: SocketAddr,
    /// Nominal emission period in milliseconds.
    pub period_ms: u64,
    /// Random stagger half-width in milliseconds; each delay is drawn
    /// uniformly from `period ± stagger`.
    pub stagger_ms: u64,
    /// Number of packets to emit before a clean exit; `None` emits
    /// until interrupted.
    pub max_pkt_cnt: Option<u64>,
    /// Allow sending to broadcast addresses.
    pub broadcast: bool,
    /// IP TOS byte for emitted packets, if any.
    pub tos: Option<u8>,
    /// Path to the 32-byte shared key; `None` disables authentication.
    pub key_file: Option<PathBuf>,
    /// Path of the persisted-index nonce file (used only when a key is
    /// configured).
    pub nonce_file: PathBuf,
}

impl Default for MasterConfig {
    fn default() -> Self {
        MasterConfig {
            dest_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, PORT)),
            period_ms: 1000,
            stagger_ms: 250,
            max_pkt_cnt: None,
            broadcast: false,
            tos: None,
            key_file: None,
            nonce_file: PathBuf::from("nonce.txt"),
        }
    }
}

impl MasterConfig {
    /// Check all bounds; every violation is fatal before startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 || self.period_ms > MAX_PERIOD_MS {
            return Err(ConfigError::InvalidParameter {
                name: "period_ms",
                reason: "must be between 1 and 86400000",
            });
        }
        if self.stagger_ms >= self.period_ms {
            return Err(ConfigError::InvalidParameter {
                name: "stagger_ms",
                reason: "must be smaller than the period",
            });
        }
        if self.max_pkt_cnt == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_pkt_cnt",
                reason: "must be at least 1 when bounded",
            });
        }
        Ok(())
    }

    /// Create the emission socket with the configured options applied.
    pub(crate) fn open_socket(&self) -> io::Result<UdpSocket> {
        let domain = if self.dest_addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        if let Some(tos) = self.tos
            && self.dest_addr.is_ipv4()
        {
            socket.set_tos_v4(tos as u32)?;
        }
        socket.set_broadcast(self.broadcast)?;
        let bind_addr: SocketAddr = if self.dest_addr.is_ipv4() {
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0))
        };
        socket.bind(&bind_addr.into())?;
        Ok(socket.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        MasterConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = MasterConfig {
            period_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stagger_must_be_below_period() {
        let config = MasterConfig {
            period_ms: 100,
            stagger_ms: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = MasterConfig {
            max_pkt_cnt: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_open_socket_plain() {
        let config = MasterConfig::default();
        let socket = config.open_socket().unwrap();
        assert!(socket.local_addr().unwrap().ip().is_unspecified());
    }

    #[test]
    fn test_open_socket_with_tos() {
        let config = MasterConfig {
            tos: Some(0x10),
            ..Default::default()
        };
        config.open_socket().unwrap();
    }
}
