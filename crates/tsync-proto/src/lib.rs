// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Wire format and keyed authentication for the tsync timestamp protocol.
//!
//! A master periodically emits timestamp packets; each packet carries a
//! monotonically increasing index (anti-replay nonce), the master's
//! wall-clock time split into seconds and nanoseconds, and — when the
//! secure protocol is enabled — an HMAC-SHA256 tag over the preceding
//! bytes.
//!
//! ## Wire layout
//!
//! All fields are fixed-width, network byte order:
//!
//! ```ignore
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             Index                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                            Seconds                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          Nanoseconds                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! |                  HMAC-SHA256 (optional, 32 bytes)             |
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total size is 12 bytes unauthenticated, 44 bytes authenticated. A
//! receiver must reject any datagram whose length differs from the
//! configured mode's exact size before attempting to parse it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod error;
pub mod packet;

pub use auth::{KEY_SIZE, Key, MAC_SIZE, mac, verify};
pub use error::{DecodeError, KeyError};
pub use packet::{BASE_PACKET_SIZE, TimestampPacket, packet_size};

/// Default UDP port for timestamp packet exchange.
pub const PORT: u16 = 4242;
