// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the packet codec.

use proptest::prelude::*;
use tsync_proto::{DecodeError, KEY_SIZE, Key, TimestampPacket, packet_size};

proptest! {
    #[test]
    fn roundtrip_plain(index in any::<u32>(), seconds in any::<u32>(), nanoseconds in any::<u32>()) {
        let pkt = TimestampPacket { index, seconds, nanoseconds };
        let buf = pkt.encode(None);
        prop_assert_eq!(TimestampPacket::decode(&buf, None).unwrap(), pkt);
    }

    #[test]
    fn roundtrip_authenticated(
        index in any::<u32>(),
        seconds in any::<u32>(),
        nanoseconds in any::<u32>(),
        key_bytes in any::<[u8; KEY_SIZE]>(),
    ) {
        let key = Key::new(key_bytes);
        let pkt = TimestampPacket { index, seconds, nanoseconds };
        let buf = pkt.encode(Some(&key));
        prop_assert_eq!(TimestampPacket::decode(&buf, Some(&key)).unwrap(), pkt);
    }

    #[test]
    fn any_single_bit_flip_breaks_authentication(
        index in any::<u32>(),
        seconds in any::<u32>(),
        nanoseconds in any::<u32>(),
        key_bytes in any::<[u8; KEY_SIZE]>(),
        byte in 0..packet_size(true),
        bit in 0u8..8,
    ) {
        let key = Key::new(key_bytes);
        let pkt = TimestampPacket { index, seconds, nanoseconds };
        let mut buf = pkt.encode(Some(&key));
        buf[byte] ^= 1 << bit;
        prop_assert_eq!(
            TimestampPacket::decode(&buf, Some(&key)),
            Err(DecodeError::AuthFailure)
        );
    }
}
