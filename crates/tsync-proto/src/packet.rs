// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Timestamp packet encoding and decoding.
//!
//! The packet is three 32-bit big-endian fields — index, seconds,
//! nanoseconds — optionally followed by an HMAC-SHA256 tag over those 12
//! bytes. The packet size is fixed per authentication mode; a receiver
//! rejects any other length before parsing, as a defense against
//! malformed or truncated datagrams.

use crate::auth::{self, Key, MAC_SIZE};
use crate::error::DecodeError;

/// Size of the unauthenticated packet body in bytes (index + seconds + nanoseconds).
pub const BASE_PACKET_SIZE: usize = 12;

/// Exact on-wire packet size for the given authentication mode.
pub const fn packet_size(authenticated: bool) -> usize {
    if authenticated {
        BASE_PACKET_SIZE + MAC_SIZE
    } else {
        BASE_PACKET_SIZE
    }
}

/// A master timestamp sample as carried on the wire.
///
/// The index is a monotonically increasing anti-replay counter: a
/// receiver accepts a packet only if its index is strictly greater than
/// any previously accepted index. Seconds and nanoseconds carry the
/// master's wall-clock reading at emission time.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TimestampPacket {
    /// Anti-replay packet counter, strictly increasing per session.
    pub index: u32,
    /// Wall-clock seconds component.
    pub seconds: u32,
    /// Wall-clock sub-second component in nanoseconds.
    pub nanoseconds: u32,
}

impl TimestampPacket {
    /// Serialize into a caller-provided buffer, authenticating when a
    /// key is supplied. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`DecodeError::SizeMismatch`] if `buf` is shorter than the packet
    /// size for the chosen mode.
    pub fn encode_into(&self, buf: &mut [u8], key: Option<&Key>) -> Result<usize, DecodeError> {
        let size = packet_size(key.is_some());
        if buf.len() < size {
            return Err(DecodeError::SizeMismatch {
                expected: size,
                actual: buf.len(),
            });
        }
        buf[0..4].copy_from_slice(&self.index.to_be_bytes());
        buf[4..8].copy_from_slice(&self.seconds.to_be_bytes());
        buf[8..12].copy_from_slice(&self.nanoseconds.to_be_bytes());
        if let Some(key) = key {
            let tag = auth::mac(key, &buf[..BASE_PACKET_SIZE]);
            buf[BASE_PACKET_SIZE..size].copy_from_slice(&tag);
        }
        Ok(size)
    }

    /// Serialize into a freshly allocated buffer of the exact wire size.
    pub fn encode(&self, key: Option<&Key>) -> Vec<u8> {
        let mut buf = vec![0u8; packet_size(key.is_some())];
        // The buffer is sized exactly; encoding cannot fail.
        let _ = self.encode_into(&mut buf, key);
        buf
    }

    /// Parse a datagram, verifying the MAC when a key is supplied.
    ///
    /// # Errors
    ///
    /// [`DecodeError::SizeMismatch`] if `buf` is not exactly the wire
    /// size for the mode — checked before any field is parsed.
    /// [`DecodeError::AuthFailure`] if the trailing MAC does not verify;
    /// the fields of a failed packet are never exposed.
    pub fn decode(buf: &[u8], key: Option<&Key>) -> Result<TimestampPacket, DecodeError> {
        let expected = packet_size(key.is_some());
        if buf.len() != expected {
            return Err(DecodeError::SizeMismatch {
                expected,
                actual: buf.len(),
            });
        }
        if let Some(key) = key
            && !auth::verify(key, &buf[..BASE_PACKET_SIZE], &buf[BASE_PACKET_SIZE..])
        {
            return Err(DecodeError::AuthFailure);
        }
        Ok(TimestampPacket {
            index: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            seconds: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            nanoseconds: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::KEY_SIZE;

    fn test_key() -> Key {
        Key::new([0xa5; KEY_SIZE])
    }

    fn sample() -> TimestampPacket {
        TimestampPacket {
            index: 42,
            seconds: 1_700_000_000,
            nanoseconds: 999_999_999,
        }
    }

    #[test]
    fn test_packet_sizes() {
        assert_eq!(packet_size(false), 12);
        assert_eq!(packet_size(true), 44);
    }

    #[test]
    fn test_roundtrip_plain() {
        let buf = sample().encode(None);
        assert_eq!(buf.len(), 12);
        assert_eq!(TimestampPacket::decode(&buf, None).unwrap(), sample());
    }

    #[test]
    fn test_roundtrip_authenticated() {
        let key = test_key();
        let buf = sample().encode(Some(&key));
        assert_eq!(buf.len(), 44);
        assert_eq!(
            TimestampPacket::decode(&buf, Some(&key)).unwrap(),
            sample()
        );
    }

    #[test]
    fn test_big_endian_layout() {
        let pkt = TimestampPacket {
            index: 0x01020304,
            seconds: 0x05060708,
            nanoseconds: 0x090a0b0c,
        };
        let buf = pkt.encode(None);
        assert_eq!(
            buf,
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c]
        );
    }

    #[test]
    fn test_decode_rejects_wrong_sizes() {
        let buf = sample().encode(None);
        for len in [0, 1, 11, 13, 44] {
            let padded = vec![0u8; len];
            let res = TimestampPacket::decode(&padded, None);
            assert_eq!(
                res,
                Err(DecodeError::SizeMismatch {
                    expected: 12,
                    actual: len
                })
            );
        }
        // A plain packet presented to an authenticated receiver is a size
        // mismatch, not an auth failure.
        let key = test_key();
        assert_eq!(
            TimestampPacket::decode(&buf, Some(&key)),
            Err(DecodeError::SizeMismatch {
                expected: 44,
                actual: 12
            })
        );
    }

    #[test]
    fn test_decode_rejects_tampered_body() {
        let key = test_key();
        let mut buf = sample().encode(Some(&key));
        buf[5] ^= 0x01;
        assert_eq!(
            TimestampPacket::decode(&buf, Some(&key)),
            Err(DecodeError::AuthFailure)
        );
    }

    #[test]
    fn test_decode_rejects_tampered_mac() {
        let key = test_key();
        let mut buf = sample().encode(Some(&key));
        buf[43] ^= 0x80;
        assert_eq!(
            TimestampPacket::decode(&buf, Some(&key)),
            Err(DecodeError::AuthFailure)
        );
    }

    #[test]
    fn test_decode_rejects_wrong_key() {
        let buf = sample().encode(Some(&test_key()));
        let other = Key::new([0x5a; KEY_SIZE]);
        assert_eq!(
            TimestampPacket::decode(&buf, Some(&other)),
            Err(DecodeError::AuthFailure)
        );
    }

    #[test]
    fn test_encode_into_short_buffer() {
        let mut buf = [0u8; 11];
        let res = sample().encode_into(&mut buf, None);
        assert_eq!(
            res,
            Err(DecodeError::SizeMismatch {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn test_encode_into_reports_written_size() {
        let mut buf = [0u8; 64];
        assert_eq!(sample().encode_into(&mut buf, None).unwrap(), 12);
        assert_eq!(
            sample().encode_into(&mut buf, Some(&test_key())).unwrap(),
            44
        );
    }

    #[test]
    fn test_field_extremes_roundtrip() {
        let key = test_key();
        for pkt in [
            TimestampPacket::default(),
            TimestampPacket {
                index: u32::MAX,
                seconds: u32::MAX,
                nanoseconds: u32::MAX,
            },
        ] {
            let buf = pkt.encode(Some(&key));
            assert_eq!(TimestampPacket::decode(&buf, Some(&key)).unwrap(), pkt);
        }
    }
}
