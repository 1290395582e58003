// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for packet decoding and key loading.
//!
//! [`DecodeError`] covers the receive path: both variants are protocol
//! errors — the offending datagram is dropped and processing continues.
//! [`KeyError`] covers key-file loading at startup and is always fatal.

use std::fmt;
use std::io;

use crate::auth::KEY_SIZE;

/// Errors that can occur while decoding a timestamp packet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// The buffer length does not exactly match the packet size for the
    /// configured authentication mode.
    SizeMismatch {
        /// Exact number of bytes expected.
        expected: usize,
        /// Number of bytes available.
        actual: usize,
    },
    /// The trailing MAC did not verify against the shared key.
    AuthFailure,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::SizeMismatch { expected, actual } => {
                write!(
                    f,
                    "packet size mismatch: expected exactly {} bytes, got {}",
                    expected, actual
                )
            }
            DecodeError::AuthFailure => write!(f, "packet authentication failure (HMAC mismatch)"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for io::Error {
    fn from(err: DecodeError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

/// Errors that can occur while loading the shared key from a file.
#[derive(Debug)]
pub enum KeyError {
    /// The key file could not be opened or read.
    Io(io::Error),
    /// The key file does not contain exactly [`KEY_SIZE`] bytes.
    WrongLength {
        /// Number of bytes the file actually contained.
        actual: usize,
    },
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::Io(err) => write!(f, "cannot read key file: {}", err),
            KeyError::WrongLength { actual } => {
                write!(
                    f,
                    "key file must contain exactly {} bytes, found {}",
                    KEY_SIZE, actual
                )
            }
        }
    }
}

impl std::error::Error for KeyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KeyError::Io(err) => Some(err),
            KeyError::WrongLength { .. } => None,
        }
    }
}

impl From<io::Error> for KeyError {
    fn from(err: io::Error) -> KeyError {
        KeyError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_size_mismatch() {
        let err = DecodeError::SizeMismatch {
            expected: 44,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "packet size mismatch: expected exactly 44 bytes, got 12"
        );
    }

    #[test]
    fn test_display_auth_failure() {
        assert_eq!(
            DecodeError::AuthFailure.to_string(),
            "packet authentication failure (HMAC mismatch)"
        );
    }

    #[test]
    fn test_into_io_error() {
        let io_err: io::Error = DecodeError::AuthFailure.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_key_error_display() {
        let err = KeyError::WrongLength { actual: 16 };
        assert_eq!(
            err.to_string(),
            "key file must contain exactly 32 bytes, found 16"
        );
    }

    #[test]
    fn test_decode_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(DecodeError::AuthFailure);
        assert!(err.to_string().contains("HMAC"));
    }
}
