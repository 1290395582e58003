// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Keyed packet authentication: HMAC-SHA256 over the packet body.
//!
//! The shared secret is exactly 32 bytes, loaded once at startup and held
//! read-only for the lifetime of the process. The MAC is the standard
//! inner/outer padding construction over a 64-byte-block, 32-byte-digest
//! compression hash (`H(opad ‖ H(ipad ‖ message))`), provided by the
//! `hmac`/`sha2` crates. Verification compares the full digest in
//! constant time.

use std::fmt;
use std::fs;
use std::path::Path;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::KeyError;

/// Size of the shared key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the authentication tag in bytes.
pub const MAC_SIZE: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// The shared 256-bit packet-authentication key.
///
/// Wrong-sized key material is a configuration error caught at load
/// time; once a `Key` exists, every MAC operation is infallible.
#[derive(Clone, Eq, PartialEq)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Key(bytes)
    }

    /// Load the key from a file that must contain exactly [`KEY_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// [`KeyError::Io`] if the file cannot be read;
    /// [`KeyError::WrongLength`] if it is shorter or longer than 32 bytes.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, KeyError> {
        let raw = fs::read(path)?;
        let bytes: [u8; KEY_SIZE] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::WrongLength { actual: raw.len() })?;
        Ok(Key(bytes))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

// Never print key material, even at debug level.
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

/// Compute the HMAC-SHA256 tag of `message` under `key`.
pub fn mac(key: &Key, message: &[u8]) -> [u8; MAC_SIZE] {
    let mut m = HmacSha256::new_from_slice(&key.0).expect("HMAC accepts any key length");
    m.update(message);
    m.finalize().into_bytes().into()
}

/// Verify an HMAC-SHA256 tag in constant time.
///
/// Returns `false` for a tag of any length other than [`MAC_SIZE`];
/// never panics.
pub fn verify(key: &Key, message: &[u8], expected: &[u8]) -> bool {
    let mut m = HmacSha256::new_from_slice(&key.0).expect("HMAC accepts any key length");
    m.update(message);
    m.verify_slice(expected).is_ok()
}
