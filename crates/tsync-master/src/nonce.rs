// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Persisted anti-replay index.
//!
//! The nonce file holds the next packet index as a fixed-width
//! nine-digit decimal string. It is rewritten in place and flushed
//! after every emission, so a master restarted at any point resumes
//! beyond every index it may already have sent — the slave's
//! strictly-greater index check then never mistakes a fresh packet for
//! a replay.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// The nonce file, kept open for the lifetime of the emitter.
#[derive(Debug)]
pub struct NonceStore {
    file: File,
}

impl NonceStore {
    /// Open an existing nonce file and read the stored index, or create
    /// the file seeded with `initial`.
    pub fn load_or_create<P: AsRef<Path>>(path: P, initial: u32) -> io::Result<(Self, u32)> {
        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(mut file) => {
                let mut text = String::new();
                file.read_to_string(&mut text)?;
                let idx = text.trim().parse::<u32>().map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "nonce file '{}' does not contain a decimal index",
                            path.as_ref().display()
                        ),
                    )
                })?;
                Ok((NonceStore { file }, idx))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)?;
                let mut store = NonceStore { file };
                store.store(initial)?;
                Ok((store, initial))
            }
            Err(err) => Err(err),
        }
    }

    /// Overwrite the stored index (nine-digit fixed width) and flush it
    /// to disk.
    pub fn store(&mut self, idx: u32) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        write!(self.file, "{idx:09}")?;
        self.file.flush()?;
        Ok(())
    }
}
