// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Persisted scalar hand-off between phase invocations.
//!
//! Each phase writes its single result — a frequency offset or a
//! latency offset in seconds — as one newline-terminated decimal with
//! nine fractional digits (nanosecond resolution). The next phase,
//! launched as a separate process, reads it back. Failures here are
//! resource errors: fatal, surfaced immediately, never retried.

use std::fs;
use std::io;
use std::path::Path;

/// Write a phase result scalar.
pub fn write_scalar<P: AsRef<Path>>(path: P, value: f64) -> io::Result<()> {
    fs::write(path, format!("{value:.9}\n"))
}

/// Read a phase result scalar written by [`write_scalar`].
pub fn read_scalar<P: AsRef<Path>>(path: P) -> io::Result<f64> {
    let text = fs::read_to_string(&path)?;
    text.trim().parse::<f64>().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "result file '{}' does not contain a decimal value",
                path.as_ref().display()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tsync-results-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_roundtrip() {
        let path = temp_path("roundtrip");
        write_scalar(&path, -4.25e-6).unwrap();
        let v = read_scalar(&path).unwrap();
        assert!((v - (-4.25e-6)).abs() < 1e-12);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_format_is_nine_digit_decimal() {
        let path = temp_path("format");
        write_scalar(&path, 0.5).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0.500000000\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = read_scalar(temp_path("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_garbage_content() {
        let path = temp_path("garbage");
        fs::write(&path, "not a number\n").unwrap();
        let err = read_scalar(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_negative_value() {
        let path = temp_path("negative");
        write_scalar(&path, -0.000001234).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "-0.000001234\n");
        fs::remove_file(&path).unwrap();
    }
}
