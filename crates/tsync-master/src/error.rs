// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the master.

use std::fmt;
use std::io;

use tsync_proto::KeyError;

/// Fatal errors surfaced by a master run.
#[derive(Debug)]
pub enum MasterError {
    /// Invalid configuration, rejected before the first emission.
    Config(ConfigError),
    /// Socket or nonce-file I/O failure.
    Io(io::Error),
}

impl fmt::Display for MasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasterError::Config(err) => write!(f, "configuration error: {}", err),
            MasterError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for MasterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MasterError::Config(err) => Some(err),
            MasterError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for MasterError {
    fn from(err: ConfigError) -> MasterError {
        MasterError::Config(err)
    }
}

impl From<io::Error> for MasterError {
    fn from(err: io::Error) -> MasterError {
        MasterError::Io(err)
    }
}

/// Configuration errors, always fatal at startup.
#[derive(Debug)]
pub enum ConfigError {
    /// The shared key could not be loaded or has the wrong size.
    Key(KeyError),
    /// A parameter is out of bounds or inconsistent.
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Key(err) => write!(f, "{}", err),
            ConfigError::InvalidParameter { name, reason } => {
                write!(f, "invalid '{}': {}", name, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Key(err) => Some(err),
            ConfigError::InvalidParameter { .. } => None,
        }
    }
}

impl From<KeyError> for ConfigError {
    fn from(err: KeyError) -> ConfigError {
        ConfigError::Key(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = MasterError::Config(ConfigError::InvalidParameter {
            name: "period_ms",
            reason: "must be positive",
        });
        assert_eq!(
            err.to_string(),
            "configuration error: invalid 'period_ms': must be positive"
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: MasterError = io::Error::new(io::ErrorKind::AddrInUse, "busy").into();
        assert!(matches!(err, MasterError::Io(_)));
    }
}
