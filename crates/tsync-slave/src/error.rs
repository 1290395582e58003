// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the slave.
//!
//! Protocol-level failures (bad size, bad MAC, replayed index) never
//! appear here: they are dropped and logged inside the receive loop and
//! processing continues. `SlaveError` covers the conditions that
//! terminate a run — configuration errors caught at startup, resource
//! failures (sockets, result files), clock discipline failures, and
//! phase-sequencing violations.

use std::fmt;
use std::io;

use tsync_proto::KeyError;

use crate::clock::ClockError;

/// Fatal errors surfaced by a slave run.
#[derive(Debug)]
pub enum SlaveError {
    /// Invalid configuration, rejected before any phase starts.
    Config(ConfigError),
    /// Clock discipline failure (step/slew/PLL).
    Clock(ClockError),
    /// Socket or result-file I/O failure.
    Io(io::Error),
    /// Internal phase-sequencing violation (e.g. a correction computed
    /// over an empty window). Indicates a bug, not an input condition.
    Sequence(&'static str),
}

impl fmt::Display for SlaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlaveError::Config(err) => write!(f, "configuration error: {}", err),
            SlaveError::Clock(err) => write!(f, "clock discipline error: {}", err),
            SlaveError::Io(err) => write!(f, "I/O error: {}", err),
            SlaveError::Sequence(what) => write!(f, "phase sequencing violation: {}", what),
        }
    }
}

impl std::error::Error for SlaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SlaveError::Config(err) => Some(err),
            SlaveError::Clock(err) => Some(err),
            SlaveError::Io(err) => Some(err),
            SlaveError::Sequence(_) => None,
        }
    }
}

impl From<ConfigError> for SlaveError {
    fn from(err: ConfigError) -> SlaveError {
        SlaveError::Config(err)
    }
}

impl From<ClockError> for SlaveError {
    fn from(err: ClockError) -> SlaveError {
        SlaveError::Clock(err)
    }
}

impl From<io::Error> for SlaveError {
    fn from(err: io::Error) -> SlaveError {
        SlaveError::Io(err)
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
    fn test_display_config() {
        let err = SlaveError::Config(ConfigError::InvalidParameter {
            name: "obs_win",
            reason: "must be at least 1",
        });
        assert_eq!(
            err.to_string(),
            "configuration error: invalid 'obs_win': must be at least 1"
        );
    }

    #[test]
    fn test_display_sequence() {
        let err = SlaveError::Sequence("observation window is empty");
        assert_eq!(
            err.to_string(),
            "phase sequencing violation: observation window is empty"
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: SlaveError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SlaveError::Io(_)));
    }

    #[test]
    fn test_source_chain() {
        let err = SlaveError::Clock(ClockError::OsError(1));
        assert!(std::error::Error::source(&err).is_some());
    }
}
