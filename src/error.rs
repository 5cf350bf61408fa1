//! Error taxonomy for the homesense pipeline.
//!
//! Errors are split by recoverability: [`LineError`] values are caught at the
//! line-processing boundary, tallied and skipped, while [`ReadError`] values
//! abort the whole window read. Configuration and model-construction failures
//! get their own enums so callers can tell a bad registry from bad data.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading or querying a dataset configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read dataset registry {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse dataset registry {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no dataset named '{0}' in the registry")]
    UnknownDataset(String),

    #[error("no sensor kind registered for code prefix '{0}'")]
    UnknownSensorKind(String),

    #[error("sensor state '{0}' is neither numeric nor a registered keyword")]
    UnknownSensorState(String),

    #[error("no activity kind registered for '{0}'")]
    UnknownActivity(String),

    #[error("no interval edge registered for token '{0}'")]
    UnknownActivityEdge(String),

    #[error("no location kind registered for '{0}'")]
    UnknownLocation(String),
}

/// Failures while building the home model from a dataset configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A sensor may belong to exactly one location.
    #[error("sensor '{sensor}' is attached to both '{first}' and '{second}'")]
    DuplicateSensor {
        sensor: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Per-line parse failures. Recoverable: the reader counts and skips them.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("line {line} does not match the event schema")]
    Malformed { line: usize },

    #[error("unknown sensor '{name}' on line {line}")]
    UnknownSensor { name: String, line: usize },

    #[error("unknown activity '{name}' on line {line}")]
    UnknownActivity { name: String, line: usize },
}

/// Hard failures that abort a window read.
///
/// Interval inconsistencies indicate corrupted source data and are escalated
/// instead of being skipped like [`LineError`].
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("duplicate begin for activity '{name}' on line {line}: interval already open")]
    OverlappingInterval { name: String, line: usize },

    #[error("end for activity '{name}' on line {line} has no matching begin")]
    DanglingEnd { name: String, line: usize },

    #[error("cannot read data file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_error_messages_carry_line_numbers() {
        let err = LineError::UnknownSensor {
            name: "D999".to_string(),
            line: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("D999"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_read_error_distinguishes_interval_violations() {
        let overlap = ReadError::OverlappingInterval {
            name: "Sleep".to_string(),
            line: 7,
        };
        let dangling = ReadError::DanglingEnd {
            name: "Sleep".to_string(),
            line: 7,
        };
        assert!(overlap.to_string().contains("already open"));
        assert!(dangling.to_string().contains("no matching begin"));
    }
}
