//! Line tokenizer for annotated event logs.
//!
//! One raw line follows the fixed schema
//! `<timestamp> <sensor-code> <state> [<ActivityName>[="begin"|"end"]]`, e.g.
//!
//! ```text
//! 2011-06-15 00:00:05.000 M001 ON Sleep="begin"
//! ```
//!
//! All raw-text brittleness is isolated here: downstream code only ever sees
//! [`ParsedLine`] values or a typed [`LineError`].

use crate::config::DatasetConfig;
use crate::error::LineError;
use crate::home::types::{ActivityKind, IntervalEdge, SensorKind};
use chrono::NaiveDateTime;
use regex::Regex;

const LINE_PATTERN: &str =
    r"^(\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}\.\d+)\s+([A-Z]{1,2})(\d{1,5})\s+(\S+)(?:\s+(\S.*))?$";
const ACTIVITY_PATTERN: &str = r#"^([A-Za-z_]+)(?:=["']([A-Za-z]+)?["'])?"#;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A fully resolved event line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub timestamp: NaiveDateTime,
    pub sensor_name: String,
    pub sensor_kind: SensorKind,
    pub value: f64,
    pub activity: Option<ParsedActivity>,
}

/// The optional trailing activity annotation of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedActivity {
    pub name: String,
    pub kind: ActivityKind,
    pub edge: IntervalEdge,
}

/// Turns raw log lines into [`ParsedLine`] records using the mapping tables
/// of a dataset configuration.
pub struct LineTokenizer<'a> {
    config: &'a DatasetConfig,
    line_re: Regex,
    activity_re: Regex,
}

impl<'a> LineTokenizer<'a> {
    pub fn new(config: &'a DatasetConfig) -> Self {
        Self {
            config,
            // Both patterns are compile-time constants.
            line_re: Regex::new(LINE_PATTERN).expect("line pattern compiles"),
            activity_re: Regex::new(ACTIVITY_PATTERN).expect("activity pattern compiles"),
        }
    }

    /// Tokenize one raw line. `line` is the 1-based line number in the data
    /// file, used only for error reporting.
    pub fn tokenize(&self, raw: &str, line: usize) -> Result<ParsedLine, LineError> {
        let tokens = self
            .line_re
            .captures(raw.trim_end())
            .ok_or(LineError::Malformed { line })?;

        let timestamp = NaiveDateTime::parse_from_str(&tokens[1], TIMESTAMP_FORMAT)
            .map_err(|_| LineError::Malformed { line })?;

        let prefix = &tokens[2];
        let sensor_name = format!("{}{}", prefix, &tokens[3]);
        let sensor_kind =
            self.config
                .sensor_kind(prefix)
                .map_err(|_| LineError::UnknownSensor {
                    name: sensor_name.clone(),
                    line,
                })?;

        let value = self
            .config
            .sensor_value(&tokens[4].to_lowercase())
            .map_err(|_| LineError::Malformed { line })?;

        let activity = match tokens.get(5) {
            None => None,
            Some(annotation) => Some(self.tokenize_activity(annotation.as_str(), line)?),
        };

        Ok(ParsedLine {
            timestamp,
            sensor_name,
            sensor_kind,
            value,
            activity,
        })
    }

    fn tokenize_activity(&self, raw: &str, line: usize) -> Result<ParsedActivity, LineError> {
        let tokens = self
            .activity_re
            .captures(raw)
            .ok_or(LineError::Malformed { line })?;

        let name = tokens[1].to_string();
        let kind = self
            .config
            .activity_kind(&name)
            .map_err(|_| LineError::UnknownActivity {
                name: name.clone(),
                line,
            })?;
        let edge = self
            .config
            .activity_edge(tokens.get(2).map(|m| m.as_str()))
            .map_err(|_| LineError::Malformed { line })?;

        Ok(ParsedActivity { name, kind, edge })
    }
}
