//! Windowed event reading with activity-interval tracking.
//!
//! The reader consumes a contiguous range of log lines (a window), emits one
//! [`Measurement`] per accepted line, and tracks `begin`/`end` activity
//! annotations across the window through an open-interval table. The built
//! [`WindowSlice`] is cached: re-requesting the identical range returns it
//! verbatim, requesting a different range drops it and rebuilds.
//!
//! Windows are independent of each other: intervals still open when a window
//! ends are exposed through [`WindowSlice::waiting`] and a subsequent read
//! starts with an empty table.

use crate::config::DatasetConfig;
use crate::core::parser::LineTokenizer;
use crate::error::{LineError, ReadError};
use crate::home::model::HomeModel;
use crate::home::types::{ActivityKind, IntervalEdge, IntervalId, SensorId};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One sensor reading, produced from one accepted log line.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub sensor: SensorId,
    pub value: f64,
    pub timestamp: NaiveDateTime,
    /// The activity annotation carried by this line, if any.
    pub activity: Option<ActivityEvent>,
}

/// Reference to an interval from the line that started, ended, or punctually
/// marked it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityEvent {
    pub interval: IntervalId,
    pub edge: IntervalEdge,
}

/// A labeled activity occurrence. Mutable until its `end` edge arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityInterval {
    pub kind: ActivityKind,
    /// Raw activity name; open intervals are keyed by it.
    pub name: String,
    pub begin: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub point: Option<NaiveDateTime>,
}

impl ActivityInterval {
    /// True for point occurrences and for intervals whose end edge was seen.
    pub fn is_closed(&self) -> bool {
        self.end.is_some() || self.point.is_some()
    }
}

/// What to do with an `end` edge that has no matching open `begin`
/// (e.g. a window starting mid-interval).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingEndPolicy {
    /// Surface [`ReadError::DanglingEnd`] as a hard failure of the window.
    #[default]
    Fail,
    /// Record an already-closed interval with an unknown begin and continue.
    AdoptClosed,
}

/// The parsed contents of one window of log lines.
#[derive(Debug, Clone)]
pub struct WindowSlice {
    /// First line of the window (0-based, inclusive).
    pub start: usize,
    /// One past the last requested line.
    pub stop: usize,
    /// One measurement per accepted line, in line order.
    pub sensor_events: Vec<Measurement>,
    /// One record per line that starts, ends, or punctually marks an
    /// activity. A begin/end pair references the same interval twice.
    pub activity_events: Vec<ActivityEvent>,
    /// Interval arena; indexed by [`IntervalId`].
    pub intervals: Vec<ActivityInterval>,
    /// Intervals begun but not ended within this window, keyed by raw name.
    pub waiting: HashMap<String, IntervalId>,
    /// Lines inspected in the window.
    pub lines_total: usize,
    /// Lines skipped for recoverable per-line errors.
    pub lines_skipped: usize,
    /// True if the requested window ran past the end of the file.
    pub truncated: bool,
}

impl WindowSlice {
    pub fn interval(&self, id: IntervalId) -> &ActivityInterval {
        &self.intervals[id.index()]
    }

    pub fn lines_processed(&self) -> usize {
        self.lines_total - self.lines_skipped
    }
}

/// Streaming, caching reader over one dataset's annotated log file.
pub struct EventReader<'a> {
    model: &'a HomeModel,
    tokenizer: LineTokenizer<'a>,
    path: PathBuf,
    file_length: usize,
    policy: DanglingEndPolicy,
    slice: Option<WindowSlice>,
}

impl<'a> EventReader<'a> {
    /// Open a reader over `path`. Counts the file's lines up front
    /// (streaming, the file is never fully materialized).
    pub fn new(
        model: &'a HomeModel,
        config: &'a DatasetConfig,
        path: impl Into<PathBuf>,
    ) -> Result<Self, ReadError> {
        let path = path.into();
        let file_length = count_lines(&path)?;
        debug!(path = %path.display(), lines = file_length, "opened event reader");

        Ok(Self {
            model,
            tokenizer: LineTokenizer::new(config),
            path,
            file_length,
            policy: DanglingEndPolicy::default(),
            slice: None,
        })
    }

    pub fn with_dangling_end_policy(mut self, policy: DanglingEndPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Total number of lines in the data file.
    pub fn file_length(&self) -> usize {
        self.file_length
    }

    /// Read the window `[start, start + window)`, or `[start, EOF)` when
    /// `window` is `None`.
    ///
    /// An identical repeated request returns the cached slice without
    /// re-parsing; a different range drops the previous slice first. A window
    /// running past the end of the file is truncated to the available lines
    /// and flagged, not failed.
    pub fn read_window(
        &mut self,
        start: usize,
        window: Option<usize>,
    ) -> Result<&WindowSlice, ReadError> {
        let stop = match window {
            Some(w) => start + w,
            None => self.file_length,
        };

        let cached = matches!(&self.slice, Some(s) if s.start == start && s.stop == stop);
        if cached {
            debug!(start, stop, "returning cached window slice");
        } else {
            let slice = self.build_slice(start, stop)?;
            self.slice = Some(slice);
        }
        // Populated by both branches above.
        Ok(self.slice.as_ref().unwrap())
    }

    /// The currently cached slice, if any.
    pub fn cached_slice(&self) -> Option<&WindowSlice> {
        self.slice.as_ref()
    }

    fn build_slice(&self, start: usize, stop: usize) -> Result<WindowSlice, ReadError> {
        let truncated = stop > self.file_length;
        if truncated {
            warn!(
                requested = stop,
                available = self.file_length,
                "window exceeds file length, truncating to end of file"
            );
        }

        let file = File::open(&self.path).map_err(|source| ReadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut sensor_events = Vec::new();
        let mut activity_events = Vec::new();
        let mut intervals: Vec<ActivityInterval> = Vec::new();
        let mut waiting: HashMap<String, IntervalId> = HashMap::new();
        let mut lines_total = 0usize;
        let mut lines_skipped = 0usize;

        for (idx, line) in reader.lines().enumerate().skip(start) {
            if idx >= stop {
                break;
            }
            let line = line.map_err(|source| ReadError::Io {
                path: self.path.clone(),
                source,
            })?;
            let line_no = idx + 1;
            lines_total += 1;

            let parsed = match self.tokenizer.tokenize(&line, line_no) {
                Ok(parsed) => parsed,
                Err(err) => {
                    lines_skipped += 1;
                    debug!(%err, "skipping line");
                    continue;
                }
            };

            // A configured sensor kind is not enough: the sensor itself must
            // be part of the home model.
            let Some(sensor) = self.model.sensor_id(&parsed.sensor_name) else {
                lines_skipped += 1;
                let err = LineError::UnknownSensor {
                    name: parsed.sensor_name,
                    line: line_no,
                };
                debug!(%err, "skipping line");
                continue;
            };

            let mut activity = None;
            if let Some(annotation) = parsed.activity {
                let event = track_interval(
                    annotation.name,
                    annotation.kind,
                    annotation.edge,
                    parsed.timestamp,
                    line_no,
                    self.policy,
                    &mut intervals,
                    &mut waiting,
                )?;
                activity_events.push(event);
                activity = Some(event);
            }

            sensor_events.push(Measurement {
                sensor,
                value: parsed.value,
                timestamp: parsed.timestamp,
                activity,
            });
        }

        info!(
            processed = lines_total - lines_skipped,
            total = lines_total,
            skipped = lines_skipped,
            "window read complete"
        );
        if !waiting.is_empty() {
            warn!(
                open = waiting.len(),
                "window ended with open activity intervals"
            );
        }

        Ok(WindowSlice {
            start,
            stop,
            sensor_events,
            activity_events,
            intervals,
            waiting,
            lines_total,
            lines_skipped,
            truncated,
        })
    }
}

/// Apply one activity annotation to the open-interval table.
#[allow(clippy::too_many_arguments)]
fn track_interval(
    name: String,
    kind: ActivityKind,
    edge: IntervalEdge,
    timestamp: NaiveDateTime,
    line: usize,
    policy: DanglingEndPolicy,
    intervals: &mut Vec<ActivityInterval>,
    waiting: &mut HashMap<String, IntervalId>,
) -> Result<ActivityEvent, ReadError> {
    let interval = match edge {
        IntervalEdge::Begin => {
            if waiting.contains_key(&name) {
                return Err(ReadError::OverlappingInterval { name, line });
            }
            let id = IntervalId(intervals.len());
            waiting.insert(name.clone(), id);
            intervals.push(ActivityInterval {
                kind,
                name,
                begin: Some(timestamp),
                end: None,
                point: None,
            });
            id
        }
        IntervalEdge::End => match waiting.remove(&name) {
            Some(id) => {
                intervals[id.index()].end = Some(timestamp);
                id
            }
            None => match policy {
                DanglingEndPolicy::Fail => {
                    return Err(ReadError::DanglingEnd { name, line });
                }
                DanglingEndPolicy::AdoptClosed => {
                    warn!(activity = %name, line, "end with no open begin, adopting as closed");
                    let id = IntervalId(intervals.len());
                    intervals.push(ActivityInterval {
                        kind,
                        name,
                        begin: None,
                        end: Some(timestamp),
                        point: None,
                    });
                    id
                }
            },
        },
        IntervalEdge::Point => {
            let id = IntervalId(intervals.len());
            intervals.push(ActivityInterval {
                kind,
                name,
                begin: None,
                end: None,
                point: Some(timestamp),
            });
            id
        }
    };

    Ok(ActivityEvent { interval, edge })
}

fn count_lines(path: &Path) -> Result<usize, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut count = 0usize;
    for line in BufReader::new(file).lines() {
        line.map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::toy_dataset;

    const LINES: &str = "\
2011-06-15 00:00:05.000 M001 ON Sleep=\"begin\"\n\
2011-06-15 00:10:00.000 T101 20.5\n\
2011-06-15 06:00:05.000 M001 OFF Sleep=\"end\"\n\
2011-06-15 07:00:00.000 M002 ON Cook_Breakfast=\"begin\"\n\
2011-06-15 07:05:00.000 D999 OPEN\n\
2011-06-15 07:30:00.000 LS003 ON\n";

    fn write_data(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("homesense-reader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_full_file_read() {
        let config = toy_dataset();
        let model = HomeModel::build(&config).unwrap();
        let path = write_data("full.txt", LINES);
        let mut reader = EventReader::new(&model, &config, path).unwrap();

        assert_eq!(reader.file_length(), 6);
        let slice = reader.read_window(0, None).unwrap();

        // D999 is not part of the model: skipped and counted.
        assert_eq!(slice.lines_total, 6);
        assert_eq!(slice.lines_skipped, 1);
        assert_eq!(slice.lines_processed(), 5);
        assert_eq!(slice.sensor_events.len(), 5);
        assert!(!slice.truncated);

        // Sleep was opened and closed on the same interval instance.
        assert_eq!(slice.activity_events.len(), 3);
        assert_eq!(
            slice.activity_events[0].interval,
            slice.activity_events[1].interval
        );
        let sleep = slice.interval(slice.activity_events[0].interval);
        assert_eq!(sleep.kind, ActivityKind::Sleep);
        assert!(sleep.is_closed());
        assert!(sleep.begin.unwrap() < sleep.end.unwrap());

        // Cook_Breakfast never ended: exposed through `waiting`.
        assert_eq!(slice.waiting.len(), 1);
        let cooking = slice.interval(slice.waiting["Cook_Breakfast"]);
        assert!(!cooking.is_closed());
    }

    #[test]
    fn test_cache_hit_survives_file_change() {
        let config = toy_dataset();
        let model = HomeModel::build(&config).unwrap();
        let path = write_data("cache.txt", LINES);
        let mut reader = EventReader::new(&model, &config, &path).unwrap();

        let first = reader.read_window(0, Some(3)).unwrap().clone();

        // Overwrite the file; an identical request must come from the cache.
        std::fs::write(&path, "garbage\n").unwrap();
        let second = reader.read_window(0, Some(3)).unwrap();
        assert_eq!(first.sensor_events, second.sensor_events);
        assert_eq!(first.lines_skipped, second.lines_skipped);
    }

    #[test]
    fn test_different_window_rebuilds_with_fresh_interval_table() {
        let config = toy_dataset();
        let model = HomeModel::build(&config).unwrap();
        let path = write_data("rebuild.txt", LINES);
        let mut reader = EventReader::new(&model, &config, path).unwrap();

        let first = reader.read_window(0, Some(1)).unwrap();
        assert_eq!(first.waiting.len(), 1);

        // Line 2 ends Sleep, but windows are independent: with the default
        // policy the orphaned end is a hard failure of the new window.
        let second = reader.read_window(2, Some(1));
        assert!(matches!(
            second,
            Err(ReadError::DanglingEnd { ref name, line: 3 }) if name == "Sleep"
        ));
    }

    #[test]
    fn test_adopt_closed_policy() {
        let config = toy_dataset();
        let model = HomeModel::build(&config).unwrap();
        let path = write_data("adopt.txt", LINES);
        let mut reader = EventReader::new(&model, &config, path)
            .unwrap()
            .with_dangling_end_policy(DanglingEndPolicy::AdoptClosed);

        let slice = reader.read_window(2, Some(1)).unwrap();
        assert_eq!(slice.intervals.len(), 1);
        let sleep = &slice.intervals[0];
        assert!(sleep.begin.is_none());
        assert!(sleep.end.is_some());
        assert!(sleep.is_closed());
        assert!(slice.waiting.is_empty());
    }

    #[test]
    fn test_overlapping_begin_is_a_hard_failure() {
        let config = toy_dataset();
        let model = HomeModel::build(&config).unwrap();
        let path = write_data(
            "overlap.txt",
            "2011-06-15 00:00:05.000 M001 ON Sleep=\"begin\"\n\
             2011-06-15 00:10:00.000 M001 ON Sleep=\"begin\"\n",
        );
        let mut reader = EventReader::new(&model, &config, path).unwrap();

        let result = reader.read_window(0, None);
        assert!(matches!(
            result,
            Err(ReadError::OverlappingInterval { ref name, line: 2 }) if name == "Sleep"
        ));
    }

    #[test]
    fn test_truncated_window_is_not_fatal() {
        let config = toy_dataset();
        let model = HomeModel::build(&config).unwrap();
        let path = write_data("trunc.txt", LINES);
        let mut reader = EventReader::new(&model, &config, path).unwrap();

        let slice = reader.read_window(4, Some(100)).unwrap();
        assert!(slice.truncated);
        assert_eq!(slice.lines_total, 2);
        assert_eq!(slice.sensor_events.len(), 1); // D999 skipped
    }

    #[test]
    fn test_point_activity_is_not_tracked_as_open() {
        let config = toy_dataset();
        let model = HomeModel::build(&config).unwrap();
        let path = write_data(
            "point.txt",
            "2011-06-15 12:10:00.000 M002 ON Eat\n",
        );
        let mut reader = EventReader::new(&model, &config, path).unwrap();

        let slice = reader.read_window(0, None).unwrap();
        assert!(slice.waiting.is_empty());
        assert_eq!(slice.intervals.len(), 1);
        assert!(slice.intervals[0].point.is_some());
        assert!(slice.intervals[0].is_closed());
    }
}
