//! Feature and label matrices from window slices.
//!
//! Matrix layouts are fixed by the home model's name-sorted orderings, so
//! the same dataset always produces the same row indexing. One column per
//! accepted log line, in line order.

use crate::core::reader::WindowSlice;
use crate::home::model::HomeModel;
use crate::home::types::{ActivityKind, IntervalEdge};
use chrono::NaiveDateTime;
use ndarray::Array2;

/// Build the `(num_sensors x num_timesteps)` carry-forward state matrix and
/// the matching time vector.
///
/// Column `t` equals column `t - 1` except at the single row updated by the
/// measurement at line `t`; column 0 starts from the all-zero default state.
pub fn sensor_feature_matrix(
    model: &HomeModel,
    slice: &WindowSlice,
) -> (Array2<f64>, Vec<NaiveDateTime>) {
    let steps = slice.sensor_events.len();
    let mut matrix = Array2::zeros((model.num_sensors(), steps));
    let mut times = Vec::with_capacity(steps);

    for (t, measurement) in slice.sensor_events.iter().enumerate() {
        if t > 0 {
            let previous = matrix.column(t - 1).to_owned();
            matrix.column_mut(t).assign(&previous);
        }
        matrix[[measurement.sensor.index(), t]] = measurement.value;
        times.push(measurement.timestamp);
    }

    (matrix, times)
}

/// Build the `(num_activities + 1 x num_timesteps)` multi-hot label matrix.
///
/// `rows` is the sorted activity-kind row space (see
/// [`crate::config::DatasetConfig::activity_kinds`]). Every activity whose
/// interval covers a timestep gets a 1 in its row; an interval covers its
/// begin line through its end line inclusive, and a point occurrence covers
/// its single line. The sentinel last row is set whenever no activity is in
/// progress.
pub fn label_matrix(rows: &[ActivityKind], slice: &WindowSlice) -> Array2<f64> {
    let steps = slice.sensor_events.len();
    let sentinel = rows.len();
    let mut matrix = Array2::zeros((rows.len() + 1, steps));

    let mut open: Vec<usize> = Vec::new();
    for (t, measurement) in slice.sensor_events.iter().enumerate() {
        let mut closing = None;

        if let Some(event) = measurement.activity {
            let interval = slice.interval(event.interval);
            if let Ok(row) = rows.binary_search(&interval.kind) {
                match event.edge {
                    IntervalEdge::Begin => {
                        if !open.contains(&row) {
                            open.push(row);
                        }
                    }
                    IntervalEdge::End => closing = Some(row),
                    IntervalEdge::Point => matrix[[row, t]] = 1.0,
                }
            }
        }

        for &row in &open {
            matrix[[row, t]] = 1.0;
        }
        // The end line is still covered by its interval.
        if let Some(row) = closing {
            matrix[[row, t]] = 1.0;
            open.retain(|&r| r != row);
        }
        if matrix.column(t).sum() == 0.0 {
            matrix[[sentinel, t]] = 1.0;
        }
    }

    matrix
}
