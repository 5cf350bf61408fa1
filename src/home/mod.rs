//! Structured representation of a home deployment.
//!
//! This module contains:
//! - Closed category enumerations for sensors, locations and activities
//! - The immutable home model built from a dataset configuration

pub mod model;
pub mod types;

pub use model::{HomeModel, Location, Sensor};
pub use types::{
    ActivityKind, IntervalEdge, IntervalId, LocationId, LocationKind, SensorId, SensorKind,
};
