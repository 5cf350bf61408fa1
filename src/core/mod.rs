//! The ingestion pipeline.
//!
//! This module contains:
//! - Line tokenization of annotated event logs
//! - Windowed event reading with activity-interval tracking
//! - Feature and label matrix construction
//! - The spatial sensor/location graph and its normalized forms

pub mod features;
pub mod graph;
pub mod parser;
pub mod reader;

// Re-export commonly used types
pub use features::{label_matrix, sensor_feature_matrix};
pub use graph::{normalize_adjacency, HomeGraph, NodeEntity, NodeInfo, NodeKind};
pub use parser::{LineTokenizer, ParsedActivity, ParsedLine};
pub use reader::{
    ActivityEvent, ActivityInterval, DanglingEndPolicy, EventReader, Measurement, WindowSlice,
};
