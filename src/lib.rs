//! Homesense - smart-home event logs as machine-learning matrices.
//!
//! This library turns annotated smart-home sensor logs (one timestamped
//! sensor reading per line, optionally tagged with an activity edge) into
//! dense feature, label and graph matrices suitable for training models on
//! activity recognition.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Homesense                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌────────────┐              │
//! │  │ Tokenizer │──▶│  Reader   │──▶│  Features  │              │
//! │  │ (regex)   │   │ (windows) │   │ & Labels   │              │
//! │  └───────────┘   └───────────┘   └────────────┘              │
//! │        │                               │                     │
//! │        ▼                               ▼                     │
//! │  ┌───────────┐                  ┌────────────┐               │
//! │  │  Dataset  │                  │ HomeGraph  │               │
//! │  │  Config   │                  │ (adjacency)│               │
//! │  └───────────┘                  └────────────┘               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use homesense::config::DatasetRegistry;
//! use homesense::core::{sensor_feature_matrix, EventReader};
//! use homesense::home::HomeModel;
//!
//! # fn main() -> anyhow::Result<()> {
//! let registry = DatasetRegistry::load("datasets.json")?;
//! let dataset = registry.get("aruba")?;
//! let model = HomeModel::build(dataset)?;
//!
//! let mut reader = EventReader::new(&model, dataset, dataset.data_file())?;
//! let slice = reader.read_window(0, Some(1000))?;
//! let (features, times) = sensor_feature_matrix(&model, slice);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod home;

// Re-export key types at crate root for convenience
pub use config::{DatasetConfig, DatasetRegistry};
pub use core::{
    label_matrix, normalize_adjacency, sensor_feature_matrix, DanglingEndPolicy, EventReader,
    HomeGraph, WindowSlice,
};
pub use error::{ConfigError, LineError, ModelError, ReadError};
pub use home::{ActivityKind, HomeModel, IntervalEdge, LocationKind, SensorKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
