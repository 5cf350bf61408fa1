//! Dataset configuration for the homesense pipeline.
//!
//! A dataset registry is a JSON file keyed by dataset name. Each entry maps
//! the raw string codes found in that dataset's log files to the closed
//! category enums of [`crate::home::types`], and describes the home layout
//! (location adjacency, sensor membership) plus the path to the data file.
//!
//! All raw-string resolution happens here; the core never sees an
//! unvalidated category key. Unknown keys in the tables fail at load time
//! because table values deserialize directly into the enums.

use crate::error::ConfigError;
use crate::home::types::{ActivityKind, IntervalEdge, LocationKind, SensorKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// A registry of named dataset configurations.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    datasets: BTreeMap<String, DatasetConfig>,
}

impl DatasetRegistry {
    /// Load a registry from a JSON file.
    ///
    /// Relative `datapath` entries are resolved against a `.data` directory
    /// next to the registry file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data_root = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(".data");
        Self::load_with_data_root(path, &data_root)
    }

    /// Load a registry, resolving relative data paths against `data_root`.
    pub fn load_with_data_root(
        path: impl AsRef<Path>,
        data_root: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data_root = data_root.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: BTreeMap<String, DatasetConfig> =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut datasets = BTreeMap::new();
        for (name, mut config) in raw {
            config.name = name.clone();
            config.data_file = if config.datapath.is_absolute() {
                config.datapath.clone()
            } else {
                data_root.join(&config.datapath)
            };
            datasets.insert(name, config);
        }

        Ok(Self { datasets })
    }

    /// Default registry location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("homesense")
            .join("datasets.json")
    }

    /// Look up a dataset by name.
    pub fn get(&self, name: &str) -> Result<&DatasetConfig, ConfigError> {
        self.datasets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownDataset(name.to_string()))
    }

    /// Names of all registered datasets.
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }
}

/// Configuration of a single dataset: mapping tables plus home layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(skip)]
    name: String,

    /// Resolved at registry load time.
    #[serde(skip)]
    data_file: PathBuf,

    /// Data file path, relative to the registry's data root.
    datapath: PathBuf,

    sensors: SensorTables,
    activities: ActivityTables,
    locations: LocationTables,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SensorTables {
    /// Sensor code prefix (1-2 uppercase letters) to sensor kind.
    #[serde(rename = "type")]
    kinds: HashMap<String, SensorKind>,

    /// Sensor state keyword to boolean value.
    state: HashMap<String, bool>,

    /// Location name to the sensors it hosts.
    locations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivityTables {
    /// Raw activity name to activity kind. BTreeMap keeps the raw name order
    /// deterministic.
    #[serde(rename = "type")]
    kinds: BTreeMap<String, ActivityKind>,

    /// Quoted edge token to interval edge.
    #[serde(default = "default_edge_table")]
    state: HashMap<String, IntervalEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocationTables {
    /// Location name to location kind.
    #[serde(rename = "type")]
    kinds: BTreeMap<String, LocationKind>,

    /// Declared adjacency lists. Locations absent from this table have no
    /// declared neighbors.
    #[serde(default)]
    adjacency: BTreeMap<String, Vec<String>>,
}

fn default_edge_table() -> HashMap<String, IntervalEdge> {
    HashMap::from([
        ("begin".to_string(), IntervalEdge::Begin),
        ("end".to_string(), IntervalEdge::End),
    ])
}

impl DatasetConfig {
    /// Dataset name (the registry key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path to the annotated data file.
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Resolve a sensor code prefix (e.g. `"LS"`) to its kind.
    pub fn sensor_kind(&self, prefix: &str) -> Result<SensorKind, ConfigError> {
        self.sensors
            .kinds
            .get(prefix)
            .copied()
            .ok_or_else(|| ConfigError::UnknownSensorKind(prefix.to_string()))
    }

    /// Resolve a raw sensor state token to a numeric value.
    ///
    /// Numeric literals (e.g. temperature readings) take precedence over the
    /// keyword table; keywords map to 1.0/0.0.
    pub fn sensor_value(&self, state: &str) -> Result<f64, ConfigError> {
        if let Ok(value) = state.parse::<f64>() {
            return Ok(value);
        }
        self.sensors
            .state
            .get(&state.to_lowercase())
            .map(|&on| if on { 1.0 } else { 0.0 })
            .ok_or_else(|| ConfigError::UnknownSensorState(state.to_string()))
    }

    /// Resolve a raw activity name to its kind.
    pub fn activity_kind(&self, name: &str) -> Result<ActivityKind, ConfigError> {
        self.activities
            .kinds
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownActivity(name.to_string()))
    }

    /// Resolve an optional quoted edge token to an interval edge.
    ///
    /// A missing token denotes a standalone point-in-time occurrence.
    pub fn activity_edge(&self, token: Option<&str>) -> Result<IntervalEdge, ConfigError> {
        match token {
            None => Ok(IntervalEdge::Point),
            Some(t) => self
                .activities
                .state
                .get(&t.to_lowercase())
                .copied()
                .ok_or_else(|| ConfigError::UnknownActivityEdge(t.to_string())),
        }
    }

    /// Resolve a location name to its kind.
    pub fn location_kind(&self, name: &str) -> Result<LocationKind, ConfigError> {
        self.locations
            .kinds
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownLocation(name.to_string()))
    }

    /// Declared neighbors of a location. Empty for unlisted locations.
    pub fn location_adjacency(&self, name: &str) -> &[String] {
        self.locations
            .adjacency
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sensors hosted by a location. Empty for unlisted locations.
    pub fn location_sensors(&self, name: &str) -> &[String] {
        self.sensors
            .locations
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All sensor names in the dataset, sorted.
    pub fn sensor_list(&self) -> Vec<&str> {
        let mut sensors: Vec<&str> = self
            .sensors
            .locations
            .values()
            .flatten()
            .map(String::as_str)
            .collect();
        sensors.sort_unstable();
        sensors
    }

    /// All raw activity names, sorted.
    pub fn activity_list(&self) -> Vec<&str> {
        self.activities.kinds.keys().map(String::as_str).collect()
    }

    /// All location names, sorted.
    pub fn location_list(&self) -> Vec<&str> {
        self.locations.kinds.keys().map(String::as_str).collect()
    }

    /// Distinct activity kinds used by this dataset, sorted.
    ///
    /// This is the label row space: several raw names may share one kind.
    pub fn activity_kinds(&self) -> Vec<ActivityKind> {
        let mut kinds: Vec<ActivityKind> = self.activities.kinds.values().copied().collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) const TOY_REGISTRY: &str = r#"{
        "toy": {
            "datapath": "toy/ann.txt",
            "sensors": {
                "type": {
                    "M": "motion",
                    "MA": "wide_area_motion",
                    "LS": "light",
                    "T": "temperature",
                    "D": "door"
                },
                "state": {
                    "on": true,
                    "off": false,
                    "open": true,
                    "close": false
                },
                "locations": {
                    "kitchen": ["M002", "T101"],
                    "living_room": ["M001", "LS003"],
                    "bedroom": ["M003"]
                }
            },
            "activities": {
                "type": {
                    "Sleep": "sleep",
                    "Cook": "cook",
                    "Cook_Breakfast": "cook_breakfast",
                    "Eat": "eat"
                }
            },
            "locations": {
                "type": {
                    "kitchen": "kitchen",
                    "living_room": "living_room",
                    "bedroom": "bedroom"
                },
                "adjacency": {
                    "living_room": ["kitchen", "bedroom"]
                }
            }
        }
    }"#;

    /// The toy dataset configuration used across unit tests.
    pub(crate) fn toy_dataset() -> DatasetConfig {
        let raw: BTreeMap<String, DatasetConfig> =
            serde_json::from_str(TOY_REGISTRY).expect("fixture registry parses");
        let mut config = raw.into_iter().next().expect("fixture has one dataset").1;
        config.name = "toy".to_string();
        config.data_file = PathBuf::from("toy/ann.txt");
        config
    }
}
