//! The home model: sensors, locations and their spatial relations.
//!
//! Built once from a dataset configuration and immutable afterwards.
//! Entities live in arenas sorted by name, so ids double as deterministic
//! matrix/graph indices across runs.

use crate::config::DatasetConfig;
use crate::error::ModelError;
use crate::home::types::{LocationId, LocationKind, SensorId, SensorKind};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A location inside the home.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: String,
    pub kind: LocationKind,
    /// Adjacent locations. Symmetric: if A lists B, B lists A.
    pub adjacent: Vec<LocationId>,
}

/// A physical sensor, attached to exactly one location.
#[derive(Debug, Clone)]
pub struct Sensor {
    pub name: String,
    pub kind: SensorKind,
    pub location: LocationId,
}

/// The structured representation of one home deployment.
#[derive(Debug, Clone)]
pub struct HomeModel {
    locations: Vec<Location>,
    sensors: Vec<Sensor>,
    location_index: HashMap<String, LocationId>,
    sensor_index: HashMap<String, SensorId>,
}

impl HomeModel {
    /// Build the model from a dataset configuration.
    ///
    /// Location adjacency is symmetrized here: both directions are inserted
    /// for every declared pair. A declared neighbor missing from the
    /// location table is skipped with a warning. A sensor listed under two
    /// locations is an error.
    pub fn build(config: &DatasetConfig) -> Result<Self, ModelError> {
        let location_names = config.location_list();
        debug!(dataset = config.name(), locations = location_names.len(), "building home model");

        let mut locations = Vec::with_capacity(location_names.len());
        let mut location_index = HashMap::new();
        for (idx, name) in location_names.iter().enumerate() {
            locations.push(Location {
                name: name.to_string(),
                kind: config.location_kind(name)?,
                adjacent: Vec::new(),
            });
            location_index.insert(name.to_string(), LocationId(idx));
        }

        for name in &location_names {
            let id = location_index[*name];
            for other in config.location_adjacency(name) {
                let Some(&other_id) = location_index.get(other) else {
                    warn!(location = %other, "adjacent location not in location table, skipping");
                    continue;
                };
                link_locations(&mut locations, id, other_id);
            }
        }

        // Sensors are gathered per location, then sorted by name so their
        // ids match the fixed matrix row ordering.
        let mut named: Vec<(String, SensorKind, LocationId)> = Vec::new();
        let mut owner: HashMap<String, LocationId> = HashMap::new();
        for name in &location_names {
            let loc_id = location_index[*name];
            for sensor in config.location_sensors(name) {
                if let Some(&first) = owner.get(sensor) {
                    return Err(ModelError::DuplicateSensor {
                        sensor: sensor.clone(),
                        first: locations[first.0].name.clone(),
                        second: name.to_string(),
                    });
                }
                owner.insert(sensor.clone(), loc_id);
                let kind = config.sensor_kind(sensor_prefix(sensor))?;
                named.push((sensor.clone(), kind, loc_id));
            }
        }
        named.sort_by(|a, b| a.0.cmp(&b.0));

        let mut sensors = Vec::with_capacity(named.len());
        let mut sensor_index = HashMap::new();
        for (idx, (name, kind, location)) in named.into_iter().enumerate() {
            sensor_index.insert(name.clone(), SensorId(idx));
            sensors.push(Sensor {
                name,
                kind,
                location,
            });
        }

        debug!(sensors = sensors.len(), "home model built");
        Ok(Self {
            locations,
            sensors,
            location_index,
            sensor_index,
        })
    }

    /// All sensors, in id (name-sorted) order.
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    /// All locations, in id (name-sorted) order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn num_sensors(&self) -> usize {
        self.sensors.len()
    }

    pub fn num_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn sensor(&self, id: SensorId) -> &Sensor {
        &self.sensors[id.0]
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.0]
    }

    pub fn sensor_id(&self, name: &str) -> Option<SensorId> {
        self.sensor_index.get(name).copied()
    }

    pub fn location_id(&self, name: &str) -> Option<LocationId> {
        self.location_index.get(name).copied()
    }
}

fn link_locations(locations: &mut [Location], a: LocationId, b: LocationId) {
    if !locations[a.0].adjacent.contains(&b) {
        locations[a.0].adjacent.push(b);
    }
    if !locations[b.0].adjacent.contains(&a) {
        locations[b.0].adjacent.push(a);
    }
}

/// Leading uppercase letters of a sensor name, e.g. `"LS006"` -> `"LS"`.
pub(crate) fn sensor_prefix(name: &str) -> &str {
    let end = name
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(name.len());
    &name[..end]
}
