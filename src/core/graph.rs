//! Spatial graph over sensors and locations.
//!
//! Node ordering is fixed for the lifetime of the home model: sensors first
//! (sorted by name), then locations (sorted by name). Graph algorithms are
//! free functions over the adjacency matrix; node metadata lives in a plain
//! array next to it.

use crate::core::reader::WindowSlice;
use crate::home::model::HomeModel;
use crate::home::types::{LocationId, LocationKind, SensorId, SensorKind};
use chrono::NaiveDateTime;
use ndarray::{Array2, Array3, Axis};
use std::cell::OnceCell;
use std::collections::BTreeSet;

/// Category of a graph node, the shared feature index space of sensors and
/// locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Sensor(SensorKind),
    Location(LocationKind),
}

/// The entity backing a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEntity {
    Sensor(SensorId),
    Location(LocationId),
}

/// Metadata of one graph node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub name: String,
    pub kind: NodeKind,
    pub entity: NodeEntity,
}

/// The spatial graph of a home: binary adjacency over sensors and locations
/// plus lazily computed normalized forms.
pub struct HomeGraph<'a> {
    model: &'a HomeModel,
    adjacency: Array2<f64>,
    nodes: Vec<NodeInfo>,
    /// Distinct node kinds present in the model, sorted. The one-hot feature
    /// index space.
    features: Vec<NodeKind>,
    symnorm: OnceCell<Array2<f64>>,
    laplacian: OnceCell<Array2<f64>>,
}

impl<'a> HomeGraph<'a> {
    /// Build the graph from a home model.
    ///
    /// `A[i, j] = 1` for every sensor and its location (both directions) and
    /// for every declared location adjacency, exactly as the model states it.
    pub fn new(model: &'a HomeModel) -> Self {
        let nsensors = model.num_sensors();
        let n = nsensors + model.num_locations();
        let mut adjacency = Array2::zeros((n, n));
        let mut nodes = Vec::with_capacity(n);
        let mut kinds = BTreeSet::new();

        for (i, sensor) in model.sensors().iter().enumerate() {
            let j = nsensors + sensor.location.index();
            adjacency[[i, j]] = 1.0;
            adjacency[[j, i]] = 1.0;
            nodes.push(NodeInfo {
                name: sensor.name.clone(),
                kind: NodeKind::Sensor(sensor.kind),
                entity: NodeEntity::Sensor(SensorId(i)),
            });
            kinds.insert(NodeKind::Sensor(sensor.kind));
        }

        for (idx, location) in model.locations().iter().enumerate() {
            let i = nsensors + idx;
            for &other in &location.adjacent {
                adjacency[[i, nsensors + other.index()]] = 1.0;
            }
            nodes.push(NodeInfo {
                name: location.name.clone(),
                kind: NodeKind::Location(location.kind),
                entity: NodeEntity::Location(LocationId(idx)),
            });
            kinds.insert(NodeKind::Location(location.kind));
        }

        Self {
            model,
            adjacency,
            nodes,
            features: kinds.into_iter().collect(),
            symnorm: OnceCell::new(),
            laplacian: OnceCell::new(),
        }
    }

    /// Number of nodes (sensors + locations).
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct node kinds (the feature dimension).
    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    pub fn adjacency(&self) -> &Array2<f64> {
        &self.adjacency
    }

    /// Index of a node kind in the one-hot feature space.
    pub fn feature_index(&self, kind: NodeKind) -> Option<usize> {
        self.features.binary_search(&kind).ok()
    }

    /// `D^-1/2 A D^-1/2`, computed on first access and cached.
    pub fn symnorm_adjacency(&self) -> &Array2<f64> {
        self.symnorm
            .get_or_init(|| normalize_adjacency(&self.adjacency, true))
    }

    /// `I - D^-1/2 A D^-1/2`, computed on first access and cached.
    pub fn normalized_laplacian(&self) -> &Array2<f64> {
        self.laplacian.get_or_init(|| {
            let n = self.num_nodes();
            Array2::eye(n) - self.symnorm_adjacency()
        })
    }

    /// Build the `(nodes x features x timesteps)` node-feature tensor for a
    /// window slice, plus the matching time vector.
    ///
    /// Location nodes carry a static one-hot kind feature; sensor nodes carry
    /// their live value in their kind's slot, filled by the same
    /// carry-forward rule as the flat feature matrix.
    pub fn node_feature_tensor(
        &self,
        slice: &WindowSlice,
    ) -> (Array3<f64>, Vec<NaiveDateTime>) {
        let steps = slice.sensor_events.len();
        let nsensors = self.model.num_sensors();
        let mut tensor = Array3::zeros((self.num_nodes(), self.num_features(), steps));
        let mut times = Vec::with_capacity(steps);

        if steps == 0 {
            return (tensor, times);
        }

        // Locations are one-hot coded at the first timestep; carry-forward
        // keeps them set for the rest of the window.
        for (idx, location) in self.model.locations().iter().enumerate() {
            if let Some(j) = self.feature_index(NodeKind::Location(location.kind)) {
                tensor[[nsensors + idx, j, 0]] = 1.0;
            }
        }

        for (t, measurement) in slice.sensor_events.iter().enumerate() {
            if t > 0 {
                let previous = tensor.index_axis(Axis(2), t - 1).to_owned();
                tensor.index_axis_mut(Axis(2), t).assign(&previous);
            }

            let sensor = self.model.sensor(measurement.sensor);
            if let Some(j) = self.feature_index(NodeKind::Sensor(sensor.kind)) {
                tensor[[measurement.sensor.index(), j, t]] = measurement.value;
            }
            times.push(measurement.timestamp);
        }

        (tensor, times)
    }
}

/// Normalize an adjacency matrix by node degree.
///
/// Degrees come from column sums. Zero-degree (isolated) nodes get a zero
/// coefficient, which is what the Moore-Penrose pseudo-inverse of the
/// diagonal degree matrix degenerates to; normalization never divides by
/// zero. `symmetric` selects `D^-1/2 A D^-1/2`, otherwise `D^+ A`.
pub fn normalize_adjacency(adjacency: &Array2<f64>, symmetric: bool) -> Array2<f64> {
    let degrees = adjacency.sum_axis(Axis(0));

    if symmetric {
        let scale: Vec<f64> = degrees
            .iter()
            .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
            .collect();
        Array2::from_shape_fn(adjacency.dim(), |(i, j)| {
            adjacency[[i, j]] * scale[i] * scale[j]
        })
    } else {
        let scale: Vec<f64> = degrees
            .iter()
            .map(|&d| if d > 0.0 { 1.0 / d } else { 0.0 })
            .collect();
        Array2::from_shape_fn(adjacency.dim(), |(i, j)| adjacency[[i, j]] * scale[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::toy_dataset;
    use crate::core::reader::EventReader;
    use ndarray::array;

    fn toy_graph_fixture() -> (crate::config::DatasetConfig, HomeModel) {
        let config = toy_dataset();
        let model = HomeModel::build(&config).unwrap();
        (config, model)
    }

    #[test]
    fn test_adjacency_structure() {
        let (_, model) = toy_graph_fixture();
        let graph = HomeGraph::new(&model);

        // 5 sensors + 3 locations.
        assert_eq!(graph.num_nodes(), 8);
        let a = graph.adjacency();

        // Sensor rows: LS003(0), M001(1), M002(2), M003(3), T101(4);
        // location rows: bedroom(5), kitchen(6), living_room(7).
        assert_eq!(a[[0, 7]], 1.0); // LS003 in living_room
        assert_eq!(a[[7, 0]], 1.0);
        assert_eq!(a[[2, 6]], 1.0); // M002 in kitchen
        assert_eq!(a[[3, 5]], 1.0); // M003 in bedroom
        assert_eq!(a[[7, 6]], 1.0); // living_room - kitchen
        assert_eq!(a[[6, 7]], 1.0);
        assert_eq!(a[[6, 5]], 0.0); // kitchen and bedroom are not adjacent

        // Fully symmetric.
        for i in 0..8 {
            for j in 0..8 {
                assert_eq!(a[[i, j]], a[[j, i]]);
            }
        }
    }

    #[test]
    fn test_symmetric_normalization_matches_direct_inverse() {
        // Full-rank case: compare against D^-1/2 A D^-1/2 computed with a
        // plain reciprocal.
        let a = array![[0.0, 1.0, 1.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let normalized = normalize_adjacency(&a, true);

        let degrees = [2.0f64, 1.0, 1.0];
        for i in 0..3 {
            for j in 0..3 {
                let expected = a[[i, j]] / (degrees[i].sqrt() * degrees[j].sqrt());
                assert!((normalized[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_isolated_node_does_not_break_normalization() {
        let a = array![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let normalized = normalize_adjacency(&a, true);

        assert!(normalized.iter().all(|v| v.is_finite()));
        assert_eq!(normalized[[2, 0]], 0.0);
        assert_eq!(normalized[[0, 1]], 1.0);
    }

    #[test]
    fn test_asymmetric_normalization_scales_rows() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let normalized = normalize_adjacency(&a, false);
        assert_eq!(normalized, array![[0.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_laplacian_is_identity_minus_symnorm() {
        let (_, model) = toy_graph_fixture();
        let graph = HomeGraph::new(&model);

        let laplacian = graph.normalized_laplacian();
        let symnorm = graph.symnorm_adjacency();
        let n = graph.num_nodes();
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j { 1.0 } else { 0.0 } - symnorm[[i, j]];
                assert!((laplacian[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_node_feature_tensor() {
        let (config, model) = toy_graph_fixture();
        let dir = std::env::temp_dir().join("homesense-graph-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tensor.txt");
        std::fs::write(
            &path,
            "2011-06-15 00:00:05.000 M001 ON\n\
             2011-06-15 00:10:00.000 T101 20.5\n",
        )
        .unwrap();

        let mut reader = EventReader::new(&model, &config, path).unwrap();
        let slice = reader.read_window(0, None).unwrap().clone();

        let graph = HomeGraph::new(&model);
        let (tensor, times) = graph.node_feature_tensor(&slice);

        // Kinds present: light, motion, temperature, bedroom, kitchen,
        // living_room.
        assert_eq!(graph.num_features(), 6);
        assert_eq!(tensor.shape(), &[8, 6, 2]);
        assert_eq!(times.len(), 2);

        let motion = graph.feature_index(NodeKind::Sensor(SensorKind::Motion)).unwrap();
        let temperature = graph
            .feature_index(NodeKind::Sensor(SensorKind::Temperature))
            .unwrap();
        let kitchen = graph
            .feature_index(NodeKind::Location(LocationKind::Kitchen))
            .unwrap();

        let m001 = model.sensor_id("M001").unwrap().index();
        let t101 = model.sensor_id("T101").unwrap().index();
        let kitchen_node = 5 + model.location_id("kitchen").unwrap().index();

        // Sensor value lands in its kind's slot and is carried forward.
        assert_eq!(tensor[[m001, motion, 0]], 1.0);
        assert_eq!(tensor[[m001, motion, 1]], 1.0);
        assert_eq!(tensor[[t101, temperature, 0]], 0.0);
        assert_eq!(tensor[[t101, temperature, 1]], 20.5);

        // Location one-hot is static across time.
        assert_eq!(tensor[[kitchen_node, kitchen, 0]], 1.0);
        assert_eq!(tensor[[kitchen_node, kitchen, 1]], 1.0);
    }
}
