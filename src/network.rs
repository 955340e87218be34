//! Built chain network: node arena, chains and construction warnings

use serde::{Deserialize, Serialize};

use crate::elements::{Chain, Node, SimulationPhase};
use crate::error::{BuildWarning, CatenaryError, CatenaryResult};
use crate::math::{Mat4, Plane, Point3, Vec3};

/// Per-node position and last force, in arena order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionsAndForces {
    pub positions: Vec<Point3>,
    /// Zero for nodes that have not been stepped
    pub forces: Vec<Vec3>,
}

/// Per-node self-weight, applied load and their sum, in arena order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassAndLoad {
    pub mass: Vec<f64>,
    pub load: Vec<f64>,
    pub combined: Vec<f64>,
}

/// Geometry of a simulated network after a transform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformedNetwork {
    /// One polyline per simulated chain
    pub curves: Vec<Vec<Point3>>,
    pub anchors: Vec<Point3>,
    /// Simulated nodes that are not anchors
    pub nodes: Vec<Point3>,
}

/// A network of chains sharing nodes, produced by [`crate::model::ChainModel::build`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NetworkData")]
pub struct Network {
    pub(crate) nodes: Vec<Node>,
    pub(crate) chains: Vec<Chain>,
    /// Model tolerance used during construction
    pub(crate) tolerance: f64,
    pub(crate) warnings: Vec<BuildWarning>,
}

/// Unchecked deserialized form of [`Network`]
#[derive(Deserialize)]
struct NetworkData {
    nodes: Vec<Node>,
    chains: Vec<Chain>,
    tolerance: f64,
    warnings: Vec<BuildWarning>,
}

impl TryFrom<NetworkData> for Network {
    type Error = CatenaryError;

    fn try_from(data: NetworkData) -> CatenaryResult<Self> {
        let network = Self::from_parts(data.nodes, data.chains, data.tolerance, data.warnings);
        network.validate()?;
        Ok(network)
    }
}

impl Network {
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        chains: Vec<Chain>,
        tolerance: f64,
        warnings: Vec<BuildWarning>,
    ) -> Self {
        Self {
            nodes,
            chains,
            tolerance,
            warnings,
        }
    }

    // ========================
    // Accessors
    // ========================

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn node(&self, index: usize) -> CatenaryResult<&Node> {
        self.nodes
            .get(index)
            .ok_or(CatenaryError::NodeNotFound(index))
    }

    pub fn chain(&self, index: usize) -> CatenaryResult<&Chain> {
        self.chains
            .get(index)
            .ok_or(CatenaryError::ChainNotFound(index))
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Recoverable conditions met while building
    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn anchors(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_anchor)
    }

    pub fn num_anchors(&self) -> usize {
        self.anchors().count()
    }

    /// Lowest phase over all nodes and chains
    pub fn phase(&self) -> SimulationPhase {
        self.nodes
            .iter()
            .map(|n| n.phase)
            .chain(self.chains.iter().map(|c| c.phase))
            .min()
            .unwrap_or(SimulationPhase::Invalid)
    }

    /// Every node and chain can be stepped
    pub fn is_ready(&self) -> bool {
        self.phase().can_simulate()
    }

    pub fn is_simulated(&self) -> bool {
        self.phase() == SimulationPhase::Simulated
    }

    pub(crate) fn set_phase(&mut self, phase: SimulationPhase) {
        for node in &mut self.nodes {
            node.phase = phase;
        }
        for chain in &mut self.chains {
            chain.phase = phase;
        }
    }

    /// Restore rest positions, clear forces and mark everything ready.
    ///
    /// Chain lengths and self-weight are recomputed from the rest
    /// geometry, so calling this twice has no further effect.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
        for chain in self.chains.iter_mut() {
            chain.update_poly_length(&self.nodes);
        }
        for chain in &self.chains {
            chain.reset_mass(&mut self.nodes);
        }
        for chain in &self.chains {
            chain.update_mass(&mut self.nodes);
        }
        self.set_phase(SimulationPhase::Ready);
    }

    // ========================
    // Export views
    // ========================

    /// Largest force magnitude of the last substep
    pub fn max_displacement(&self) -> f64 {
        self.nodes
            .iter()
            .map(Node::force_magnitude)
            .fold(0.0, f64::max)
    }

    pub fn positions_and_forces(&self) -> PositionsAndForces {
        PositionsAndForces {
            positions: self.nodes.iter().map(|n| n.position).collect(),
            forces: self
                .nodes
                .iter()
                .map(|n| n.force.unwrap_or_else(Vec3::zeros))
                .collect(),
        }
    }

    pub fn mass_and_load(&self) -> MassAndLoad {
        MassAndLoad {
            mass: self.nodes.iter().map(|n| n.mass).collect(),
            load: self.nodes.iter().map(|n| n.load).collect(),
            combined: self.nodes.iter().map(Node::total_mass).collect(),
        }
    }

    /// Total self-weight plus applied load over all nodes
    pub fn total_mass(&self) -> f64 {
        self.nodes.iter().map(Node::total_mass).sum()
    }

    /// Current node positions of every chain, in chain order
    pub fn polylines(&self) -> Vec<Vec<Point3>> {
        self.chains.iter().map(|c| c.polyline(&self.nodes)).collect()
    }

    // ========================
    // Transforms
    // ========================

    /// Apply an affine transform to the simulated geometry
    pub fn transformed(&self, xform: &Mat4) -> CatenaryResult<TransformedNetwork> {
        if !xform.iter().all(|v| v.is_finite()) {
            log::warn!("Rejected non-finite transform");
            return Err(CatenaryError::InvalidGeometry(
                "transform contains non-finite entries".to_string(),
            ));
        }

        let chains: Vec<&Chain> = self
            .chains
            .iter()
            .filter(|c| c.phase == SimulationPhase::Simulated)
            .collect();
        let nodes: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|n| n.phase == SimulationPhase::Simulated)
            .collect();

        if chains.len() < self.chains.len() || nodes.len() < self.nodes.len() {
            log::info!(
                "Skipping {} chains and {} nodes that were not simulated",
                self.chains.len() - chains.len(),
                self.nodes.len() - nodes.len()
            );
        }
        if chains.is_empty() || nodes.len() < 2 {
            log::warn!("Not enough simulated chains or nodes to transform");
            return Err(CatenaryError::NotSimulated);
        }

        let curves: Vec<Vec<Point3>> = chains
            .iter()
            .map(|c| {
                c.polyline(&self.nodes)
                    .iter()
                    .map(|p| xform.transform_point(p))
                    .collect::<Vec<_>>()
            })
            .collect();

        let (anchors, free): (Vec<&Node>, Vec<&Node>) = nodes.into_iter().partition(|n| n.is_anchor);

        Ok(TransformedNetwork {
            curves,
            anchors: anchors
                .iter()
                .map(|n| xform.transform_point(&n.position))
                .collect(),
            nodes: free
                .iter()
                .map(|n| xform.transform_point(&n.position))
                .collect(),
        })
    }

    /// Mirror the simulated geometry across a plane
    pub fn mirrored(&self, plane: &Plane) -> CatenaryResult<TransformedNetwork> {
        self.transformed(&plane.mirror_transform())
    }

    // ========================
    // Serialization
    // ========================

    pub fn to_json(&self) -> CatenaryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a network and check its arena indices
    pub fn from_json(json: &str) -> CatenaryResult<Self> {
        let data: NetworkData = serde_json::from_str(json)?;
        Self::try_from(data)
    }

    /// Every stored index must point into the arena, and each neighbour
    /// edge must name its owning chain.
    fn validate(&self) -> CatenaryResult<()> {
        let invalid = |message: String| {
            log::warn!("Rejected network: {}", message);
            Err(CatenaryError::InvalidGeometry(message))
        };
        let num_nodes = self.nodes.len();
        let num_chains = self.chains.len();

        for (i, node) in self.nodes.iter().enumerate() {
            if node.index != i {
                return invalid(format!("node {} is stored at position {}", node.index, i));
            }
            if node.neighbours.len() != node.neighbour_chains.len() {
                return invalid(format!(
                    "node {} has {} neighbours but {} neighbour chains",
                    i,
                    node.neighbours.len(),
                    node.neighbour_chains.len()
                ));
            }
            if let Some(n) = node.neighbours.iter().find(|&&n| n >= num_nodes) {
                return invalid(format!("node {} references missing node {}", i, n));
            }
            if let Some(c) = node.neighbour_chains.iter().find(|&&c| c >= num_chains) {
                return invalid(format!("node {} references missing chain {}", i, c));
            }
        }

        for (i, chain) in self.chains.iter().enumerate() {
            if chain.index != i {
                return invalid(format!("chain {} is stored at position {}", chain.index, i));
            }
            if let Some(n) = chain.nodes.iter().find(|&&n| n >= num_nodes) {
                return invalid(format!("chain {} references missing node {}", i, n));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{run, SolverOptions};
    use crate::elements::{Anchor, ChainSpec};
    use crate::math::Line;
    use crate::model::ChainModel;
    use approx::assert_relative_eq;

    fn span() -> Network {
        let mut model = ChainModel::new();
        model.add_chain(ChainSpec::new(
            Line::from_coords([0.0, 0.0, 0.0], [3.0, 0.0, 0.0]),
            1.0,
            1.0,
            1.0,
        ));
        model.add_anchor(Anchor::fixed(Point3::new(0.0, 0.0, 0.0)));
        model.add_anchor(Anchor::fixed(Point3::new(3.0, 0.0, 0.0)));
        model.build().unwrap()
    }

    #[test]
    fn test_accessors() {
        let network = span();
        assert_eq!(network.num_nodes(), 4);
        assert_eq!(network.num_chains(), 1);
        assert_eq!(network.num_anchors(), 2);
        assert!(network.is_ready());
        assert!(network.node(3).is_ok());
        assert!(matches!(network.node(4), Err(CatenaryError::NodeNotFound(4))));
        assert!(matches!(network.chain(1), Err(CatenaryError::ChainNotFound(1))));
    }

    #[test]
    fn test_mass_and_load() {
        let network = span();
        let ml = network.mass_and_load();
        assert_relative_eq!(ml.mass.iter().sum::<f64>(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(ml.mass[0], 0.5, epsilon = 1e-12);
        assert_eq!(ml.combined, ml.mass);
    }

    #[test]
    fn test_transform_requires_simulation() {
        let network = span();
        let result = network.transformed(&Mat4::identity());
        assert!(matches!(result, Err(CatenaryError::NotSimulated)));
    }

    #[test]
    fn test_mirror_after_run() {
        let mut network = span();
        let options = SolverOptions::new().with_max_iter(5);
        run(&mut network, &options).unwrap();

        let mirrored = network.mirrored(&Plane::world_xy()).unwrap();
        assert_eq!(mirrored.curves.len(), 1);
        assert_eq!(mirrored.anchors.len(), 2);
        assert_eq!(mirrored.nodes.len(), 2);

        let original = network.polylines();
        for (a, b) in original[0].iter().zip(&mirrored.curves[0]) {
            assert_relative_eq!(a.z, -b.z, epsilon = 1e-12);
            assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_json_round_trip_keeps_geometry() {
        let network = span();
        let json = network.to_json().unwrap();
        let restored = Network::from_json(&json).unwrap();
        assert_eq!(restored.num_nodes(), network.num_nodes());
        for (a, b) in restored.polylines()[0].iter().zip(&network.polylines()[0]) {
            assert_relative_eq!((a - b).norm(), 0.0, epsilon = 1e-12);
        }
    }

    fn span_json() -> serde_json::Value {
        serde_json::from_str(&span().to_json().unwrap()).unwrap()
    }

    fn assert_rejected(value: &serde_json::Value) {
        let result = Network::from_json(&value.to_string());
        assert!(matches!(result, Err(CatenaryError::InvalidGeometry(_))));
        assert!(serde_json::from_value::<Network>(value.clone()).is_err());
    }

    #[test]
    fn test_json_rejects_missing_neighbour() {
        let mut value = span_json();
        value["nodes"][1]["neighbours"][0] = serde_json::json!(999);
        assert_rejected(&value);
    }

    #[test]
    fn test_json_rejects_missing_neighbour_chain() {
        let mut value = span_json();
        value["nodes"][1]["neighbour_chains"][0] = serde_json::json!(3);
        assert_rejected(&value);
    }

    #[test]
    fn test_json_rejects_unpaired_neighbour_lists() {
        let mut value = span_json();
        value["nodes"][1]["neighbour_chains"]
            .as_array_mut()
            .unwrap()
            .pop();
        assert_rejected(&value);
    }

    #[test]
    fn test_json_rejects_missing_chain_node() {
        let mut value = span_json();
        value["chains"][0]["nodes"][2] = serde_json::json!(4);
        assert_rejected(&value);
    }

    #[test]
    fn test_json_rejects_shuffled_arena() {
        let mut value = span_json();
        value["nodes"][0]["index"] = serde_json::json!(2);
        assert_rejected(&value);
    }
}
