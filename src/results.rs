//! Result snapshots for a relaxed network

use serde::{Deserialize, Serialize};

use crate::analysis::SimulationOutcome;
use crate::elements::{Chain, Node};
use crate::error::CatenaryResult;
use crate::math::{Line, Point3, Vec3};
use crate::network::Network;

/// Snapshot of a single node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReport {
    pub index: usize,
    /// Position at construction
    pub initial_position: Point3,
    /// Current position
    pub position: Point3,
    /// Last substep force, zero if never stepped
    pub force: Vec3,
    pub mass: f64,
    pub load: f64,
    pub is_anchor: bool,
    /// Allowed translation along X
    pub move_x: bool,
    /// Allowed translation along Y
    pub move_y: bool,
    /// Allowed translation along Z
    pub move_z: bool,
    pub neighbours: Vec<usize>,
    /// Chain owning each neighbour edge
    pub neighbour_chains: Vec<usize>,
}

impl NodeReport {
    pub fn from_node(node: &Node) -> Self {
        let freedom = node.freedom();
        Self {
            index: node.index(),
            initial_position: node.initial_position(),
            position: node.position(),
            force: node.force().unwrap_or_else(Vec3::zeros),
            mass: node.mass(),
            load: node.load(),
            is_anchor: node.is_anchor(),
            move_x: freedom.x,
            move_y: freedom.y,
            move_z: freedom.z,
            neighbours: node.neighbours().to_vec(),
            neighbour_chains: node.neighbour_chains().to_vec(),
        }
    }

    /// Report for the node at `index`
    pub fn extract(network: &Network, index: usize) -> CatenaryResult<Self> {
        Ok(Self::from_node(network.node(index)?))
    }

    /// Reports for every node, in arena order
    pub fn extract_all(network: &Network) -> Vec<Self> {
        network.nodes().iter().map(Self::from_node).collect()
    }
}

/// Snapshot of a single chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    pub index: usize,
    pub initial_line: Line,
    pub elasticity: f64,
    pub mass_per_length: f64,
    pub node_resolution: f64,
    pub max_length: f64,
    pub poly_length: f64,
    pub node_indices: Vec<usize>,
    /// Current node positions, in chain order
    pub polyline: Vec<Point3>,
    pub anchors: Vec<bool>,
}

impl ChainReport {
    pub fn from_chain(chain: &Chain, nodes: &[Node]) -> Self {
        Self {
            index: chain.index(),
            initial_line: chain.initial_line(),
            elasticity: chain.elasticity(),
            mass_per_length: chain.mass_per_length(),
            node_resolution: chain.node_resolution(),
            max_length: chain.max_length(),
            poly_length: chain.poly_length(),
            node_indices: chain.nodes().to_vec(),
            polyline: chain.polyline(nodes),
            anchors: chain.nodes().iter().map(|&i| nodes[i].is_anchor()).collect(),
        }
    }

    pub fn extract(network: &Network, index: usize) -> CatenaryResult<Self> {
        Ok(Self::from_chain(network.chain(index)?, network.nodes()))
    }

    pub fn extract_all(network: &Network) -> Vec<Self> {
        network
            .chains()
            .iter()
            .map(|c| Self::from_chain(c, network.nodes()))
            .collect()
    }
}

/// Summary of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub num_chains: usize,
    /// Anchors included
    pub num_all_nodes: usize,
    pub num_anchors: usize,
    /// Nodes that are not anchors
    pub num_nodes: usize,
    pub iterations: usize,
    pub converged: bool,
    pub termination: f64,
    /// Summed movement of the last iteration
    pub iteration_movement: f64,
}

impl SimulationSummary {
    pub fn new(network: &Network, outcome: &SimulationOutcome) -> Self {
        let num_anchors = network.num_anchors();
        Self {
            num_chains: network.num_chains(),
            num_all_nodes: network.num_nodes(),
            num_anchors,
            num_nodes: network.num_nodes() - num_anchors,
            iterations: outcome.iterations,
            converged: outcome.converged,
            termination: outcome.termination,
            iteration_movement: outcome.displacement,
        }
    }

    /// Human-readable summary, one entry per line
    pub fn info_lines(&self) -> Vec<String> {
        vec![
            format!("Number_of_Chains: {}", self.num_chains),
            format!("Number_of_AllNodes: {}", self.num_all_nodes),
            format!("Number_of_Anchors: {}", self.num_anchors),
            format!("Number_of_Nodes: {}", self.num_nodes),
            "- - - - - - - - - - - - - - - - -".to_string(),
            format!("Successful_Simulation: {}", self.converged),
            format!("Termination_Movement: {}", self.termination),
            format!("Iteration_Movement: {}", self.iteration_movement),
            format!("Iterations: {}", self.iterations),
        ]
    }

    pub fn to_json(&self) -> CatenaryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{run, SolverOptions};
    use crate::elements::{Anchor, ChainSpec, Freedom};
    use crate::error::CatenaryError;
    use crate::model::ChainModel;

    fn network() -> Network {
        let mut model = ChainModel::new();
        model.add_chain(ChainSpec::new(
            Line::from_coords([0.0, 0.0, 0.0], [3.0, 0.0, 0.0]),
            1.0,
            1.0,
            1.0,
        ));
        model.add_anchor(Anchor::fixed(Point3::new(0.0, 0.0, 0.0)));
        model.add_anchor(Anchor::fixed(Point3::new(3.0, 0.0, 0.0)).with_freedom(Freedom::slider_z()));
        model.build().unwrap()
    }

    #[test]
    fn test_node_report() {
        let network = network();
        let report = NodeReport::extract(&network, 3).unwrap();
        assert!(report.is_anchor);
        assert!(!report.move_x && !report.move_y && report.move_z);
        assert_eq!(report.neighbours, vec![2]);
        assert_eq!(report.force, Vec3::zeros());
        assert!(matches!(
            NodeReport::extract(&network, 10),
            Err(CatenaryError::NodeNotFound(10))
        ));
    }

    #[test]
    fn test_chain_report() {
        let network = network();
        let report = ChainReport::extract(&network, 0).unwrap();
        assert_eq!(report.node_indices, vec![0, 1, 2, 3]);
        assert_eq!(report.anchors, vec![true, false, false, true]);
        assert_eq!(report.polyline.len(), 4);
        assert_eq!(ChainReport::extract_all(&network).len(), 1);
    }

    #[test]
    fn test_summary() {
        let mut network = network();
        let outcome = run(&mut network, &SolverOptions::new().with_max_iter(2)).unwrap();
        let summary = SimulationSummary::new(&network, &outcome);
        assert_eq!(summary.num_all_nodes, 4);
        assert_eq!(summary.num_anchors, 2);
        assert_eq!(summary.num_nodes, 2);
        assert_eq!(summary.info_lines()[0], "Number_of_Chains: 1");
        assert!(summary.to_json().unwrap().contains("\"num_chains\": 1"));
    }
}
