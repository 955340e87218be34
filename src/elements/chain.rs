//! Chain element - a discretized straight member

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Node, SimulationPhase};
use crate::math::{Line, Point3};

pub const MIN_ELASTICITY: f64 = 0.01;
pub const MAX_ELASTICITY: f64 = 10.0;
/// Bounds on the number of segments a chain is divided into
pub const MIN_NODE_SEGMENTS: usize = 3;
pub const MAX_NODE_SEGMENTS: usize = 10_000;

/// Input descriptor for one straight chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSpec {
    /// Initial straight line
    pub line: Line,
    /// Elasticity in [0.01, 10]; smaller values give more deformation
    pub elasticity: f64,
    /// Mass per unit length
    pub mass_per_length: f64,
    /// Average spacing of the sampled nodes; smaller gives more nodes
    pub node_resolution: f64,
}

impl ChainSpec {
    /// Create a chain spec with sanitized parameters
    pub fn new(line: Line, elasticity: f64, mass_per_length: f64, node_resolution: f64) -> Self {
        Self {
            line,
            elasticity: clamp_elasticity(elasticity),
            mass_per_length: mass_per_length.abs(),
            node_resolution: node_resolution.abs(),
        }
    }

    /// Chain with the default parameters (elasticity 0.75, 0.5 mass/m, 0.25 resolution)
    pub fn from_line(line: Line) -> Self {
        Self::new(line, 0.75, 0.5, 0.25)
    }

    pub fn with_elasticity(mut self, elasticity: f64) -> Self {
        self.elasticity = clamp_elasticity(elasticity);
        self
    }

    pub fn with_mass_per_length(mut self, mass_per_length: f64) -> Self {
        self.mass_per_length = mass_per_length.abs();
        self
    }

    pub fn with_node_resolution(mut self, node_resolution: f64) -> Self {
        self.node_resolution = node_resolution.abs();
        self
    }

    pub fn is_valid(&self) -> bool {
        self.line.is_valid() && self.elasticity.is_finite() && self.mass_per_length.is_finite()
    }

    /// Same parameters on a different line (used when splitting)
    pub(crate) fn with_line(&self, line: Line) -> Self {
        Self { line, ..*self }
    }

    /// Number of segments the line is divided into
    pub fn divisions(&self) -> usize {
        let raw = self.line.length() / self.node_resolution;
        if raw.is_nan() {
            return MIN_NODE_SEGMENTS;
        }
        // float-to-int casts saturate, so infinity lands on the upper bound
        (raw as usize).clamp(MIN_NODE_SEGMENTS, MAX_NODE_SEGMENTS)
    }
}

fn clamp_elasticity(elasticity: f64) -> f64 {
    elasticity.abs().clamp(MIN_ELASTICITY, MAX_ELASTICITY)
}

/// A chain in a built network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub(crate) index: usize,
    pub(crate) id: Uuid,

    /// Straight base segment before discretization
    pub(crate) initial_line: Line,

    pub(crate) elasticity: f64,
    pub(crate) mass_per_length: f64,
    pub(crate) node_resolution: f64,

    /// Free length the springs relax towards
    pub(crate) max_length: f64,
    /// Current length of the node polyline
    pub(crate) poly_length: f64,

    /// Ordered node indices into the network arena
    pub(crate) nodes: Vec<usize>,

    pub(crate) phase: SimulationPhase,
}

impl Chain {
    /// Create an empty chain from a spec; nodes are attached by the builder
    pub(crate) fn from_spec(index: usize, spec: &ChainSpec) -> Self {
        let length = spec.line.length();
        Self {
            index,
            id: Uuid::new_v4(),
            initial_line: spec.line,
            elasticity: spec.elasticity,
            mass_per_length: spec.mass_per_length,
            node_resolution: spec.node_resolution,
            max_length: length / spec.elasticity,
            poly_length: length,
            nodes: Vec::new(),
            phase: SimulationPhase::PreProcessing,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn initial_line(&self) -> Line {
        self.initial_line
    }

    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    pub fn mass_per_length(&self) -> f64 {
        self.mass_per_length
    }

    pub fn node_resolution(&self) -> f64 {
        self.node_resolution
    }

    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    pub fn poly_length(&self) -> f64 {
        self.poly_length
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Current spring coefficient: polyline length over free length
    pub fn spring_coefficient(&self) -> f64 {
        self.poly_length / self.max_length
    }

    /// Total self-weight at the current length
    pub fn total_mass(&self) -> f64 {
        self.poly_length * self.mass_per_length
    }

    /// Mass of one full node share for the current length
    pub fn node_mass_share(&self) -> f64 {
        let segments = self.nodes.len().saturating_sub(1);
        if segments == 0 {
            return 0.0;
        }
        self.total_mass() / segments as f64
    }

    /// Recompute the polyline length from node positions
    pub(crate) fn update_poly_length(&mut self, nodes: &[Node]) {
        self.poly_length = self
            .nodes
            .windows(2)
            .map(|w| (nodes[w[1]].position - nodes[w[0]].position).norm())
            .sum();
    }

    /// Zero the mass of every node on this chain
    pub(crate) fn reset_mass(&self, nodes: &mut [Node]) {
        for &i in &self.nodes {
            nodes[i].mass = 0.0;
        }
    }

    /// Add this chain's mass shares to its nodes.
    ///
    /// End nodes receive half a share, interior nodes a full one.
    pub(crate) fn update_mass(&self, nodes: &mut [Node]) {
        let share = self.node_mass_share();
        let last = self.nodes.len().saturating_sub(1);
        for (i, &n) in self.nodes.iter().enumerate() {
            if i == 0 || i == last {
                nodes[n].mass += share * 0.5;
            } else {
                nodes[n].mass += share;
            }
        }
    }

    /// Register first/last/interior neighbour edges on this chain's nodes
    pub(crate) fn connect_neighbours(&self, nodes: &mut [Node]) {
        let count = self.nodes.len();
        for i in 0..count {
            let node = self.nodes[i];
            if i > 0 {
                nodes[node].neighbours.push(self.nodes[i - 1]);
                nodes[node].neighbour_chains.push(self.index);
            }
            if i + 1 < count {
                nodes[node].neighbours.push(self.nodes[i + 1]);
                nodes[node].neighbour_chains.push(self.index);
            }
        }
    }

    /// Current node positions in chain order
    pub fn polyline(&self, nodes: &[Node]) -> Vec<Point3> {
        self.nodes.iter().map(|&i| nodes[i].position).collect()
    }
}
