//! Node element - a point mass in the chain network

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Chain, Freedom, SimulationPhase};
use crate::analysis::IterationParams;
use crate::math::{Point3, Vec3};

/// Fixed factor tying mass units to displacement units in the gravity term
pub const GRAVITY_SCALE: f64 = 0.1;

/// A point mass in the network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Dense index in the network arena
    pub(crate) index: usize,
    /// Opaque unique id
    pub(crate) id: Uuid,

    /// Current position
    pub(crate) position: Point3,
    /// Rest position recorded at construction
    pub(crate) initial_position: Point3,

    /// Displacement of the last substep (`None` until the first force pass)
    pub(crate) force: Option<Vec3>,
    /// Self-weight gathered from the owning chains
    pub(crate) mass: f64,
    /// Externally applied mass
    pub(crate) load: f64,

    /// Neighbouring node indices
    pub(crate) neighbours: Vec<usize>,
    /// Chain index owning each neighbour edge
    pub(crate) neighbour_chains: Vec<usize>,

    pub(crate) is_anchor: bool,
    pub(crate) freedom: Freedom,

    pub(crate) phase: SimulationPhase,
}

impl Node {
    /// Create a detached node at `position`
    pub(crate) fn new(position: Point3, anchor: Option<Freedom>) -> Self {
        Self {
            index: usize::MAX,
            id: Uuid::new_v4(),
            position,
            initial_position: position,
            force: None,
            mass: 0.0,
            load: 0.0,
            neighbours: Vec::new(),
            neighbour_chains: Vec::new(),
            is_anchor: anchor.is_some(),
            freedom: anchor.unwrap_or_else(Freedom::free),
            phase: SimulationPhase::Ready,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn position(&self) -> Point3 {
        self.position
    }

    pub fn initial_position(&self) -> Point3 {
        self.initial_position
    }

    /// Force (displacement) of the last substep, `None` if unset
    pub fn force(&self) -> Option<Vec3> {
        self.force
    }

    /// Magnitude of the last force, 0 when unset
    pub fn force_magnitude(&self) -> f64 {
        self.force.map_or(0.0, |f| f.norm())
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn load(&self) -> f64 {
        self.load
    }

    /// Self-weight plus applied load
    pub fn total_mass(&self) -> f64 {
        self.mass + self.load
    }

    pub fn is_anchor(&self) -> bool {
        self.is_anchor
    }

    /// Translational freedom (only meaningful for anchors)
    pub fn freedom(&self) -> Freedom {
        self.freedom
    }

    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    pub fn neighbour_chains(&self) -> &[usize] {
        &self.neighbour_chains
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Distance travelled from the rest position
    pub fn displacement(&self) -> Vec3 {
        self.position - self.initial_position
    }

    /// Compute this node's substep force from the current network state.
    ///
    /// Reads neighbour positions only; the caller stores the result.
    pub(crate) fn compute_force(
        &self,
        nodes: &[Node],
        chains: &[Chain],
        params: &IterationParams,
    ) -> Vec3 {
        let gravity_force = params.gravity * (self.total_mass() * GRAVITY_SCALE);

        // spring stiffness grows as the chain stretches past its free length
        let spring_force = self
            .neighbours
            .iter()
            .zip(&self.neighbour_chains)
            .fold(Vec3::zeros(), |acc, (&n, &c)| {
                acc + (nodes[n].position - self.position) * chains[c].spring_coefficient()
            });

        let mut total = (gravity_force + spring_force) * params.friction;

        let length = total.norm();
        if length > params.max_amplitude && length > 0.0 {
            total = (total / length) * params.max_amplitude;
        }

        total /= params.substeps as f64;

        if self.is_anchor {
            total = self.freedom.project(total);
        }

        total
    }

    /// Store the force and move by it
    pub(crate) fn apply_force(&mut self, force: Vec3) {
        self.force = Some(force);
        self.position += force;
    }

    /// Restore the rest position and clear the force
    pub(crate) fn reset(&mut self) {
        self.position = self.initial_position;
        self.force = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new(Point3::new(1.0, 2.0, 3.0), None);
        assert_eq!(node.position(), node.initial_position());
        assert!(!node.is_anchor());
        assert!(node.force().is_none());
        assert_eq!(node.force_magnitude(), 0.0);
    }

    #[test]
    fn test_anchor_node() {
        let node = Node::new(Point3::origin(), Some(Freedom::slider_z()));
        assert!(node.is_anchor());
        assert_eq!(node.freedom(), Freedom::slider_z());
    }

    #[test]
    fn test_reset() {
        let mut node = Node::new(Point3::origin(), None);
        node.apply_force(Vec3::new(0.0, 0.0, -0.5));
        assert_eq!(node.position(), Point3::new(0.0, 0.0, -0.5));
        node.reset();
        assert_eq!(node.position(), Point3::origin());
        assert!(node.force().is_none());
    }

    #[test]
    fn test_anchor_keeps_free_components() {
        use crate::elements::{Anchor, ChainSpec};
        use crate::math::Line;
        use crate::model::ChainModel;

        let mut model = ChainModel::new();
        model.add_chain(ChainSpec::new(
            Line::from_coords([0.0, 0.0, 0.0], [3.0, 0.0, 0.0]),
            1.0,
            1.0,
            1.0,
        ));
        model.add_anchor(Anchor::fixed(Point3::new(0.0, 0.0, 0.0)));
        model.add_anchor(Anchor::fixed(Point3::new(3.0, 0.0, 0.0)));
        model.add_anchor(Anchor::fixed(Point3::new(1.0, 0.0, 0.0)).with_freedom(Freedom::planar_xy()));
        let network = model.build().unwrap();

        let params = IterationParams {
            gravity: Vec3::new(0.003, 0.002, -0.01),
            friction: 0.8,
            substeps: 2,
            max_amplitude: 1.0,
            update_mass: false,
        };

        let mut anchored = network
            .nodes
            .iter()
            .find(|n| n.is_anchor && n.freedom == Freedom::planar_xy())
            .unwrap()
            .clone();
        // off the chord so the springs pull as well
        anchored.position += Vec3::new(0.1, 0.05, 0.02);

        let mut free = anchored.clone();
        free.is_anchor = false;

        let constrained = anchored.compute_force(&network.nodes, &network.chains, &params);
        let unconstrained = free.compute_force(&network.nodes, &network.chains, &params);

        assert_ne!(unconstrained.z, 0.0);
        assert_eq!(constrained.x, unconstrained.x);
        assert_eq!(constrained.y, unconstrained.y);
        assert_eq!(constrained.z, 0.0);
    }
}
