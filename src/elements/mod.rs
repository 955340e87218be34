//! Network elements: nodes, chains and anchor specifications

mod anchor;
mod chain;
mod node;

use serde::{Deserialize, Serialize};

pub use anchor::{Anchor, Freedom, MIN_SEARCH_TOLERANCE};
pub use chain::{
    Chain, ChainSpec, MAX_ELASTICITY, MAX_NODE_SEGMENTS, MIN_ELASTICITY, MIN_NODE_SEGMENTS,
};
pub use node::{Node, GRAVITY_SCALE};

/// Lifecycle tag gating which operations are legal on a node or chain
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SimulationPhase {
    #[default]
    Invalid,
    PreProcessing,
    /// Built and ready for simulation
    Ready,
    /// At least one iteration has run
    Simulated,
}

impl SimulationPhase {
    /// Numeric tag: -1 invalid, 0 pre-processing, 1 ready, 2 simulated
    pub fn code(&self) -> i32 {
        match self {
            Self::Invalid => -1,
            Self::PreProcessing => 0,
            Self::Ready => 1,
            Self::Simulated => 2,
        }
    }

    /// Ready or already simulated
    pub fn can_simulate(&self) -> bool {
        *self >= Self::Ready
    }
}
