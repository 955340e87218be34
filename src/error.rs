//! Error and warning types for the catenary solver

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for network construction and simulation
#[derive(Error, Debug)]
pub enum CatenaryError {
    #[error("Not enough input chains")]
    NotEnoughChains,

    #[error("Not enough input anchors: {0} (at least 2 required)")]
    NotEnoughAnchors(usize),

    #[error("Not enough anchors near input chains: {0} (at least 2 required)")]
    NotEnoughAnchorsNearChains(usize),

    #[error("Not enough nodes: {0} (at least 2 required)")]
    NotEnoughNodes(usize),

    #[error("Some chains or nodes are not prepared for simulation - build the network with ChainModel first")]
    NotReady,

    #[error("Not enough simulated chains or nodes")]
    NotSimulated,

    #[error("Node {0} not found in network")]
    NodeNotFound(usize),

    #[error("Chain {0} not found in network")]
    ChainNotFound(usize),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for catenary operations
pub type CatenaryResult<T> = Result<T, CatenaryError>;

/// Advisory conditions raised while building a network.
///
/// These never abort a build; they are logged and kept on the network.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildWarning {
    #[error("{0} invalid chain(s) were discarded")]
    DiscardedChains(usize),

    #[error("{0} invalid anchor(s) were discarded")]
    DiscardedAnchors(usize),

    #[error("{0} anchor(s) too far from every chain were discarded")]
    AnchorsOffChains(usize),

    #[error("{0} duplicate anchor(s) were discarded")]
    DuplicateAnchors(usize),

    #[error("At least one anchor needs to be fixed - setting anchor[0] translations to false")]
    ForcedFixedAnchor,

    #[error("{0} invalid load(s) were discarded")]
    DiscardedLoads(usize),

    #[error("{0} point load(s) too far from every chain were discarded")]
    PointLoadsOffChains(usize),
}
