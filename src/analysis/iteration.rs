//! One relaxation substep over the whole network

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::Vec3;
use crate::network::Network;

/// Sanitized parameters consumed by a single substep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationParams {
    pub gravity: Vec3,
    pub friction: f64,
    pub substeps: usize,
    pub max_amplitude: f64,
    pub update_mass: bool,
}

/// How the per-node passes are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    #[default]
    Sequential,
    /// Data-parallel over nodes on the rayon pool
    Parallel,
}

impl ExecutionStrategy {
    pub fn from_parallel(parallel: bool) -> Self {
        if parallel {
            Self::Parallel
        } else {
            Self::Sequential
        }
    }

    /// Order-preserving map over a slice
    fn map<T, U, F>(self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        match self {
            Self::Sequential => items.iter().map(f).collect(),
            Self::Parallel => items.par_iter().map(f).collect(),
        }
    }

    /// Pair each item with the value at the same index and apply `f`
    fn zip_apply<T, U, F>(self, items: &mut [T], values: Vec<U>, f: F)
    where
        T: Send,
        U: Send,
        F: Fn(&mut T, U) + Sync + Send,
    {
        match self {
            Self::Sequential => items
                .iter_mut()
                .zip(values)
                .for_each(|(item, value)| f(item, value)),
            Self::Parallel => items
                .par_iter_mut()
                .zip(values.into_par_iter())
                .for_each(|(item, value)| f(item, value)),
        }
    }
}

/// Advance every node by one substep.
///
/// All forces are computed from the positions at the start of the call
/// before any node moves, so both strategies give identical results.
/// Afterwards chain lengths are refreshed and, when enabled, node
/// self-weight is recomputed from those lengths.
pub fn one_iteration(network: &mut Network, params: &IterationParams, strategy: ExecutionStrategy) {
    let forces = {
        let nodes = &network.nodes;
        let chains = &network.chains;
        strategy.map(nodes, |node| node.compute_force(nodes, chains, params))
    };

    strategy.zip_apply(&mut network.nodes, forces, |node, force| {
        node.apply_force(force)
    });

    for chain in network.chains.iter_mut() {
        chain.update_poly_length(&network.nodes);
    }

    if params.update_mass {
        for chain in &network.chains {
            chain.reset_mass(&mut network.nodes);
        }
        for chain in &network.chains {
            chain.update_mass(&mut network.nodes);
        }
    }
}
