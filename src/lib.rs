//! Catenary Solver - hanging-chain form finding in native Rust
//!
//! Networks of straight chains are discretized into point masses joined by
//! springs, pinned at anchors and relaxed under gravity until they settle.
//! With gravity pointing up the settled shape is the compression-only arch:
//! - Chains with per-chain elasticity, mass and node resolution
//! - Fixed, sliding or free anchors
//! - Point, line and region loads
//! - Sequential or rayon-parallel relaxation
//!
//! ## Example
//! ```rust
//! use catenary_solver::prelude::*;
//!
//! let mut model = ChainModel::new();
//!
//! // A 10 m chain hanging between two fixed anchors
//! model.add_chain(ChainSpec::from_line(Line::from_coords(
//!     [0.0, 0.0, 0.0],
//!     [10.0, 0.0, 0.0],
//! )));
//! model.add_anchor(Anchor::fixed(Point3::new(0.0, 0.0, 0.0)));
//! model.add_anchor(Anchor::fixed(Point3::new(10.0, 0.0, 0.0)));
//!
//! let mut network = model.build().unwrap();
//!
//! // Relax with gravity pointing down
//! let options = SolverOptions::new().with_gravity(Vec3::new(0.0, 0.0, -0.01));
//! let outcome = run(&mut network, &options).unwrap();
//!
//! let summary = SimulationSummary::new(&network, &outcome);
//! println!("{}", summary.info_lines().join("\n"));
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod network;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        one_iteration, run, ExecutionStrategy, IterationParams, SessionControl,
        SimulationOutcome, SolverOptions, SolverSession, SolverState,
    };
    pub use crate::elements::{Anchor, Chain, ChainSpec, Freedom, Node, SimulationPhase};
    pub use crate::error::{BuildWarning, CatenaryError, CatenaryResult};
    pub use crate::loads::{Load, LoadType, Region};
    pub use crate::math::{Line, Mat4, Plane, Point3, Vec3};
    pub use crate::model::ChainModel;
    pub use crate::network::{MassAndLoad, Network, PositionsAndForces, TransformedNetwork};
    pub use crate::results::{ChainReport, NodeReport, SimulationSummary};
}
