//! Solver options, states and the relaxation drivers

mod iteration;
mod session;

use serde::{Deserialize, Serialize};

use crate::math::{is_finite_vector, Vec3};

pub use iteration::{one_iteration, ExecutionStrategy, IterationParams};
pub use session::{run, SessionControl, SimulationOutcome, SolverSession};

/// Hard iteration ceiling regardless of user settings
pub const GLOBAL_MAX_ITERATIONS: usize = 250_000;
pub const MAX_SUBSTEPS: usize = 100;
pub const MAX_PREVIEW_NTH: usize = 10_000;
pub const MAX_AMPLITUDE_LIMIT: f64 = 1000.0;

/// State of a solver session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverState {
    /// Fresh or reset; the next advance starts from iteration 0
    #[default]
    NotStarted,
    Running,
    /// Batch movement dropped below the termination threshold
    Converged,
    /// Reached the user iteration cap
    CappedByUser,
    /// Reached [`GLOBAL_MAX_ITERATIONS`]
    CappedByGlobal,
}

impl SolverState {
    /// A terminal state needs a reset before stepping again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Converged | Self::CappedByUser | Self::CappedByGlobal
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NotStarted => "Solver is not running",
            Self::Running => "Running",
            Self::Converged => "Converged",
            Self::CappedByUser | Self::CappedByGlobal => "Reached maximum number of iterations",
        }
    }
}

/// Options for the relaxation solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Gravity vector; +Z produces the inverted (arch) form
    pub gravity: Vec3,
    /// Damping factor applied to the total force, in (0, 1]
    pub friction: f64,
    /// Substeps per reported iteration
    pub substeps: usize,
    /// Largest force magnitude per iteration before division by substeps
    pub max_amplitude: f64,
    /// User iteration cap
    pub max_iterations: usize,
    /// Convergence threshold on the summed substep movement
    pub termination: f64,
    /// Iterations per incremental update
    pub preview_nth: usize,
    /// Run force and integration passes on the rayon pool
    pub parallel: bool,
    /// Recompute self-weight from the current chain lengths every substep
    pub update_mass: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, 0.01),
            friction: 0.9,
            substeps: 10,
            max_amplitude: 0.5,
            max_iterations: 500,
            termination: 1e-6,
            preview_nth: 10,
            parallel: false,
            update_mass: true,
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_substeps(mut self, substeps: usize) -> Self {
        self.substeps = substeps;
        self
    }

    pub fn with_max_amplitude(mut self, max_amplitude: f64) -> Self {
        self.max_amplitude = max_amplitude;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set convergence threshold
    pub fn with_termination(mut self, termination: f64) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_preview_nth(mut self, preview_nth: usize) -> Self {
        self.preview_nth = preview_nth;
        self
    }

    /// Enable the parallel execution strategy
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn with_update_mass(mut self, update_mass: bool) -> Self {
        self.update_mass = update_mass;
        self
    }

    /// Clamp every parameter into its documented range.
    ///
    /// `tolerance` is the model tolerance; friction and amplitude never drop
    /// below ten times it.
    pub fn sanitized(&self, tolerance: f64) -> Self {
        let defaults = Self::default();
        let floor = (tolerance.abs() * 10.0).min(1.0);

        let gravity = if is_finite_vector(&self.gravity) {
            self.gravity
        } else {
            defaults.gravity
        };

        let friction = if self.friction.is_nan() {
            defaults.friction
        } else {
            self.friction.abs().clamp(floor, 1.0)
        };

        let max_amplitude = if self.max_amplitude.is_nan() {
            defaults.max_amplitude
        } else {
            self.max_amplitude.abs().clamp(floor, MAX_AMPLITUDE_LIMIT)
        };

        let termination = if self.termination.is_nan() {
            defaults.termination
        } else {
            self.termination.abs()
        };

        Self {
            gravity,
            friction,
            substeps: self.substeps.clamp(1, MAX_SUBSTEPS),
            max_amplitude,
            max_iterations: self.max_iterations.clamp(1, GLOBAL_MAX_ITERATIONS),
            termination,
            preview_nth: self.preview_nth.clamp(1, MAX_PREVIEW_NTH),
            parallel: self.parallel,
            update_mass: self.update_mass,
        }
    }

    /// Parameters of a single substep
    pub fn iteration_params(&self) -> IterationParams {
        IterationParams {
            gravity: self.gravity,
            friction: self.friction,
            substeps: self.substeps,
            max_amplitude: self.max_amplitude,
            update_mass: self.update_mass,
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::from_parallel(self.parallel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_clamps() {
        let opts = SolverOptions::new()
            .with_friction(-4.0)
            .with_substeps(0)
            .with_max_amplitude(1e9)
            .with_max_iter(10_000_000)
            .with_termination(-0.5)
            .with_preview_nth(0)
            .sanitized(0.001);

        assert_eq!(opts.friction, 1.0);
        assert_eq!(opts.substeps, 1);
        assert_eq!(opts.max_amplitude, MAX_AMPLITUDE_LIMIT);
        assert_eq!(opts.max_iterations, GLOBAL_MAX_ITERATIONS);
        assert_eq!(opts.termination, 0.5);
        assert_eq!(opts.preview_nth, 1);
    }

    #[test]
    fn test_sanitized_floors_and_fallbacks() {
        let opts = SolverOptions::new()
            .with_friction(0.0)
            .with_max_amplitude(0.0)
            .with_gravity(Vec3::new(f64::NAN, 0.0, 0.0))
            .with_termination(f64::INFINITY)
            .sanitized(0.001);

        assert_eq!(opts.friction, 0.01);
        assert_eq!(opts.max_amplitude, 0.01);
        assert_eq!(opts.gravity, SolverOptions::default().gravity);
        assert!(opts.termination.is_infinite());
    }

    #[test]
    fn test_zero_gravity_is_kept() {
        let opts = SolverOptions::new().with_gravity(Vec3::zeros()).sanitized(0.001);
        assert_eq!(opts.gravity, Vec3::zeros());
    }

    #[test]
    fn test_terminal_states() {
        assert!(SolverState::Converged.is_terminal());
        assert!(SolverState::CappedByGlobal.is_terminal());
        assert!(!SolverState::Running.is_terminal());
        assert!(!SolverState::NotStarted.is_terminal());
        assert_eq!(SolverState::default(), SolverState::NotStarted);
    }
}
