//! Iteration bookkeeping and termination control

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{one_iteration, SolverOptions, SolverState, GLOBAL_MAX_ITERATIONS};
use crate::elements::SimulationPhase;
use crate::error::{CatenaryError, CatenaryResult};
use crate::network::Network;

/// Host-driven switches for [`SolverSession::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionControl {
    /// Keep iterating
    pub run: bool,
    /// Restore the network and start over
    pub reset: bool,
}

impl SessionControl {
    pub fn running() -> Self {
        Self {
            run: true,
            reset: false,
        }
    }

    pub fn stopped() -> Self {
        Self::default()
    }

    pub fn restart() -> Self {
        Self {
            run: true,
            reset: true,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Iterations performed (each one is `substeps` substeps)
    pub iterations: usize,
    pub converged: bool,
    pub state: SolverState,
    /// Summed movement of the last iteration
    pub displacement: f64,
    /// Sanitized threshold the run was judged against
    pub termination: f64,
}

/// Solver state carried across incremental updates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverSession {
    iteration: usize,
    state: SolverState,
    displacement: f64,
}

impl SolverSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed iterations since the last reset
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Summed movement of the last completed iteration
    pub fn displacement(&self) -> f64 {
        self.displacement
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Restore the network and return to [`SolverState::NotStarted`]
    pub fn reset(&mut self, network: &mut Network) {
        network.reset();
        self.iteration = 0;
        self.state = SolverState::NotStarted;
        self.displacement = 0.0;
    }

    /// Run up to `max_batches` iterations, or until termination when `None`.
    ///
    /// A session in a terminal state returns immediately.
    pub fn advance(
        &mut self,
        network: &mut Network,
        options: &SolverOptions,
        max_batches: Option<usize>,
    ) -> CatenaryResult<SolverState> {
        check_ready(network)?;

        if self.state.is_terminal() {
            debug!("Session already finished: {}", self.state.description());
            return Ok(self.state);
        }

        let options = options.sanitized(network.tolerance());
        let params = options.iteration_params();
        let strategy = options.strategy();

        if self.state == SolverState::NotStarted {
            self.reset(network);
            self.state = SolverState::Running;
            info!(
                "Starting relaxation: {} nodes, {} chains, {:?} strategy",
                network.num_nodes(),
                network.num_chains(),
                strategy
            );
        }

        let mut batches = 0;
        while self.state == SolverState::Running && max_batches.map_or(true, |m| batches < m) {
            let mut movement = 0.0;
            for _ in 0..params.substeps {
                one_iteration(network, &params, strategy);
                movement += network.max_displacement();
            }

            self.iteration += 1;
            batches += 1;
            self.displacement = movement;
            debug!("Iteration {}: movement {:.3e}", self.iteration, movement);

            if movement < options.termination {
                self.state = SolverState::Converged;
            } else if self.iteration >= GLOBAL_MAX_ITERATIONS {
                self.state = SolverState::CappedByGlobal;
            } else if self.iteration >= options.max_iterations {
                self.state = SolverState::CappedByUser;
            }
        }

        if batches > 0 {
            network.set_phase(SimulationPhase::Simulated);
        }

        match self.state {
            SolverState::Converged => info!("Converged after {} iterations", self.iteration),
            SolverState::CappedByUser | SolverState::CappedByGlobal => warn!(
                "Stopped after {} iterations without converging (movement {:.3e})",
                self.iteration, self.displacement
            ),
            _ => {}
        }

        Ok(self.state)
    }

    /// Iterate until a terminal state is reached
    pub fn run_to_completion(
        &mut self,
        network: &mut Network,
        options: &SolverOptions,
    ) -> CatenaryResult<SimulationOutcome> {
        let state = self.advance(network, options, None)?;
        Ok(SimulationOutcome {
            iterations: self.iteration,
            converged: state == SolverState::Converged,
            state,
            displacement: self.displacement,
            termination: options.sanitized(network.tolerance()).termination,
        })
    }

    /// Incremental host-driven step.
    ///
    /// `reset` or `!run` restores the network first; `run` then performs
    /// `preview_nth` iterations.
    pub fn update(
        &mut self,
        network: &mut Network,
        options: &SolverOptions,
        control: SessionControl,
    ) -> CatenaryResult<SolverState> {
        check_ready(network)?;

        if control.reset || !control.run {
            self.reset(network);
        }
        if !control.run {
            return Ok(self.state);
        }

        let preview_nth = options.sanitized(network.tolerance()).preview_nth;
        self.advance(network, options, Some(preview_nth))
    }
}

/// Relax a built network to completion with a fresh session
pub fn run(network: &mut Network, options: &SolverOptions) -> CatenaryResult<SimulationOutcome> {
    SolverSession::new().run_to_completion(network, options)
}

fn check_ready(network: &Network) -> CatenaryResult<()> {
    if network.num_chains() == 0 {
        warn!("No chains in network");
        return Err(CatenaryError::NotEnoughChains);
    }
    if network.num_nodes() < 2 {
        warn!("Network has {} nodes", network.num_nodes());
        return Err(CatenaryError::NotEnoughNodes(network.num_nodes()));
    }
    if !network.is_ready() {
        warn!("Network is not ready for simulation");
        return Err(CatenaryError::NotReady);
    }
    Ok(())
}
