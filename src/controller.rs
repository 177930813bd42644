//! Receding-horizon solve orchestration.
//!
//! One controller value holds one immutable configuration; each call to
//! `solve` assembles a fresh problem, runs a single solver attempt under
//! the configured wall-clock ceiling, and extracts the first actuation.
//! Everything built for the attempt is discarded afterwards, so separate
//! controllers (or the same one across cycles) never share mutable state.

use log::debug;

use crate::bounds::problem_bounds;
use crate::common::{
    Actuation, FailureReason, MpcError, MpcResult, Path2D, Point2D, VehicleState,
};
use crate::config::MpcConfig;
use crate::evaluator::MpcEvaluator;
use crate::layout::VariableLayout;
use crate::model::PathPolynomial;
use crate::solver::{SolverStatus, SqpSolver};

/// Result of one successful solve cycle.
#[derive(Debug, Clone)]
pub struct MpcSolution {
    /// First actuation pair of the optimized plan; the only part applied
    pub actuation: Actuation,
    /// Predicted positions for steps 1..N-1, for diagnostics only
    pub predicted_path: Path2D,
    /// Final objective value reported by the solver
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct MpcController {
    config: MpcConfig,
}

impl MpcController {
    /// Build a controller, rejecting invalid tunables up front so they
    /// never reach the solver.
    pub fn new(config: MpcConfig) -> MpcResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MpcConfig {
        &self.config
    }

    /// Run one solve cycle against the current measured state and the
    /// cubic path coefficients fitted in the same frame.
    ///
    /// No retries happen here; the next cycle re-solves with fresh state.
    /// On failure no partial actuation is returned.
    pub fn solve(&self, state: &VehicleState, coeffs: [f64; 4]) -> MpcResult<MpcSolution> {
        let layout = VariableLayout::new(self.config.horizon);

        // Zero guess: always a valid starting point, since the pin rows
        // recover the measured state during the solve
        let initial = vec![0.0; layout.num_vars()];
        let bounds = problem_bounds(&layout, &self.config, state);
        let evaluator = MpcEvaluator::new(layout, PathPolynomial::new(coeffs), &self.config);
        let solver = SqpSolver::new(self.config.max_solve_time);

        debug!(
            "mpc solve: horizon={} vars={} constraints={}",
            layout.horizon,
            layout.num_vars(),
            layout.num_constraints()
        );

        let solution = solver.solve(&evaluator, &bounds, &initial);
        match solution.status {
            SolverStatus::Solved => {
                let actuation = Actuation::new(
                    solution.vars[layout.delta_start],
                    solution.vars[layout.a_start],
                );
                let mut predicted_path = Path2D::new();
                for t in 1..layout.horizon {
                    predicted_path.push(Point2D::new(
                        solution.vars[layout.x_start + t],
                        solution.vars[layout.y_start + t],
                    ));
                }
                debug!(
                    "mpc solved: cost={:.4} steer={:.4} accel={:.4}",
                    solution.objective, actuation.steer, actuation.accel
                );
                Ok(MpcSolution {
                    actuation,
                    predicted_path,
                    cost: solution.objective,
                })
            }
            status => {
                debug!("mpc solve failed: {:?}", status);
                Err(MpcError::SolveFailed(match status {
                    SolverStatus::Infeasible => FailureReason::Infeasible,
                    SolverStatus::IterationLimit => FailureReason::IterationLimit,
                    SolverStatus::TimeLimit => FailureReason::TimeLimit,
                    _ => FailureReason::NumericalError,
                }))
            }
        }
    }
}
