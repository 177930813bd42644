//! Cost and equality-constraint evaluation for one solve.
//!
//! One `MpcEvaluator` is built per cycle, bound to that cycle's path
//! coefficients and tunables, and handed to the solver, which calls it back
//! many times during its iterations. Nothing in it mutates after
//! construction and every evaluation writes only into caller buffers, so
//! concurrent solves with separate evaluators never interact.

use crate::common::{Actuation, VehicleState};
use crate::config::MpcConfig;
use crate::layout::VariableLayout;
use crate::model::{BicycleModel, PathPolynomial};
use crate::solver::NlpProblem;

pub struct MpcEvaluator {
    layout: VariableLayout,
    model: BicycleModel,
    path: PathPolynomial,
    weights: crate::config::CostWeights,
    dt: f64,
    v_ref: f64,
}

impl MpcEvaluator {
    pub fn new(layout: VariableLayout, path: PathPolynomial, config: &MpcConfig) -> Self {
        Self {
            layout,
            model: BicycleModel::new(config.lf),
            path,
            weights: config.weights,
            dt: config.dt,
            v_ref: config.v_ref,
        }
    }

    fn state_at(&self, vars: &[f64], t: usize) -> VehicleState {
        let l = &self.layout;
        VehicleState {
            x: vars[l.x_start + t],
            y: vars[l.y_start + t],
            psi: vars[l.psi_start + t],
            v: vars[l.v_start + t],
            cte: vars[l.cte_start + t],
            epsi: vars[l.epsi_start + t],
        }
    }
}

impl NlpProblem for MpcEvaluator {
    fn num_vars(&self) -> usize {
        self.layout.num_vars()
    }

    fn num_constraints(&self) -> usize {
        self.layout.num_constraints()
    }

    fn objective(&self, vars: &[f64]) -> f64 {
        let l = &self.layout;
        let w = &self.weights;
        let n = l.horizon;
        let mut cost = 0.0;

        // Tracking: path deviation and speed, over every step
        for t in 0..n {
            cost += w.cte * vars[l.cte_start + t].powi(2);
            cost += w.epsi * vars[l.epsi_start + t].powi(2);
            cost += w.speed * (vars[l.v_start + t] - self.v_ref).powi(2);
        }

        // Effort: raw actuator use, over the N-1 actuation steps
        for t in 0..n.saturating_sub(1) {
            cost += w.steer * vars[l.delta_start + t].powi(2);
            cost += w.accel * vars[l.a_start + t].powi(2);
        }

        // Smoothness: consecutive actuation differences. Empty for N < 3.
        for t in 0..n.saturating_sub(2) {
            cost += w.steer_rate
                * (vars[l.delta_start + t + 1] - vars[l.delta_start + t]).powi(2);
            cost += w.accel_rate * (vars[l.a_start + t + 1] - vars[l.a_start + t]).powi(2);
        }

        cost
    }

    fn constraints(&self, vars: &[f64], residuals: &mut [f64]) {
        let l = &self.layout;

        // Initial-state rows: the residual is the bare variable; the bound
        // pair carries the measured value that pins it.
        residuals[l.x_start] = vars[l.x_start];
        residuals[l.y_start] = vars[l.y_start];
        residuals[l.psi_start] = vars[l.psi_start];
        residuals[l.v_start] = vars[l.v_start];
        residuals[l.cte_start] = vars[l.cte_start];
        residuals[l.epsi_start] = vars[l.epsi_start];

        // Dynamics rows: state[t+1] minus the model's one-step prediction,
        // driven to zero by the constraint bounds
        for t in 0..l.horizon - 1 {
            let s0 = self.state_at(vars, t);
            let u = Actuation {
                steer: vars[l.delta_start + t],
                accel: vars[l.a_start + t],
            };
            let pred = self.model.predict(&s0, &u, self.dt);

            let path_y = self.path.value(s0.x);
            let path_psi = self.path.heading(s0.x);

            residuals[l.x_start + t + 1] = vars[l.x_start + t + 1] - pred.x;
            residuals[l.y_start + t + 1] = vars[l.y_start + t + 1] - pred.y;
            residuals[l.psi_start + t + 1] = vars[l.psi_start + t + 1] - pred.psi;
            residuals[l.v_start + t + 1] = vars[l.v_start + t + 1] - pred.v;
            residuals[l.cte_start + t + 1] = vars[l.cte_start + t + 1]
                - ((path_y - s0.y) + s0.v * s0.epsi.sin() * self.dt);
            residuals[l.epsi_start + t + 1] = vars[l.epsi_start + t + 1]
                - ((s0.psi - path_psi) + s0.v / self.model.lf() * u.steer * self.dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator(horizon: usize) -> MpcEvaluator {
        let config = MpcConfig {
            horizon,
            v_ref: 10.0,
            ..MpcConfig::default()
        };
        MpcEvaluator::new(
            VariableLayout::new(horizon),
            PathPolynomial::new([0.0, 0.0, 0.0, 0.0]),
            &config,
        )
    }

    /// Decision vector for straight-line motion on the x axis at `v`,
    /// with zero errors and zero actuation
    fn straight_line_vars(horizon: usize, v: f64, dt: f64) -> Vec<f64> {
        let l = VariableLayout::new(horizon);
        let mut vars = vec![0.0; l.num_vars()];
        for t in 0..horizon {
            vars[l.x_start + t] = v * dt * t as f64;
            vars[l.v_start + t] = v;
        }
        vars
    }

    #[test]
    fn test_cost_zero_on_reference() {
        let eval = evaluator(10);
        let vars = straight_line_vars(10, 10.0, 0.1);
        assert_eq!(eval.objective(&vars), 0.0);
    }

    #[test]
    fn test_cost_positive_off_reference() {
        let eval = evaluator(10);
        let l = VariableLayout::new(10);

        let mut vars = straight_line_vars(10, 10.0, 0.1);
        vars[l.cte_start + 3] = 0.1;
        assert!(eval.objective(&vars) > 0.0);

        let mut vars = straight_line_vars(10, 10.0, 0.1);
        vars[l.delta_start] = 0.01;
        assert!(eval.objective(&vars) > 0.0);

        // A speed off v_ref costs even with zero errors and actuation
        let vars = straight_line_vars(10, 9.0, 0.1);
        assert!(eval.objective(&vars) > 0.0);
    }

    #[test]
    fn test_cost_non_negative_for_arbitrary_vars() {
        let eval = evaluator(6);
        let l = VariableLayout::new(6);
        let vars: Vec<f64> = (0..l.num_vars())
            .map(|i| ((i as f64) * 0.7).sin() * 3.0 - 1.0)
            .collect();
        assert!(eval.objective(&vars) >= 0.0);
    }

    #[test]
    fn test_dynamics_residuals_zero_on_consistent_trajectory() {
        let eval = evaluator(10);
        let l = VariableLayout::new(10);
        let vars = straight_line_vars(10, 10.0, 0.1);
        let mut residuals = vec![f64::NAN; l.num_constraints()];
        eval.constraints(&vars, &mut residuals);

        // Pin rows reproduce the first-step variables
        assert_eq!(residuals[l.v_start], 10.0);
        assert_eq!(residuals[l.x_start], 0.0);
        // Every dynamics row balances
        for t in 1..l.horizon {
            for start in [
                l.x_start,
                l.y_start,
                l.psi_start,
                l.v_start,
                l.cte_start,
                l.epsi_start,
            ]
            .iter()
            {
                assert!(residuals[start + t].abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_residual_feels_unmodeled_jump() {
        let eval = evaluator(4);
        let l = VariableLayout::new(4);
        let mut vars = straight_line_vars(4, 10.0, 0.1);
        vars[l.v_start + 2] += 1.0; // speed jump with zero acceleration
        let mut residuals = vec![0.0; l.num_constraints()];
        eval.constraints(&vars, &mut residuals);
        assert!((residuals[l.v_start + 2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_horizon_two() {
        // N = 2: one actuation step, no smoothness pairs, no panics
        let eval = evaluator(2);
        let l = VariableLayout::new(2);
        let vars = straight_line_vars(2, 10.0, 0.1);
        assert_eq!(eval.objective(&vars), 0.0);
        let mut residuals = vec![0.0; l.num_constraints()];
        eval.constraints(&vars, &mut residuals);
        assert!(residuals[l.x_start + 1].abs() < 1e-12);
    }

    #[test]
    fn test_curved_path_induces_cte_residual() {
        // Reference curves away while the trajectory goes straight: the
        // propagated cte for the next step must match value(x) - y
        let config = MpcConfig {
            horizon: 3,
            v_ref: 10.0,
            ..MpcConfig::default()
        };
        let eval = MpcEvaluator::new(
            VariableLayout::new(3),
            PathPolynomial::new([1.0, 0.0, 0.0, 0.0]),
            &config,
        );
        let l = VariableLayout::new(3);
        let vars = straight_line_vars(3, 10.0, 0.1);
        let mut residuals = vec![0.0; l.num_constraints()];
        eval.constraints(&vars, &mut residuals);
        // cte[1] is 0 in vars but the reference sits at y = 1
        assert!((residuals[l.cte_start + 1] - (0.0 - 1.0)).abs() < 1e-12);
    }
}
