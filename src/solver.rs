//! Solver seam and a dense SQP implementation.
//!
//! The controller only speaks to the `NlpProblem` trait: a dense variable
//! vector in, a scalar cost and a residual vector out, plus box bounds on
//! the variables and target values for the equality rows. Any solver
//! honoring that contract can be substituted for the one here.
//!
//! `SqpSolver` is a small dense sequential-quadratic-programming loop:
//! finite-difference derivatives, a Newton-KKT step solved with an LU
//! factorization, backtracking line search on an l1 merit function, and
//! projection of each trial point onto the variable bounds. It is sized for
//! problems with on the order of a hundred variables, which is what a short
//! receding horizon produces.

use std::time::Instant;

use log::trace;
use nalgebra::{DMatrix, DVector};

/// Central-difference step for the objective gradient
const GRAD_STEP: f64 = 1e-6;
/// Forward-difference step for the constraint Jacobian
const JAC_STEP: f64 = 1e-7;
/// Second-difference step for the objective Hessian
const HESS_STEP: f64 = 1e-4;
/// Diagonal regularization added to the Hessian estimate
const HESS_REG: f64 = 1e-8;

/// A nonlinear program presented to the solver.
///
/// Implementations must be side-effect-free: the solver evaluates them many
/// times per iteration, at perturbed points, in no particular order.
pub trait NlpProblem {
    fn num_vars(&self) -> usize;
    fn num_constraints(&self) -> usize;

    /// Scalar objective at `vars`
    fn objective(&self, vars: &[f64]) -> f64;

    /// Constraint residual vector at `vars`, written into `residuals`
    /// (`residuals.len() == num_constraints()`)
    fn constraints(&self, vars: &[f64], residuals: &mut [f64]);
}

/// Per-variable and per-constraint bounds.
///
/// Constraint rows are equalities: every row carries the same value in
/// `constraint_lower` and `constraint_upper`, and the solver drives the
/// residual to that value.
#[derive(Debug, Clone)]
pub struct NlpBounds {
    pub var_lower: Vec<f64>,
    pub var_upper: Vec<f64>,
    pub constraint_lower: Vec<f64>,
    pub constraint_upper: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Solved,
    Infeasible,
    IterationLimit,
    TimeLimit,
    NumericalError,
}

/// Best point found, whatever the status. Callers should only trust `vars`
/// when the status is `Solved`.
#[derive(Debug, Clone)]
pub struct NlpSolution {
    pub status: SolverStatus,
    pub vars: Vec<f64>,
    pub objective: f64,
}

/// Dense SQP solver with a wall-clock ceiling.
#[derive(Debug, Clone, Copy)]
pub struct SqpSolver {
    pub max_iter: usize,
    /// Convergence threshold on the projected Newton step (inf-norm)
    pub step_tol: f64,
    /// Feasibility threshold on the constraint violation (inf-norm)
    pub feas_tol: f64,
    /// Wall-clock ceiling [s], checked once per iteration
    pub time_limit: f64,
}

impl SqpSolver {
    pub fn new(time_limit: f64) -> Self {
        Self {
            max_iter: 60,
            step_tol: 1e-8,
            feas_tol: 1e-6,
            time_limit,
        }
    }

    /// Run one solve attempt from `initial`. Never retries internally.
    pub fn solve<P: NlpProblem>(
        &self,
        problem: &P,
        bounds: &NlpBounds,
        initial: &[f64],
    ) -> NlpSolution {
        let start = Instant::now();
        let n = problem.num_vars();
        let m = problem.num_constraints();

        let lower = DVector::from_column_slice(&bounds.var_lower);
        let upper = DVector::from_column_slice(&bounds.var_upper);
        let target = DVector::from_column_slice(&bounds.constraint_lower);

        let mut x = DVector::from_column_slice(initial);
        clamp_in_place(&mut x, &lower, &upper);

        let mut residual = vec![0.0; m];
        let mut merit_penalty: f64 = 10.0;

        for iter in 0..self.max_iter {
            if start.elapsed().as_secs_f64() >= self.time_limit {
                return self.finish(problem, &x, SolverStatus::TimeLimit);
            }

            problem.constraints(x.as_slice(), &mut residual);
            let c = DVector::from_column_slice(&residual) - &target;
            let f = problem.objective(x.as_slice());
            if !f.is_finite() || c.iter().any(|v| !v.is_finite()) {
                return self.finish(problem, &x, SolverStatus::NumericalError);
            }

            let grad = fd_gradient(problem, &x);
            let jac = fd_jacobian(problem, &x, m, &residual);
            let hess = fd_hessian(problem, &x, f);

            // Newton-KKT step: [H J^T; J 0] [d; lambda] = [-g; -c]
            let mut kkt = DMatrix::zeros(n + m, n + m);
            kkt.view_mut((0, 0), (n, n)).copy_from(&hess);
            kkt.view_mut((0, n), (n, m)).copy_from(&jac.transpose());
            kkt.view_mut((n, 0), (m, n)).copy_from(&jac);
            let mut rhs = DVector::zeros(n + m);
            rhs.rows_mut(0, n).copy_from(&(-&grad));
            rhs.rows_mut(n, m).copy_from(&(-&c));

            let step = match kkt.lu().solve(&rhs) {
                Some(s) => s,
                None => return self.finish(problem, &x, SolverStatus::NumericalError),
            };
            let d = step.rows(0, n).into_owned();
            let lambda = step.rows(n, m).into_owned();

            let violation = if m == 0 { 0.0 } else { c.amax() };

            // First-order test: the step left after projection onto the
            // bounds has vanished and the iterate is feasible
            let mut projected = &x + &d;
            clamp_in_place(&mut projected, &lower, &upper);
            let projected_step = (&projected - &x).amax();
            if projected_step < self.step_tol && violation < self.feas_tol {
                trace!(
                    "sqp converged: iter={} cost={:.6e} violation={:.3e}",
                    iter,
                    f,
                    violation
                );
                return self.finish(problem, &x, SolverStatus::Solved);
            }

            let lambda_inf = if m == 0 { 0.0 } else { lambda.amax() };
            merit_penalty = merit_penalty.max(2.0 * lambda_inf);
            let merit = f + merit_penalty * c.abs().sum();

            let mut alpha = 1.0;
            let mut accepted = false;
            for _ in 0..40 {
                let mut trial = &x + &d * alpha;
                clamp_in_place(&mut trial, &lower, &upper);
                problem.constraints(trial.as_slice(), &mut residual);
                let trial_violation_l1: f64 = residual
                    .iter()
                    .zip(target.iter())
                    .map(|(r, t)| (r - t).abs())
                    .sum();
                let trial_merit =
                    problem.objective(trial.as_slice()) + merit_penalty * trial_violation_l1;
                if trial_merit.is_finite()
                    && trial_merit < merit - 1e-12 * merit.abs().max(1.0)
                {
                    x = trial;
                    accepted = true;
                    break;
                }
                alpha *= 0.5;
            }

            trace!(
                "sqp iter {}: cost={:.6e} violation={:.3e} step={:.3e} alpha={:.3e}",
                iter,
                f,
                violation,
                projected_step,
                alpha
            );

            if !accepted {
                // The Newton direction yields no merit decrease. At a
                // feasible iterate that certifies stationarity along the
                // only descent direction the merit admits, even when the
                // raw step itself has not shrunk below `step_tol`; the
                // iterate is the answer. Otherwise the constraints cannot
                // be satisfied from here.
                let status = if violation < self.feas_tol {
                    SolverStatus::Solved
                } else {
                    SolverStatus::Infeasible
                };
                return self.finish(problem, &x, status);
            }
        }

        self.finish(problem, &x, SolverStatus::IterationLimit)
    }

    fn finish<P: NlpProblem>(
        &self,
        problem: &P,
        x: &DVector<f64>,
        status: SolverStatus,
    ) -> NlpSolution {
        NlpSolution {
            status,
            objective: problem.objective(x.as_slice()),
            vars: x.as_slice().to_vec(),
        }
    }
}

fn clamp_in_place(x: &mut DVector<f64>, lower: &DVector<f64>, upper: &DVector<f64>) {
    for i in 0..x.len() {
        x[i] = x[i].max(lower[i]).min(upper[i]);
    }
}

fn fd_gradient<P: NlpProblem>(problem: &P, x: &DVector<f64>) -> DVector<f64> {
    let n = x.len();
    let mut grad = DVector::zeros(n);
    let mut pt = x.clone();
    for i in 0..n {
        let h = GRAD_STEP * (1.0 + x[i].abs());
        pt[i] = x[i] + h;
        let fp = problem.objective(pt.as_slice());
        pt[i] = x[i] - h;
        let fm = problem.objective(pt.as_slice());
        pt[i] = x[i];
        grad[i] = (fp - fm) / (2.0 * h);
    }
    grad
}

fn fd_jacobian<P: NlpProblem>(
    problem: &P,
    x: &DVector<f64>,
    m: usize,
    base: &[f64],
) -> DMatrix<f64> {
    let n = x.len();
    let mut jac = DMatrix::zeros(m, n);
    let mut pt = x.clone();
    let mut res = vec![0.0; m];
    for j in 0..n {
        let h = JAC_STEP * (1.0 + x[j].abs());
        pt[j] = x[j] + h;
        problem.constraints(pt.as_slice(), &mut res);
        pt[j] = x[j];
        for i in 0..m {
            jac[(i, j)] = (res[i] - base[i]) / h;
        }
    }
    jac
}

fn fd_hessian<P: NlpProblem>(problem: &P, x: &DVector<f64>, f0: f64) -> DMatrix<f64> {
    let n = x.len();
    let h = HESS_STEP;
    let mut pt = x.clone();

    let mut f_single = vec![0.0; n];
    for i in 0..n {
        pt[i] = x[i] + h;
        f_single[i] = problem.objective(pt.as_slice());
        pt[i] = x[i];
    }

    let mut hess = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..=i {
            pt[i] += h;
            pt[j] += h;
            let f_pair = problem.objective(pt.as_slice());
            pt[i] = x[i];
            pt[j] = x[j];
            let v = (f_pair - f_single[i] - f_single[j] + f0) / (h * h);
            hess[(i, j)] = v;
            hess[(j, i)] = v;
        }
        hess[(i, i)] += HESS_REG;
    }
    hess
}
