//! Kinematic bicycle model and cubic reference polynomial.
//!
//! Both are pure arithmetic with no failure modes; the solver calls them
//! thousands of times per cycle through the evaluator.

use crate::common::{Actuation, VehicleState};

/// Discrete-time kinematic bicycle model.
///
/// Sign convention: positive steering produces a negative yaw rate
/// (`psi' = psi - v/Lf * steer * dt`), matching the simulator convention
/// the default `Lf` was calibrated against. The heading-error propagation
/// in the evaluator uses the same sense.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BicycleModel {
    lf: f64,
}

impl BicycleModel {
    pub fn new(lf: f64) -> Self {
        Self { lf }
    }

    pub fn lf(&self) -> f64 {
        self.lf
    }

    /// One-step Euler propagation of pose and speed.
    ///
    /// `cte` and `epsi` are reference-relative and carried through
    /// unchanged here; the evaluator propagates them against the active
    /// polynomial in the constraint block.
    pub fn predict(&self, state: &VehicleState, actuation: &Actuation, dt: f64) -> VehicleState {
        VehicleState {
            x: state.x + state.v * state.psi.cos() * dt,
            y: state.y + state.v * state.psi.sin() * dt,
            psi: state.psi - state.v / self.lf * actuation.steer * dt,
            v: state.v + actuation.accel * dt,
            cte: state.cte,
            epsi: state.epsi,
        }
    }
}

/// Cubic reference path `y = c0 + c1 x + c2 x^2 + c3 x^3` in the vehicle
/// frame. Read-only for the duration of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPolynomial {
    coeffs: [f64; 4],
}

impl PathPolynomial {
    pub fn new(coeffs: [f64; 4]) -> Self {
        Self { coeffs }
    }

    pub fn coeffs(&self) -> &[f64; 4] {
        &self.coeffs
    }

    /// Polynomial value at x (Horner form)
    pub fn value(&self, x: f64) -> f64 {
        let c = &self.coeffs;
        c[0] + x * (c[1] + x * (c[2] + x * c[3]))
    }

    /// First derivative at x
    pub fn slope(&self, x: f64) -> f64 {
        let c = &self.coeffs;
        c[1] + x * (2.0 * c[2] + x * 3.0 * c[3])
    }

    /// Tangent direction of the path at x [rad]
    pub fn heading(&self, x: f64) -> f64 {
        self.slope(x).atan()
    }
}
