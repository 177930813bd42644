//! mpc_path_tracker - Model predictive path-tracking control
//!
//! Each control cycle formulates a short-horizon nonlinear program from the
//! vehicle's measured state and a cubic polynomial fitted to the reference
//! path, solves it once, and applies only the first steering/throttle pair
//! of the optimized plan (receding-horizon control).
//!
//! The crate is split along the problem's seams: the kinematic bicycle
//! model, the decision-variable layout, the cost/constraint evaluator, the
//! bounds policy, and the orchestrating controller. The solver behind the
//! `solver::NlpProblem` trait is replaceable.

// Core modules
pub mod common;
pub mod config;

// Problem formulation
pub mod model;
pub mod layout;
pub mod bounds;
pub mod evaluator;

// Solution
pub mod solver;
pub mod controller;

// Re-export the surface most callers need
pub use common::{Actuation, FailureReason, MpcError, MpcResult, Path2D, Point2D, VehicleState};
pub use config::{CostWeights, MpcConfig};
pub use controller::{MpcController, MpcSolution};
pub use model::{BicycleModel, PathPolynomial};
