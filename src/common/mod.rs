//! Common types and error definitions for mpc_path_tracker
//!
//! This module provides the foundational building blocks shared by the
//! model, evaluator, and controller.

pub mod types;
pub mod error;

pub use types::*;
pub use error::*;
