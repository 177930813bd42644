//! Per-solve configuration for the MPC core.
//!
//! All tunables travel in one immutable value handed to the controller, so
//! concurrent solves with different settings never interfere.

use crate::common::{MpcError, MpcResult};

/// Cost function weights.
///
/// The tracking weights sit orders of magnitude above the effort weights on
/// purpose: staying on the path dominates, actuator use is cheap, but
/// actuator *change* is damped separately so steering can be large yet must
/// vary gradually. That split is what keeps the closed loop from oscillating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostWeights {
    /// Cross-track error weight
    pub cte: f64,
    /// Heading error weight
    pub epsi: f64,
    /// Speed tracking weight
    pub speed: f64,
    /// Steering effort weight
    pub steer: f64,
    /// Acceleration effort weight
    pub accel: f64,
    /// Consecutive steering difference weight
    pub steer_rate: f64,
    /// Consecutive acceleration difference weight
    pub accel_rate: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            cte: 4000.0,
            epsi: 4000.0,
            speed: 1.0,
            steer: 5.0,
            accel: 5.0,
            steer_rate: 500.0,
            accel_rate: 10.0,
        }
    }
}

impl CostWeights {
    fn as_array(&self) -> [(&'static str, f64); 7] {
        [
            ("cte", self.cte),
            ("epsi", self.epsi),
            ("speed", self.speed),
            ("steer", self.steer),
            ("accel", self.accel),
            ("steer_rate", self.steer_rate),
            ("accel_rate", self.accel_rate),
        ]
    }
}

/// Tunables for one solve cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MpcConfig {
    /// Horizon length N (number of predicted state steps, >= 2)
    pub horizon: usize,
    /// Step duration [s]; must match the real control period for the
    /// dynamics to be physically meaningful
    pub dt: f64,
    /// Distance from center of gravity to front axle [m], empirically tuned
    pub lf: f64,
    /// Desired cruise speed
    pub v_ref: f64,
    pub weights: CostWeights,
    /// Symmetric steering limit [rad]
    pub max_steer: f64,
    /// Lower acceleration/brake limit
    pub accel_min: f64,
    /// Upper acceleration/throttle limit
    pub accel_max: f64,
    /// Wall-clock ceiling for one solver invocation [s]
    pub max_solve_time: f64,
}

impl Default for MpcConfig {
    fn default() -> Self {
        Self {
            horizon: 10,
            dt: 0.1,
            lf: 2.67,
            v_ref: 45.0,
            weights: CostWeights::default(),
            max_steer: 0.436332, // 25 degrees
            accel_min: -1.0,
            accel_max: 1.0,
            max_solve_time: 0.5,
        }
    }
}

impl MpcConfig {
    /// Reject invalid tunables before any problem is built from them.
    pub fn validate(&self) -> MpcResult<()> {
        if self.horizon < 2 {
            return Err(MpcError::InvalidConfig(format!(
                "horizon must be at least 2, got {}",
                self.horizon
            )));
        }
        if !(self.dt > 0.0) {
            return Err(MpcError::InvalidConfig(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !(self.lf > 0.0) {
            return Err(MpcError::InvalidConfig(format!(
                "lf must be positive, got {}",
                self.lf
            )));
        }
        if !(self.v_ref >= 0.0) {
            return Err(MpcError::InvalidConfig(format!(
                "v_ref must be non-negative, got {}",
                self.v_ref
            )));
        }
        for (name, w) in self.weights.as_array().iter() {
            if !(*w >= 0.0) {
                return Err(MpcError::InvalidConfig(format!(
                    "weight {} must be non-negative, got {}",
                    name, w
                )));
            }
        }
        if !(self.max_steer > 0.0) {
            return Err(MpcError::InvalidConfig(format!(
                "max_steer must be positive, got {}",
                self.max_steer
            )));
        }
        if !(self.accel_min < self.accel_max) {
            return Err(MpcError::InvalidConfig(format!(
                "acceleration bounds must satisfy min < max, got [{}, {}]",
                self.accel_min, self.accel_max
            )));
        }
        if !(self.max_solve_time > 0.0) {
            return Err(MpcError::InvalidConfig(format!(
                "max_solve_time must be positive, got {}",
                self.max_solve_time
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MpcConfig::default().validate().is_ok());
    }

    #[test]
    fn test_short_horizon_rejected() {
        let config = MpcConfig {
            horizon: 1,
            ..MpcConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_degenerate_horizon_accepted() {
        // N = 2 has no smoothness terms but is still a valid problem
        let config = MpcConfig {
            horizon: 2,
            ..MpcConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_positive_dt_rejected() {
        let config = MpcConfig {
            dt: 0.0,
            ..MpcConfig::default()
        };
        assert!(config.validate().is_err());
        let config = MpcConfig {
            dt: f64::NAN,
            ..MpcConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = MpcConfig::default();
        config.weights.steer_rate = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_accel_bounds_rejected() {
        let config = MpcConfig {
            accel_min: 1.0,
            accel_max: -1.0,
            ..MpcConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
