//! Bounds policy for the decision variables and constraint rows.

use crate::common::VehicleState;
use crate::config::MpcConfig;
use crate::layout::VariableLayout;
use crate::solver::NlpBounds;

/// Sentinel standing in for an unbounded variable
pub const BOUND_INF: f64 = 1.0e19;

/// Build the per-variable and per-constraint bounds for one solve.
///
/// State variables are unbounded, steering is symmetric at the mechanical
/// limit, acceleration uses the configured pair. All constraint rows are
/// pinned to zero except the six initial-state rows, whose lower and upper
/// bounds both carry the measured state: the first predicted step is forced
/// to equal reality.
pub fn problem_bounds(
    layout: &VariableLayout,
    config: &MpcConfig,
    state: &VehicleState,
) -> NlpBounds {
    let n_vars = layout.num_vars();
    let n_constraints = layout.num_constraints();

    let mut var_lower = vec![-BOUND_INF; n_vars];
    let mut var_upper = vec![BOUND_INF; n_vars];
    for i in layout.delta_start..layout.a_start {
        var_lower[i] = -config.max_steer;
        var_upper[i] = config.max_steer;
    }
    for i in layout.a_start..n_vars {
        var_lower[i] = config.accel_min;
        var_upper[i] = config.accel_max;
    }

    let mut constraint_lower = vec![0.0; n_constraints];
    let mut constraint_upper = vec![0.0; n_constraints];
    for (offset, value) in [
        (layout.x_start, state.x),
        (layout.y_start, state.y),
        (layout.psi_start, state.psi),
        (layout.v_start, state.v),
        (layout.cte_start, state.cte),
        (layout.epsi_start, state.epsi),
    ]
    .iter()
    {
        constraint_lower[*offset] = *value;
        constraint_upper[*offset] = *value;
    }

    NlpBounds {
        var_lower,
        var_upper,
        constraint_lower,
        constraint_upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_pins_roundtrip() {
        let layout = VariableLayout::new(10);
        let config = MpcConfig::default();
        let state = VehicleState::new(0.0, 0.0, 0.0, 10.0, 0.0, 0.0);
        let bounds = problem_bounds(&layout, &config, &state);

        // The six pin rows carry the measured state, lower == upper
        assert_eq!(bounds.constraint_lower[layout.v_start], 10.0);
        assert_eq!(bounds.constraint_upper[layout.v_start], 10.0);
        for offset in [
            layout.x_start,
            layout.y_start,
            layout.psi_start,
            layout.cte_start,
            layout.epsi_start,
        ]
        .iter()
        {
            assert_eq!(bounds.constraint_lower[*offset], 0.0);
            assert_eq!(bounds.constraint_upper[*offset], 0.0);
        }
    }

    #[test]
    fn test_dynamics_rows_pinned_to_zero() {
        let layout = VariableLayout::new(5);
        let config = MpcConfig::default();
        let state = VehicleState::new(1.0, 2.0, 0.3, 4.0, 0.5, 0.6);
        let bounds = problem_bounds(&layout, &config, &state);

        for t in 1..layout.horizon {
            for start in [
                layout.x_start,
                layout.y_start,
                layout.psi_start,
                layout.v_start,
                layout.cte_start,
                layout.epsi_start,
            ]
            .iter()
            {
                assert_eq!(bounds.constraint_lower[start + t], 0.0);
                assert_eq!(bounds.constraint_upper[start + t], 0.0);
            }
        }
    }

    #[test]
    fn test_actuator_bounds() {
        let layout = VariableLayout::new(10);
        let config = MpcConfig::default();
        let state = VehicleState::origin();
        let bounds = problem_bounds(&layout, &config, &state);

        // States unbounded
        for i in 0..layout.delta_start {
            assert_eq!(bounds.var_lower[i], -BOUND_INF);
            assert_eq!(bounds.var_upper[i], BOUND_INF);
        }
        // Steering symmetric, acceleration per config
        for i in layout.delta_start..layout.a_start {
            assert_eq!(bounds.var_lower[i], -config.max_steer);
            assert_eq!(bounds.var_upper[i], config.max_steer);
        }
        for i in layout.a_start..layout.num_vars() {
            assert_eq!(bounds.var_lower[i], config.accel_min);
            assert_eq!(bounds.var_upper[i], config.accel_max);
        }
    }

    #[test]
    fn test_minimum_horizon_no_panic() {
        let layout = VariableLayout::new(2);
        let config = MpcConfig {
            horizon: 2,
            ..MpcConfig::default()
        };
        let bounds = problem_bounds(&layout, &config, &VehicleState::origin());
        assert_eq!(bounds.var_lower.len(), layout.num_vars());
        assert_eq!(bounds.constraint_lower.len(), layout.num_constraints());
    }
}
