//! Block layout of the decision-variable vector.
//!
//! The vector is seven contiguous blocks in fixed order: the six state
//! blocks of length N (x, y, psi, v, cte, epsi), then steering and
//! acceleration blocks of length N-1 each. Actuation at the final step is
//! never applied, hence the shorter blocks. The constraint vector reuses
//! the state block offsets, one residual row per state per step.
//!
//! The layout is recomputed from N alone wherever it is needed; nothing
//! about it is global or mutable.

/// State dimension per timestep
pub const STATE_DIM: usize = 6;
/// Actuator dimension per timestep
pub const ACTUATION_DIM: usize = 2;

/// Block-start offsets for one horizon length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    pub horizon: usize,
    pub x_start: usize,
    pub y_start: usize,
    pub psi_start: usize,
    pub v_start: usize,
    pub cte_start: usize,
    pub epsi_start: usize,
    pub delta_start: usize,
    pub a_start: usize,
}

impl VariableLayout {
    /// Requires `horizon >= 2`; `MpcConfig::validate` enforces this before
    /// any layout is built from a config.
    pub fn new(horizon: usize) -> Self {
        debug_assert!(horizon >= 2, "horizon must be at least 2");
        let x_start = 0;
        let y_start = x_start + horizon;
        let psi_start = y_start + horizon;
        let v_start = psi_start + horizon;
        let cte_start = v_start + horizon;
        let epsi_start = cte_start + horizon;
        let delta_start = epsi_start + horizon;
        let a_start = delta_start + horizon - 1;

        Self {
            horizon,
            x_start,
            y_start,
            psi_start,
            v_start,
            cte_start,
            epsi_start,
            delta_start,
            a_start,
        }
    }

    /// Total decision-variable count: 6N + 2(N-1)
    pub fn num_vars(&self) -> usize {
        STATE_DIM * self.horizon + ACTUATION_DIM * (self.horizon - 1)
    }

    /// Total equality-constraint count: 6N
    pub fn num_constraints(&self) -> usize {
        STATE_DIM * self.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_match_formula() {
        for n in 2..20 {
            let layout = VariableLayout::new(n);
            assert_eq!(layout.num_vars(), 6 * n + 2 * (n - 1));
            assert_eq!(layout.num_constraints(), 6 * n);
        }
    }

    #[test]
    fn test_blocks_contiguous_and_ordered() {
        let n = 10;
        let layout = VariableLayout::new(n);
        assert_eq!(layout.x_start, 0);
        assert_eq!(layout.y_start, n);
        assert_eq!(layout.psi_start, 2 * n);
        assert_eq!(layout.v_start, 3 * n);
        assert_eq!(layout.cte_start, 4 * n);
        assert_eq!(layout.epsi_start, 5 * n);
        assert_eq!(layout.delta_start, 6 * n);
        assert_eq!(layout.a_start, 6 * n + (n - 1));
        assert_eq!(layout.a_start + (n - 1), layout.num_vars());
    }

    #[test]
    #[should_panic(expected = "horizon must be at least 2")]
    fn test_sub_minimum_horizon_asserts() {
        VariableLayout::new(1);
    }

    #[test]
    fn test_minimum_horizon() {
        // N = 2 is the smallest valid horizon: one actuation pair
        let layout = VariableLayout::new(2);
        assert_eq!(layout.num_vars(), 14);
        assert_eq!(layout.num_constraints(), 12);
        assert_eq!(layout.a_start - layout.delta_start, 1);
    }
}
