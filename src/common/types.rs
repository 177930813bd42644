//! Common types used throughout mpc_path_tracker

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone, Default)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_xy(x: &[f64], y: &[f64]) -> Self {
        assert_eq!(x.len(), y.len());
        let points = x
            .iter()
            .zip(y.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect();
        Self { points }
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

/// Full vehicle state tracked against a fitted reference path.
///
/// `cte` and `epsi` are errors relative to the reference polynomial, not
/// independent physical quantities. They must be measured against the same
/// coefficient vector that is handed to the solve using them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    pub x: f64,
    pub y: f64,
    /// Heading [rad]
    pub psi: f64,
    /// Speed along the heading
    pub v: f64,
    /// Cross-track error to the reference path
    pub cte: f64,
    /// Heading error to the reference path tangent [rad]
    pub epsi: f64,
}

impl VehicleState {
    pub fn new(x: f64, y: f64, psi: f64, v: f64, cte: f64, epsi: f64) -> Self {
        Self { x, y, psi, v, cte, epsi }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Actuator command pair applied over one control period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actuation {
    /// Steering angle [rad], positive per the model's sign convention
    pub steer: f64,
    /// Combined throttle/brake, typically normalized to [-1, 1]
    pub accel: f64,
}

impl Actuation {
    pub fn new(steer: f64, accel: f64) -> Self {
        Self { steer, accel }
    }

    pub fn zero() -> Self {
        Self { steer: 0.0, accel: 0.0 }
    }
}
