// Closed-loop path tracking simulation with the MPC core.
//
// Each cycle mirrors what a real host program does around the controller:
// transform the waypoints ahead into the vehicle frame, fit a cubic
// polynomial to them, measure cte/epsi against the fit, solve, and apply
// the first actuation to the plant. On a failed solve the previous command
// is held, which is the caller-side fallback policy.

use gnuplot::{AxesCommon, Caption, Color, Figure, PointSize, PointSymbol};
use nalgebra::{DMatrix, DVector};

use mpc_path_tracker::{
    Actuation, BicycleModel, MpcConfig, MpcController, Path2D, VehicleState,
};

const SIM_STEPS: usize = 300;
const SHOW_ANIMATION: bool = false;

/// Least-squares cubic fit through the waypoints (vehicle frame)
fn fit_cubic(xs: &[f64], ys: &[f64]) -> [f64; 4] {
    let rows = xs.len();
    let mut vandermonde = DMatrix::zeros(rows, 4);
    for (i, &x) in xs.iter().enumerate() {
        vandermonde[(i, 0)] = 1.0;
        vandermonde[(i, 1)] = x;
        vandermonde[(i, 2)] = x * x;
        vandermonde[(i, 3)] = x * x * x;
    }
    let rhs = DVector::from_column_slice(ys);
    let svd = vandermonde.svd(true, true);
    match svd.solve(&rhs, 1e-10) {
        Ok(c) => [c[0], c[1], c[2], c[3]],
        Err(_) => [0.0; 4],
    }
}

/// Course waypoints ahead of the vehicle, in the vehicle frame
fn waypoints_ahead(course: &Path2D, state: &VehicleState, count: usize) -> (Vec<f64>, Vec<f64>) {
    let (sin_psi, cos_psi) = state.psi.sin_cos();
    let mut xs = Vec::with_capacity(count);
    let mut ys = Vec::with_capacity(count);
    for p in course.points.iter() {
        let dx = p.x - state.x;
        let dy = p.y - state.y;
        let xv = dx * cos_psi + dy * sin_psi;
        let yv = -dx * sin_psi + dy * cos_psi;
        if xv > 0.0 {
            xs.push(xv);
            ys.push(yv);
            if xs.len() == count {
                break;
            }
        }
    }
    (xs, ys)
}

/// Distance from the vehicle to the nearest course waypoint
fn course_deviation(course: &Path2D, state: &VehicleState) -> f64 {
    let pos = state.position();
    course
        .points
        .iter()
        .map(|p| pos.distance(p))
        .fold(f64::INFINITY, f64::min)
}

fn main() {
    println!("MPC path tracking simulation start!");

    let config = MpcConfig {
        horizon: 8,
        dt: 0.1,
        v_ref: 10.0,
        max_solve_time: 0.5,
        ..MpcConfig::default()
    };
    let controller = match MpcController::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("controller setup failed: {}", e);
            return;
        }
    };
    let plant_model = BicycleModel::new(config.lf);

    // Gentle S-curve course
    let waypoint_x: Vec<f64> = (0..=120).map(|i| i as f64).collect();
    let waypoint_y: Vec<f64> = waypoint_x.iter().map(|x| 3.0 * (x / 15.0).sin()).collect();
    let course = Path2D::from_xy(&waypoint_x, &waypoint_y);
    let course_x = course.x_coords();
    let course_y = course.y_coords();

    let mut state = VehicleState::new(0.0, course_y[0], 0.0, 0.0, 0.0, 0.0);
    let mut command = Actuation::zero();

    let mut hist_x = vec![state.x];
    let mut hist_y = vec![state.y];
    let mut hist_v = vec![state.v];
    let mut hist_steer = vec![0.0];
    let mut max_deviation = 0.0f64;
    let mut failures = 0usize;

    let mut fig = Figure::new();

    for step in 0..SIM_STEPS {
        let (ahead_x, ahead_y) = waypoints_ahead(&course, &state, 12);
        if ahead_x.len() < 4 {
            println!("End of course reached at step {}", step);
            break;
        }
        let coeffs = fit_cubic(&ahead_x, &ahead_y);

        // In the vehicle frame the pose is the origin; the errors come
        // straight off the fitted polynomial
        let local_state = VehicleState::new(
            0.0,
            0.0,
            0.0,
            state.v,
            coeffs[0],
            -coeffs[1].atan(),
        );

        match controller.solve(&local_state, coeffs) {
            Ok(solution) => command = solution.actuation,
            Err(e) => {
                // Hold the previous command for one cycle
                failures += 1;
                eprintln!("step {}: {}", step, e);
            }
        }

        state = plant_model.predict(&state, &command, config.dt);
        max_deviation = max_deviation.max(course_deviation(&course, &state));

        hist_x.push(state.x);
        hist_y.push(state.y);
        hist_v.push(state.v);
        hist_steer.push(command.steer);

        if SHOW_ANIMATION && step % 10 == 0 {
            fig.clear_axes();
            fig.axes2d()
                .set_title(
                    &format!("MPC path tracking - v: {:.2} m/s", state.v),
                    &[],
                )
                .set_x_label("x [m]", &[])
                .set_y_label("y [m]", &[])
                .set_aspect_ratio(gnuplot::AutoOption::Fix(1.0))
                .lines(&course_x, &course_y, &[Caption("Reference"), Color("gray")])
                .lines(&hist_x, &hist_y, &[Caption("Trajectory"), Color("blue")])
                .points(
                    &[state.x],
                    &[state.y],
                    &[Caption("Vehicle"), Color("red"), PointSymbol('*'), PointSize(2.0)],
                );
            fig.show_and_keep_running().ok();
        }
    }

    println!(
        "Final position: ({:.2}, {:.2}), speed {:.2} m/s, max deviation {:.2} m, {} failed solves",
        state.x, state.y, state.v, max_deviation, failures
    );

    fig.clear_axes();
    fig.axes2d()
        .set_title("MPC path tracking", &[])
        .set_x_label("x [m]", &[])
        .set_y_label("y [m]", &[])
        .set_aspect_ratio(gnuplot::AutoOption::Fix(1.0))
        .lines(&course_x, &course_y, &[Caption("Reference"), Color("gray")])
        .lines(&hist_x, &hist_y, &[Caption("Trajectory"), Color("blue")]);

    if let Err(e) = fig.save_to_svg("./img/mpc_path_tracking.svg", 800, 600) {
        eprintln!("Failed to save plot: {}", e);
    } else {
        println!("Plot saved to ./img/mpc_path_tracking.svg");
    }

    let mut fig_control = Figure::new();
    let time: Vec<f64> = (0..hist_steer.len()).map(|i| i as f64 * config.dt).collect();
    fig_control
        .axes2d()
        .set_title("Actuation history", &[])
        .set_x_label("Time [s]", &[])
        .set_y_label("Steering [rad] / Speed [m/s]", &[])
        .lines(&time, &hist_steer, &[Caption("Steering"), Color("red")])
        .lines(&time, &hist_v, &[Caption("Speed"), Color("blue")]);

    if let Err(e) = fig_control.save_to_svg("./img/mpc_path_tracking_control.svg", 800, 600) {
        eprintln!("Failed to save control plot: {}", e);
    } else {
        println!("Control plot saved to ./img/mpc_path_tracking_control.svg");
    }

    println!("Done!");
}
