/// errors shared by the whole crate
pub mod errors;
/// "decayed to numerical noise" policy shared by the integrator, the exact solver and the error analyzer
pub mod noise_floor;
/// time series of the solution components
pub mod trajectory;
/// dy/dt = A·y and the trait implicit solvers are written against
pub mod linear_system;
/// parameters of the numerical and exact runs
pub mod ode_config;
/// Backward Euler method for linear constant coefficient systems
/// ```ignore
///  let system = LinearSystem::stiff_default();
///  let config = SolveConfig::new(vec![7.0, 13.0], 0.0, 0.01, 0.1);
///  let solver = BE::new(system, config);
///  let solution = solver.solve();
///  let (t, y) = solution.get_result();
/// ```
pub mod BE;
/// closed-form solution via eigen-decomposition of A
pub mod exact_solution;
/// pointwise difference between numerical and exact trajectories
pub mod global_error;
/// facade: configure, solve, compare
pub mod StiffODE_api;
