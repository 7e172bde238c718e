//! Entry point used by front ends: configure, solve, then read the numerical, exact and
//! global error trajectories.
//!
//! ```ignore
//! let mut ode = StiffODE::new();
//! ode.set_initial_conditions(vec![7.0, 13.0], 0.0);
//! ode.set_parameters(0.01, 0.1, 0.1, 0.0)?;
//! ode.solve();
//! let numerical = ode.get_series();
//! let exact = ode.compute_exact_solution(); // interleaved u1, u2, u1, u2, ...
//! let errors = ode.compute_global_error();
//! ```
use crate::Utils::logger::init_logger;
use crate::numerical::BE::{BE, NumericalSolution};
use crate::numerical::errors::StiffOdeError;
use crate::numerical::exact_solution::{ExactSolution, ExactSolver, TimeGrid, compute_exact};
use crate::numerical::global_error::{ErrorSummary, compute_global_error};
use crate::numerical::linear_system::LinearSystem;
use crate::numerical::noise_floor::NoiseFloor;
use crate::numerical::ode_config::{ExactConfig, MAX_STEPS, SolveConfig};
use crate::numerical::trajectory::{DEFAULT_MAX_POINTS, Sample, TrajectorySet};
use log::info;

pub struct StiffODE {
    system: LinearSystem,
    initial_conditions: Vec<f64>,
    t0: f64,
    h: f64,
    t_bound: f64,
    exact_t0: f64,
    exact_t_bound: f64,
    noise: NoiseFloor,
    max_steps: usize,
    pub loglevel: Option<String>,
    solution: Option<NumericalSolution>,
    empty: TrajectorySet,
}

impl Default for StiffODE {
    fn default() -> Self {
        StiffODE::new()
    }
}

impl StiffODE {
    /// the stiff 2x2 test system, not configured yet (no initial conditions)
    pub fn new() -> StiffODE {
        StiffODE::with_system(LinearSystem::stiff_default())
    }

    pub fn with_system(system: LinearSystem) -> StiffODE {
        StiffODE {
            system,
            initial_conditions: Vec::new(),
            t0: 0.0,
            h: 0.1,
            t_bound: 0.0,
            exact_t0: 0.0,
            exact_t_bound: 0.0,
            noise: NoiseFloor::default(),
            max_steps: MAX_STEPS,
            loglevel: Some("info".to_string()),
            solution: None,
            empty: TrajectorySet::empty(),
        }
    }

    pub fn set_system(&mut self, system: LinearSystem) {
        self.system = system;
        self.solution = None;
    }

    pub fn set_initial_conditions(&mut self, initial_conditions: Vec<f64>, t0: f64) {
        self.initial_conditions = initial_conditions;
        self.t0 = t0;
        self.solution = None;
    }

    /// Step, end of the numerical window and the window of the independent exact grid.
    /// Nothing is changed if the combination is invalid.
    pub fn set_parameters(
        &mut self,
        h: f64,
        t_bound: f64,
        exact_t_bound: f64,
        exact_t0: f64,
    ) -> Result<(), StiffOdeError> {
        SolveConfig::new(Vec::new(), self.t0, h, t_bound).validate()?;
        ExactConfig::new(exact_t0, exact_t_bound, h).validate()?;
        self.h = h;
        self.t_bound = t_bound;
        self.exact_t_bound = exact_t_bound;
        self.exact_t0 = exact_t0;
        self.solution = None;
        Ok(())
    }

    pub fn set_noise_floor(&mut self, noise: NoiseFloor) {
        self.noise = noise;
        self.solution = None;
    }

    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps;
        self.solution = None;
    }

    pub fn solve_config(&self) -> SolveConfig {
        SolveConfig::new(self.initial_conditions.clone(), self.t0, self.h, self.t_bound)
    }

    pub fn exact_config(&self) -> ExactConfig {
        ExactConfig::new(self.exact_t0, self.exact_t_bound, self.h)
    }

    pub fn system(&self) -> &LinearSystem {
        &self.system
    }

    /// Integrates from scratch and replaces the previous result as a whole.
    pub fn solve(&mut self) -> &NumericalSolution {
        init_logger(&self.loglevel, None);
        let mut solver = BE::new(self.system.clone(), self.solve_config());
        solver.set_noise_floor(self.noise);
        solver.set_max_steps(self.max_steps);
        info!("solving {}", solver);
        self.solution.insert(solver.solve())
    }

    pub fn get_solution(&self) -> Option<&NumericalSolution> {
        self.solution.as_ref()
    }

    /// numerical trajectories of the last solve, empty before the first one
    pub fn get_series(&self) -> &TrajectorySet {
        self.solution
            .as_ref()
            .map(|s| &s.trajectories)
            .unwrap_or(&self.empty)
    }

    /// numerical trajectories thinned for plotting, at most `max_points` (default 10000) samples
    pub fn get_decimated_series(&self, max_points: Option<usize>) -> TrajectorySet {
        self.get_series()
            .decimate(max_points.unwrap_or(DEFAULT_MAX_POINTS))
    }

    /// Diagnostic notice of the last solve (step limit, decay, setup failure).
    pub fn get_message(&self) -> Option<&str> {
        self.solution.as_ref().and_then(|s| s.message.as_deref())
    }

    pub fn compute_exact_trajectories(&self, grid: TimeGrid) -> ExactSolution {
        compute_exact(&self.system, &self.initial_conditions, self.t0, grid, self.noise)
    }

    /// Exact solution on the independent grid [exact_t0, exact_t_bound], flattened per time
    /// stamp: u1(t0), u2(t0), u1(t1), u2(t1), ...
    pub fn compute_exact_solution(&self) -> Vec<Sample> {
        let config = self.exact_config();
        self.compute_exact_trajectories(TimeGrid::Uniform(&config))
            .trajectories
            .interleaved()
    }

    /// exact solution on the time stamps recorded by the last solve
    pub fn compute_exact_on_recorded(&self) -> TrajectorySet {
        self.compute_exact_trajectories(TimeGrid::Recorded(self.get_series()))
            .trajectories
    }

    /// numerical - exact on the recorded time stamps, one trajectory per component
    pub fn compute_global_error(&self) -> TrajectorySet {
        let numerical = self.get_series();
        if numerical.is_empty() {
            return TrajectorySet::empty();
        }
        let exact = self.compute_exact_on_recorded();
        compute_global_error(numerical, &exact, &self.noise)
    }

    pub fn error_summary(&self) -> Option<ErrorSummary> {
        let errors = self.compute_global_error();
        if errors.is_empty() {
            return None;
        }
        Some(ErrorSummary::new(self.h, self.get_series(), &errors))
    }

    /// closed-form solver for the current system and initial conditions
    pub fn exact_solver(&self) -> Result<ExactSolver, StiffOdeError> {
        let mut solver = ExactSolver::new(&self.system, &self.initial_conditions, self.t0)?;
        solver.set_noise_floor(self.noise);
        Ok(solver)
    }

    pub fn get_exact_end_time(&self) -> f64 {
        self.exact_t_bound
    }

    pub fn get_step_size(&self) -> f64 {
        self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::BE::IntegrationStatus;
    use approx::assert_relative_eq;

    fn configured(h: f64, t_bound: f64) -> StiffODE {
        let mut ode = StiffODE::new();
        ode.loglevel = Some("off".to_string());
        ode.set_initial_conditions(vec![7.0, 13.0], 0.0);
        ode.set_parameters(h, t_bound, t_bound, 0.0).unwrap();
        ode
    }

    #[test]
    fn test_not_configured_returns_empty() {
        let mut ode = StiffODE::new();
        ode.loglevel = Some("off".to_string());
        ode.set_parameters(0.01, 0.1, 0.1, 0.0).unwrap();
        let status = ode.solve().status;
        assert_eq!(status, IntegrationStatus::NotConfigured);
        assert!(ode.get_series().is_empty());
        assert!(ode.compute_exact_solution().is_empty());
        assert!(ode.compute_global_error().is_empty());
        assert!(ode.error_summary().is_none());
    }

    #[test]
    fn test_full_pipeline() {
        let mut ode = configured(0.01, 0.1);
        ode.solve();
        let numerical = ode.get_series();
        assert_eq!(numerical.n_components(), 2);
        assert_eq!(numerical.len(), 11);

        let exact = ode.compute_exact_solution();
        assert_eq!(exact.len(), 22);
        assert_relative_eq!(exact[0].value, 7.0, epsilon = 1e-9);
        assert_relative_eq!(exact[1].value, 13.0, epsilon = 1e-9);
        assert_eq!(exact[2].t, exact[3].t);

        let errors = ode.compute_global_error();
        assert_eq!(errors.n_components(), 2);
        assert!(errors.len() <= numerical.len());
        let summary = ode.error_summary().unwrap();
        assert_eq!(summary.components.len(), 2);
        assert!(summary.components[0].max_abs_error > 0.0);
    }

    #[test]
    fn test_exact_window_independent_of_solve() {
        let mut ode = configured(0.01, 0.1);
        ode.set_parameters(0.01, 0.1, 0.05, 0.02).unwrap();
        ode.solve();
        let exact = ode.compute_exact_solution();
        // 0.02, 0.03, 0.04, 0.05
        assert_eq!(exact.len(), 8);
        assert_relative_eq!(exact[0].t, 0.02, epsilon = 1e-12);
        assert_eq!(ode.get_exact_end_time(), 0.05);
    }

    #[test]
    fn test_resolve_replaces_series() {
        let mut ode = configured(0.01, 0.1);
        ode.solve();
        let first = ode.get_series().clone();
        ode.solve();
        assert_eq!(&first, ode.get_series());

        ode.set_parameters(0.02, 0.1, 0.1, 0.0).unwrap();
        assert!(ode.get_series().is_empty());
        ode.solve();
        assert_eq!(ode.get_series().len(), 6);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut ode = configured(0.01, 0.1);
        assert!(ode.set_parameters(0.0, 0.1, 0.1, 0.0).is_err());
        assert!(ode.set_parameters(0.01, -1.0, 0.1, 0.0).is_err());
        assert!(ode.set_parameters(0.01, 0.1, 0.1, 0.5).is_err());
        // unchanged
        assert_eq!(ode.get_step_size(), 0.01);
        assert_eq!(ode.get_exact_end_time(), 0.1);
    }

    #[test]
    fn test_decimated_series() {
        let mut ode = configured(0.01, 1.0);
        ode.solve();
        assert_eq!(ode.get_series().len(), 101);
        // every 11th sample
        let thin = ode.get_decimated_series(Some(10));
        assert_eq!(thin.len(), 10);
        assert_relative_eq!(thin.times()[1], 0.11, epsilon = 1e-12);
        assert_eq!(ode.get_decimated_series(None).len(), 101);
    }

    #[test]
    fn test_step_limit_message() {
        let mut ode = configured(0.01, 100.0);
        ode.set_max_steps(50);
        ode.solve();
        assert_eq!(ode.get_series().len(), 50);
        assert!(ode.get_message().unwrap().contains("maximum number of steps"));
    }
}
