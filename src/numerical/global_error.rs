//! Global error E(t) = numerical(t) - exact(t).
//!
//! The two sets are aligned by position, not by searching matching time stamps, so they must
//! have been produced on the same time stamps (exact solution sampled on the recorded grid of
//! the integrator). The scan stops at the first index where any numerical or exact value is at
//! or below the decay threshold: past that point both trajectories are numerical noise and the
//! difference carries no information. The result may therefore be shorter than either input.
use crate::numerical::noise_floor::NoiseFloor;
use crate::numerical::trajectory::TrajectorySet;
use log::{debug, info};

pub fn compute_global_error(
    numerical: &TrajectorySet,
    exact: &TrajectorySet,
    noise: &NoiseFloor,
) -> TrajectorySet {
    if numerical.n_components() == 0 || numerical.is_empty() || exact.is_empty() {
        return TrajectorySet::empty();
    }
    let n_components = numerical.n_components().min(exact.n_components());
    let len = numerical.len().min(exact.len());
    if numerical.len() != exact.len() {
        debug!(
            "numerical ({}) and exact ({}) lengths differ, comparing the first {}",
            numerical.len(),
            exact.len(),
            len
        );
    }
    let mut errors = TrajectorySet::with_capacity(n_components, len);
    let mut row = vec![0.0; n_components];
    'scan: for i in 0..len {
        let t = numerical.components()[0].samples()[i].t;
        for j in 0..n_components {
            let num = numerical.components()[j].samples()[i].value;
            let ex = exact.components()[j].samples()[i].value;
            if noise.is_noise(num) || noise.is_noise(ex) {
                info!(
                    "global error scan stopped at t = {} (index {}): value below {:e}",
                    t, i, noise.decay
                );
                break 'scan;
            }
            row[j] = num - ex;
        }
        errors.push_state(t, &row);
    }
    errors
}

/// Largest absolute global error of one component and where it occurs.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentErrorSummary {
    pub max_abs_error: f64,
    pub t_at_max: f64,
    /// last recorded numerical time stamp and value
    pub last_t: Option<f64>,
    pub last_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSummary {
    pub h: f64,
    pub n_steps: usize,
    pub components: Vec<ComponentErrorSummary>,
}

impl ErrorSummary {
    pub fn new(h: f64, numerical: &TrajectorySet, errors: &TrajectorySet) -> Self {
        let components = errors
            .components()
            .iter()
            .enumerate()
            .map(|(j, error)| {
                let (max_abs_error, t_at_max) = error.samples().iter().fold(
                    (0.0_f64, f64::NAN),
                    |(max, t_max), s| {
                        if s.value.abs() > max || t_max.is_nan() {
                            (s.value.abs(), s.t)
                        } else {
                            (max, t_max)
                        }
                    },
                );
                let last = numerical.component(j).and_then(|c| c.last());
                ComponentErrorSummary {
                    max_abs_error,
                    t_at_max,
                    last_t: last.map(|s| s.t),
                    last_value: last.map(|s| s.value),
                }
            })
            .collect();
        ErrorSummary {
            h,
            n_steps: errors.len(),
            components,
        }
    }
}

impl std::fmt::Display for ErrorSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "step size: {}", self.h)?;
        for (j, c) in self.components.iter().enumerate() {
            writeln!(
                f,
                "component {}: max |E| = {:e} at x = {}",
                j + 1,
                c.max_abs_error,
                c.t_at_max
            )?;
        }
        writeln!(f, "number of steps: {}", self.n_steps)?;
        if let Some(last_t) = self.components.first().and_then(|c| c.last_t) {
            writeln!(f, "last x: {}", last_t)?;
        }
        for (j, c) in self.components.iter().enumerate() {
            if let Some(v) = c.last_value {
                writeln!(f, "last value of component {}: {}", j + 1, v)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::BE::BE;
    use crate::numerical::exact_solution::{TimeGrid, compute_exact};
    use crate::numerical::linear_system::LinearSystem;
    use crate::numerical::ode_config::SolveConfig;
    use approx::assert_relative_eq;

    fn set_from_rows(rows: &[(f64, [f64; 2])]) -> TrajectorySet {
        let mut set = TrajectorySet::with_components(2);
        for (t, y) in rows {
            set.push_state(*t, y);
        }
        set
    }

    #[test]
    fn test_pointwise_difference() {
        let numerical = set_from_rows(&[(0.0, [1.0, 2.0]), (1.0, [3.0, 5.0])]);
        let exact = set_from_rows(&[(0.0, [1.0, 1.5]), (1.0, [2.5, 5.5])]);
        let errors = compute_global_error(&numerical, &exact, &NoiseFloor::default());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.component(0).unwrap().values(), vec![0.0, 0.5]);
        assert_eq!(errors.component(1).unwrap().values(), vec![0.5, -0.5]);
        assert_eq!(errors.times(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_early_stop_on_noise() {
        let numerical = set_from_rows(&[(0.0, [1.0, 2.0]), (1.0, [1e-10, 5.0]), (2.0, [1.0, 1.0])]);
        let exact = set_from_rows(&[(0.0, [1.0, 1.0]), (1.0, [1.0, 1.0]), (2.0, [1.0, 1.0])]);
        let errors = compute_global_error(&numerical, &exact, &NoiseFloor::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.n_components(), 2);

        // exact value of zero also stops the scan
        let exact = set_from_rows(&[(0.0, [0.0, 1.0]), (1.0, [1.0, 1.0]), (2.0, [1.0, 1.0])]);
        let errors = compute_global_error(&numerical, &exact, &NoiseFloor::default());
        assert_eq!(errors.len(), 0);
    }

    #[test]
    fn test_misaligned_lengths_bounded_by_shorter() {
        let numerical = set_from_rows(&[(0.0, [1.0, 2.0]), (1.0, [3.0, 5.0]), (2.0, [3.0, 5.0])]);
        let exact = set_from_rows(&[(0.0, [1.0, 1.5])]);
        let errors = compute_global_error(&numerical, &exact, &NoiseFloor::default());
        assert_eq!(errors.len(), 1);
        let errors = compute_global_error(&exact, &numerical, &NoiseFloor::default());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        let some = set_from_rows(&[(0.0, [1.0, 2.0])]);
        let floor = NoiseFloor::default();
        assert!(compute_global_error(&TrajectorySet::empty(), &some, &floor).is_empty());
        assert!(compute_global_error(&some, &TrajectorySet::empty(), &floor).is_empty());
        assert!(compute_global_error(&TrajectorySet::with_components(2), &some, &floor).is_empty());
    }

    #[test]
    fn test_backward_euler_error_on_stiff_problem() {
        let system = LinearSystem::stiff_default();
        let config = SolveConfig::new(vec![7.0, 13.0], 0.0, 0.01, 0.1);
        let numerical = BE::new(system.clone(), config).solve().trajectories;
        let exact = compute_exact(
            &system,
            &[7.0, 13.0],
            0.0,
            TimeGrid::Recorded(&numerical),
            NoiseFloor::default(),
        )
        .trajectories;
        let errors = compute_global_error(&numerical, &exact, &NoiseFloor::default());
        assert!(errors.len() <= numerical.len().min(exact.len()));
        assert_eq!(errors.len(), 11);
        // no error at the initial point
        assert_relative_eq!(errors.component(0).unwrap().get(0).unwrap().value, 0.0, epsilon = 1e-9);
        // first step: BE damps the fast mode by 1/11 instead of e^{-10}
        let e1 = errors.component(0).unwrap().get(1).unwrap().value;
        let expected = -3.0 / 11.0 + 3.0 * (-10.0_f64).exp();
        assert_relative_eq!(e1, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_summary() {
        let numerical = set_from_rows(&[(0.0, [1.0, 2.0]), (1.0, [3.0, 5.0])]);
        let errors = set_from_rows(&[(0.0, [0.1, -0.2]), (1.0, [-0.3, 0.1])]);
        let summary = ErrorSummary::new(0.5, &numerical, &errors);
        assert_eq!(summary.n_steps, 2);
        assert_eq!(summary.components[0].max_abs_error, 0.3);
        assert_eq!(summary.components[0].t_at_max, 1.0);
        assert_eq!(summary.components[1].max_abs_error, 0.2);
        assert_eq!(summary.components[1].t_at_max, 0.0);
        assert_eq!(summary.components[1].last_value, Some(5.0));
        let text = summary.to_string();
        assert!(text.contains("number of steps: 2"));
        assert!(text.contains("last x: 1"));
    }
}
