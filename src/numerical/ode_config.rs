//! Caller-owned settings of the numerical solve and of the closed-form sampling window.
use crate::numerical::errors::StiffOdeError;

/// hard ceiling of the number of integration steps
pub const MAX_STEPS: usize = 1_000_000;

/// Relative slack (in units of the step) used when comparing a grid time with the bound,
/// so that t0 + n*h landing a few ulps above t_bound is still taken as t_bound.
const GRID_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct SolveConfig {
    pub initial_conditions: Vec<f64>,
    pub t0: f64,
    pub h: f64,
    pub t_bound: f64,
}

impl SolveConfig {
    pub fn new(initial_conditions: Vec<f64>, t0: f64, h: f64, t_bound: f64) -> Self {
        SolveConfig {
            initial_conditions,
            t0,
            h,
            t_bound,
        }
    }

    /// initial conditions present - an empty vector is the "not configured yet" state
    pub fn is_configured(&self) -> bool {
        !self.initial_conditions.is_empty()
    }

    pub fn validate(&self) -> Result<(), StiffOdeError> {
        check_step(self.h)?;
        check_window(self.t0, self.t_bound)
    }

    pub fn time_at(&self, n: usize) -> f64 {
        grid_time(self.t0, self.h, n)
    }

    pub fn exceeds_bound(&self, t: f64) -> bool {
        past_bound(t, self.t_bound, self.h)
    }
}

/// Uniform grid on which the exact solution is sampled independently of the integration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactConfig {
    pub t0: f64,
    pub t_bound: f64,
    pub h: f64,
}

impl ExactConfig {
    pub fn new(t0: f64, t_bound: f64, h: f64) -> Self {
        ExactConfig { t0, t_bound, h }
    }

    pub fn validate(&self) -> Result<(), StiffOdeError> {
        check_step(self.h)?;
        check_window(self.t0, self.t_bound)
    }

    /// t0, t0 + h, ... up to and including t_bound, at most `max_points` values
    pub fn grid(&self, max_points: usize) -> Vec<f64> {
        if self.validate().is_err() {
            return Vec::new();
        }
        (0..max_points)
            .map(|n| grid_time(self.t0, self.h, n))
            .take_while(|&t| !past_bound(t, self.t_bound, self.h))
            .collect()
    }
}

pub(crate) fn grid_time(t0: f64, h: f64, n: usize) -> f64 {
    t0 + n as f64 * h
}

pub(crate) fn past_bound(t: f64, t_bound: f64, h: f64) -> bool {
    t > t_bound + GRID_SLACK * h
}

fn check_step(h: f64) -> Result<(), StiffOdeError> {
    if !(h.is_finite() && h > 0.0) {
        return Err(StiffOdeError::InvalidStep(h));
    }
    Ok(())
}

fn check_window(start: f64, end: f64) -> Result<(), StiffOdeError> {
    if !(start.is_finite() && end.is_finite()) {
        return Err(StiffOdeError::InvalidTimeWindow {
            start,
            end,
            reason: "bounds must be finite",
        });
    }
    if end < start {
        return Err(StiffOdeError::InvalidTimeWindow {
            start,
            end,
            reason: "end must not precede start",
        });
    }
    Ok(())
}
