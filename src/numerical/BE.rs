/// Backward Euler method for linear time-invariant systems dy/dt = A*y.
///
/// The implicit step y_{n+1} = y_n + h*A*y_{n+1} is rearranged to (I - h*A)*y_{n+1} = y_n.
/// A is constant, so M = I - h*A is inverted once before the stepping loop and every step is
/// a single matrix-vector product y_{n+1} = M^{-1}*y_n.
///
/// Stopping policy, checked before each step in this order:
/// 1. hard ceiling on the number of steps -> `StepLimitExceeded`, samples gathered so far are kept
/// 2. every component of the state is at or below the decay threshold -> `Decayed`
/// 3. t > t_bound -> `Finished`
///
/// Every accepted step records the state at the start of its interval, so the state beyond
/// t_bound is never recorded.
use crate::numerical::errors::StiffOdeError;
use crate::numerical::linear_system::{LinearSystem, OdeSystem, iteration_matrix};
use crate::numerical::noise_floor::NoiseFloor;
use crate::numerical::ode_config::{MAX_STEPS, SolveConfig};
use crate::numerical::trajectory::TrajectorySet;
use crate::somelinalg::linear_sys_diagnostics::{CONDITION_WARN_THRESHOLD, poorly_conditioned};
use core::fmt::Display;
use log::{debug, error, info, warn};
use nalgebra::{DMatrix, DVector};
use std::time::{Duration, Instant};
use strum_macros::Display as StrumDisplay;
use tabled::{builder::Builder, settings::Style};

const PROGRESS_EVERY: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum IntegrationStatus {
    /// no initial conditions, nothing computed
    #[strum(serialize = "not configured")]
    NotConfigured,
    #[strum(serialize = "finished")]
    Finished,
    /// the state decayed to numerical noise before t_bound
    #[strum(serialize = "decayed")]
    Decayed,
    #[strum(serialize = "step limit exceeded")]
    StepLimitExceeded,
    #[strum(serialize = "failed")]
    Failed,
}

/// Owned result of one solve. A new solve always produces a new value.
#[derive(Debug, Clone)]
pub struct NumericalSolution {
    pub trajectories: TrajectorySet,
    pub status: IntegrationStatus,
    /// diagnostic notice (step limit, decay, setup failure)
    pub message: Option<String>,
    pub n_steps: usize,
    /// condition number of I - h*A
    pub condition_number: Option<f64>,
    pub elapsed: Duration,
}

impl NumericalSolution {
    fn without_data(status: IntegrationStatus, message: Option<String>) -> Self {
        NumericalSolution {
            trajectories: TrajectorySet::empty(),
            status,
            message,
            n_steps: 0,
            condition_number: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn not_configured() -> Self {
        NumericalSolution::without_data(IntegrationStatus::NotConfigured, None)
    }

    fn failed(err: StiffOdeError) -> Self {
        error!("backward Euler setup failed: {}", err);
        NumericalSolution::without_data(IntegrationStatus::Failed, Some(err.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// time stamps and a matrix of states, one row per time stamp
    pub fn get_result(&self) -> (DVector<f64>, DMatrix<f64>) {
        self.trajectories.to_matrix()
    }
}

pub struct BE<S: OdeSystem = LinearSystem> {
    system: S,
    config: SolveConfig,
    noise: NoiseFloor,
    max_steps: usize,
}

impl<S: OdeSystem> Display for BE<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BE {{ t0: {}, t_bound: {}, h: {}, y0: {:?}, max_steps: {} }}",
            self.config.t0,
            self.config.t_bound,
            self.config.h,
            self.config.initial_conditions,
            self.max_steps
        )
    }
}

impl<S: OdeSystem> BE<S> {
    pub fn new(system: S, config: SolveConfig) -> BE<S> {
        BE {
            system,
            config,
            noise: NoiseFloor::default(),
            max_steps: MAX_STEPS,
        }
    }

    pub fn set_noise_floor(&mut self, noise: NoiseFloor) {
        self.noise = noise;
    }

    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps;
    }

    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// M^{-1} = (I - h*A)^{-1} together with the condition number of M
    fn iteration_inverse(&self) -> Result<(DMatrix<f64>, f64), StiffOdeError> {
        self.config.validate()?;
        let A = self
            .system
            .coefficient_matrix()
            .ok_or(StiffOdeError::NotLinearTimeInvariant)?;
        if self.config.initial_conditions.len() != A.nrows() {
            return Err(StiffOdeError::DimensionMismatch {
                system: A.nrows(),
                state: self.config.initial_conditions.len(),
            });
        }
        let M = iteration_matrix(A, self.config.h);
        let (_, cond) = poorly_conditioned(&M, CONDITION_WARN_THRESHOLD, "I - h*A");
        let M_inv = M
            .try_inverse()
            .ok_or(StiffOdeError::SingularIterationMatrix(self.config.h))?;
        Ok((M_inv, cond))
    }

    /// Runs the integration from scratch. Calling it twice with the same configuration gives
    /// identical trajectories.
    pub fn solve(&self) -> NumericalSolution {
        if !self.config.is_configured() {
            info!("no initial conditions, backward Euler skipped");
            return NumericalSolution::not_configured();
        }
        let start = Instant::now();
        let (M_inv, cond) = match self.iteration_inverse() {
            Ok(prepared) => prepared,
            Err(e) => return NumericalSolution::failed(e),
        };
        let mut solution = self.main_loop(&M_inv);
        solution.condition_number = Some(cond);
        solution.elapsed = start.elapsed();
        info!(
            "backward Euler took {} milliseconds, {} steps, status: {}",
            solution.elapsed.as_millis(),
            solution.n_steps,
            solution.status
        );
        if let Some(msg) = &solution.message {
            match solution.status {
                IntegrationStatus::StepLimitExceeded => warn!("{}", msg),
                _ => info!("{}", msg),
            }
        }
        self.calc_statistics(&solution);
        solution
    }

    fn main_loop(&self, M_inv: &DMatrix<f64>) -> NumericalSolution {
        let cfg = &self.config;
        let n_eq = cfg.initial_conditions.len();
        let expected = ((cfg.t_bound - cfg.t0) / cfg.h).floor();
        let capacity = if expected.is_finite() && expected >= 0.0 {
            (expected as usize).saturating_add(1).min(self.max_steps)
        } else {
            0
        };
        let mut trajectories = TrajectorySet::with_capacity(n_eq, capacity);
        let mut y = DVector::from_column_slice(&cfg.initial_conditions);
        let mut y_next = DVector::zeros(n_eq);
        let mut n: usize = 0;

        let (status, message) = loop {
            let t = cfg.time_at(n);
            // ceiling first: a run whose last allowed step lands on t_bound still reports the limit
            if n >= self.max_steps {
                break (
                    IntegrationStatus::StepLimitExceeded,
                    Some(format!(
                        "maximum number of steps ({}) reached at t = {}, partial solution kept",
                        self.max_steps, t
                    )),
                );
            }
            if self.noise.is_decayed(y.as_slice()) {
                break (
                    IntegrationStatus::Decayed,
                    Some(format!(
                        "solution decayed below {:e} at t = {}",
                        self.noise.decay, t
                    )),
                );
            }
            if cfg.exceeds_bound(t) {
                break (IntegrationStatus::Finished, None);
            }
            trajectories.push_state(t, y.as_slice());
            y_next.gemv(1.0, M_inv, &y, 0.0);
            std::mem::swap(&mut y, &mut y_next);
            n += 1;
            if n % PROGRESS_EVERY == 0 {
                let progress = (t - cfg.t0) / (cfg.t_bound - cfg.t0) * 100.0;
                debug!("BE progress: {:.1}% (t = {:.6}/{:.6})", progress, t, cfg.t_bound);
            }
        };

        NumericalSolution {
            trajectories,
            status,
            message,
            n_steps: n,
            condition_number: None,
            elapsed: Duration::ZERO,
        }
    }

    fn calc_statistics(&self, solution: &NumericalSolution) {
        let mut builder = Builder::default();
        builder.push_record(["number of equations".to_string(), self.system.dim().to_string()]);
        builder.push_record(["step size".to_string(), self.config.h.to_string()]);
        builder.push_record(["number of steps".to_string(), solution.n_steps.to_string()]);
        builder.push_record(["status".to_string(), solution.status.to_string()]);
        if let Some(cond) = solution.condition_number {
            builder.push_record(["cond(I - h*A)".to_string(), format!("{:.3e}", cond)]);
        }
        builder.push_record([
            "time elapsed, ms".to_string(),
            solution.elapsed.as_millis().to_string(),
        ]);
        let mut table = builder.build();
        table.with(Style::modern_rounded());
        info!("\n \n CALC STATISTICS \n \n {}", table);
    }
}
