//! Closed-form solution of dy/dt = A*y with diagonalizable A.
//!
//! With eigenpairs (lambda_i, v_i) of A and modal coefficients c = V^{-1} * y(t0),
//! y(t) = sum_i c_i * exp(lambda_i * (t - t0)) * v_i.
//! The decomposition depends only on A and is computed once per solver; evaluation at a time
//! point is then a handful of exponentials and one matrix-vector product.
use crate::numerical::errors::StiffOdeError;
use crate::numerical::linear_system::OdeSystem;
use crate::numerical::noise_floor::NoiseFloor;
use crate::numerical::ode_config::{ExactConfig, MAX_STEPS};
use crate::numerical::trajectory::TrajectorySet;
use crate::somelinalg::linear_sys_diagnostics::{
    CONDITION_WARN_THRESHOLD, condition_number, poorly_conditioned,
};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};

/// condition number of the eigenvector matrix above which it is taken as singular
const SINGULAR_EIGENBASIS: f64 = 1e15;

/// real eigenvalues and the matching eigenvectors (as columns)
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    pub eigenvalues: DVector<f64>,
    pub eigenvectors: DMatrix<f64>,
}

impl EigenDecomposition {
    pub fn new(A: &DMatrix<f64>) -> Result<Self, StiffOdeError> {
        let (rows, cols) = A.shape();
        if rows != cols {
            return Err(StiffOdeError::NonSquareMatrix { rows, cols });
        }
        if rows == 0 {
            return Err(StiffOdeError::NotDiagonalizable);
        }
        if is_symmetric(A) {
            debug!("symmetric coefficient matrix, using symmetric eigensolver");
            let eigen = A.clone().symmetric_eigen();
            return Ok(EigenDecomposition {
                eigenvalues: eigen.eigenvalues,
                eigenvectors: eigen.eigenvectors,
            });
        }
        let eigenvalues = A.eigenvalues().ok_or(StiffOdeError::ComplexSpectrum)?;
        let eigenvectors = eigenvectors_from_null_spaces(A, &eigenvalues)?;
        Ok(EigenDecomposition {
            eigenvalues,
            eigenvectors,
        })
    }

    pub fn dim(&self) -> usize {
        self.eigenvalues.len()
    }
}

fn is_symmetric(A: &DMatrix<f64>) -> bool {
    let scale = A.amax().max(1.0);
    (A - A.transpose()).amax() <= 1e-12 * scale
}

/// For every group of (numerically) equal eigenvalues of multiplicity k, the eigenvectors are
/// the k right singular vectors of A - lambda*I with the smallest singular values. If fewer than
/// k of them are negligible the group is a set of close but distinct eigenvalues, and each one
/// gets the null vector of its own A - lambda_i*I. A defective matrix then shows up as a
/// numerically singular eigenvector matrix.
fn eigenvectors_from_null_spaces(
    A: &DMatrix<f64>,
    eigenvalues: &DVector<f64>,
) -> Result<DMatrix<f64>, StiffOdeError> {
    let n = A.nrows();
    let lambda_scale = eigenvalues.amax().max(1.0);
    let cluster_tol = 1e-8 * lambda_scale;
    let null_tol = 1e-7 * A.amax().max(1.0);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eigenvalues[i].total_cmp(&eigenvalues[j]));

    let mut vectors = DMatrix::zeros(n, n);
    let mut start = 0;
    while start < n {
        let lambda = eigenvalues[order[start]];
        let mut end = start + 1;
        while end < n && (eigenvalues[order[end]] - lambda).abs() <= cluster_tol {
            end += 1;
        }
        let multiplicity = end - start;
        let null_space = smallest_singular_vectors(A, lambda, multiplicity)?;
        if null_space.iter().all(|(sigma, _)| *sigma <= null_tol) {
            for (k, (_, v)) in null_space.into_iter().enumerate() {
                vectors.set_column(order[start + k], &v);
            }
        } else {
            debug!(
                "eigenvalues near {} treated as distinct ({} in the group)",
                lambda, multiplicity
            );
            for &column in &order[start..end] {
                let mut own = smallest_singular_vectors(A, eigenvalues[column], 1)?;
                let (_, v) = own.remove(0);
                vectors.set_column(column, &v);
            }
        }
        start = end;
    }

    let cond = condition_number(&vectors);
    if cond > SINGULAR_EIGENBASIS {
        warn!(
            "eigenvectors are linearly dependent (condition number {:.3e}), A is defective",
            cond
        );
        return Err(StiffOdeError::NotDiagonalizable);
    }
    Ok(vectors)
}

/// `count` right singular vectors of A - lambda*I with the smallest singular values,
/// paired with those singular values
fn smallest_singular_vectors(
    A: &DMatrix<f64>,
    lambda: f64,
    count: usize,
) -> Result<Vec<(f64, DVector<f64>)>, StiffOdeError> {
    let n = A.nrows();
    let shifted = A - DMatrix::identity(n, n) * lambda;
    let svd = shifted.svd(false, true);
    let v_t = svd.v_t.ok_or(StiffOdeError::NotDiagonalizable)?;
    let mut by_size: Vec<usize> = (0..svd.singular_values.len()).collect();
    by_size.sort_by(|&i, &j| svd.singular_values[i].total_cmp(&svd.singular_values[j]));
    Ok(by_size
        .into_iter()
        .take(count)
        .map(|i| (svd.singular_values[i], v_t.row(i).transpose()))
        .collect())
}

/// Where the closed-form solution is sampled.
#[derive(Debug, Clone, Copy)]
pub enum TimeGrid<'a> {
    /// independent uniform grid
    Uniform(&'a ExactConfig),
    /// exactly the time stamps recorded by the integrator, for index alignment
    Recorded(&'a TrajectorySet),
}

#[derive(Debug, Clone)]
pub struct ExactSolver {
    decomposition: EigenDecomposition,
    /// modal coefficients c = V^{-1} * y(t0)
    coefficients: DVector<f64>,
    t0: f64,
    noise: NoiseFloor,
    /// cap on the points of a uniform grid
    max_points: usize,
}

impl ExactSolver {
    /// `t0` is the time at which `initial_conditions` hold
    pub fn new<S: OdeSystem>(
        system: &S,
        initial_conditions: &[f64],
        t0: f64,
    ) -> Result<Self, StiffOdeError> {
        let A = system
            .coefficient_matrix()
            .ok_or(StiffOdeError::NotLinearTimeInvariant)?;
        if initial_conditions.len() != A.nrows() {
            return Err(StiffOdeError::DimensionMismatch {
                system: A.nrows(),
                state: initial_conditions.len(),
            });
        }
        let decomposition = EigenDecomposition::new(A)?;
        poorly_conditioned(
            &decomposition.eigenvectors,
            CONDITION_WARN_THRESHOLD,
            "eigenvector matrix",
        );
        let V_inv = decomposition
            .eigenvectors
            .clone()
            .try_inverse()
            .ok_or(StiffOdeError::NotDiagonalizable)?;
        let coefficients = V_inv * DVector::from_column_slice(initial_conditions);
        info!(
            "eigenvalues: {:?}, modal coefficients: {:?}",
            decomposition.eigenvalues.as_slice(),
            coefficients.as_slice()
        );
        Ok(ExactSolver {
            decomposition,
            coefficients,
            t0,
            noise: NoiseFloor::default(),
            max_points: MAX_STEPS,
        })
    }

    pub fn set_noise_floor(&mut self, noise: NoiseFloor) {
        self.noise = noise;
    }

    /// at least one point is always kept
    pub fn set_max_points(&mut self, max_points: usize) {
        self.max_points = max_points.max(1);
    }

    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.decomposition.eigenvalues
    }

    pub fn eigenvectors(&self) -> &DMatrix<f64> {
        &self.decomposition.eigenvectors
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    /// exp(lambda_i * (t - t0)) for every mode
    pub fn mode_amplitudes(&self, t: f64) -> Vec<f64> {
        self.decomposition
            .eigenvalues
            .iter()
            .map(|lambda| (lambda * (t - self.t0)).exp())
            .collect()
    }

    /// y(t), values below the snap threshold set to exactly zero
    pub fn value_at(&self, t: f64) -> DVector<f64> {
        let weights = DVector::from_iterator(
            self.dim(),
            self.coefficients
                .iter()
                .zip(self.mode_amplitudes(t))
                .map(|(c, e)| c * e),
        );
        let mut y = &self.decomposition.eigenvectors * weights;
        y.apply(|v| *v = self.noise.snap(*v));
        y
    }

    pub fn dim(&self) -> usize {
        self.decomposition.dim()
    }

    pub fn evaluate(&self, times: &[f64]) -> TrajectorySet {
        let mut set = TrajectorySet::with_capacity(self.dim(), times.len());
        for &t in times {
            set.push_state(t, self.value_at(t).as_slice());
        }
        set
    }

    pub fn sample(&self, grid: TimeGrid) -> TrajectorySet {
        match grid {
            TimeGrid::Uniform(config) => {
                let cap = self.max_points;
                let mut times = config.grid(cap + 1);
                if times.len() > cap {
                    warn!(
                        "exact solution grid truncated to {} points (t <= {})",
                        cap,
                        times[cap - 1]
                    );
                    times.truncate(cap);
                }
                self.evaluate(&times)
            }
            TimeGrid::Recorded(numerical) => self.evaluate(&numerical.times()),
        }
    }
}

/// Exact trajectories plus an optional notice explaining why they are empty.
#[derive(Debug, Clone)]
pub struct ExactSolution {
    pub trajectories: TrajectorySet,
    pub message: Option<String>,
}

impl ExactSolution {
    fn empty(message: Option<String>) -> Self {
        ExactSolution {
            trajectories: TrajectorySet::empty(),
            message,
        }
    }
}

/// Never fails: missing initial conditions, a missing numerical trajectory (recorded mode) or
/// a matrix without a real eigenbasis give an empty result.
pub fn compute_exact<S: OdeSystem>(
    system: &S,
    initial_conditions: &[f64],
    t0: f64,
    grid: TimeGrid,
    noise: NoiseFloor,
) -> ExactSolution {
    if initial_conditions.is_empty() {
        return ExactSolution::empty(None);
    }
    if let TimeGrid::Recorded(numerical) = grid {
        if numerical.is_empty() {
            return ExactSolution::empty(Some("no numerical trajectory to align with".to_string()));
        }
    }
    match ExactSolver::new(system, initial_conditions, t0) {
        Ok(mut solver) => {
            solver.set_noise_floor(noise);
            ExactSolution {
                trajectories: solver.sample(grid),
                message: None,
            }
        }
        Err(e) => {
            warn!("exact solution not available: {}", e);
            ExactSolution::empty(Some(e.to_string()))
        }
    }
}
