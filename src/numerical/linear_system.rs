use crate::numerical::errors::StiffOdeError;
use nalgebra::{DMatrix, DVector};
use std::fmt::Display;

/// Right-hand side of dy/dt = f(t, y).
/// Only systems that expose a constant coefficient matrix can be integrated by the
/// linear backward Euler scheme and solved in closed form.
pub trait OdeSystem {
    fn dim(&self) -> usize;
    fn rhs(&self, t: f64, y: &DVector<f64>) -> DVector<f64>;
    /// A of dy/dt = A*y if the system is linear and time-invariant
    fn coefficient_matrix(&self) -> Option<&DMatrix<f64>> {
        None
    }
}

/// dy/dt = A*y with constant A
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    A: DMatrix<f64>,
}

impl LinearSystem {
    pub fn new(A: DMatrix<f64>) -> Result<Self, StiffOdeError> {
        let (rows, cols) = A.shape();
        if rows != cols {
            return Err(StiffOdeError::NonSquareMatrix { rows, cols });
        }
        Ok(LinearSystem { A })
    }

    /// rows are given row by row: `from_rows(&[vec![a, b], vec![c, d]])`
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, StiffOdeError> {
        let n = rows.len();
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(StiffOdeError::NonSquareMatrix {
                rows: n,
                cols: bad.len(),
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        LinearSystem::new(DMatrix::from_row_slice(n, cols, &flat))
    }

    /// The stiff test problem: eigenvalues -0.01 (slow mode) and -1000 (fast mode)
    pub fn stiff_default() -> Self {
        LinearSystem {
            A: DMatrix::from_row_slice(2, 2, &[-500.005, 499.995, 499.995, -500.005]),
        }
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.A
    }

    pub fn check_state(&self, y: &[f64]) -> Result<(), StiffOdeError> {
        if y.len() != self.A.nrows() {
            return Err(StiffOdeError::DimensionMismatch {
                system: self.A.nrows(),
                state: y.len(),
            });
        }
        Ok(())
    }
}

/// M = I - h*A, the matrix of the backward Euler step
pub fn iteration_matrix(A: &DMatrix<f64>, h: f64) -> DMatrix<f64> {
    let n = A.nrows();
    DMatrix::identity(n, n) - A * h
}

impl OdeSystem for LinearSystem {
    fn dim(&self) -> usize {
        self.A.nrows()
    }

    fn rhs(&self, _t: f64, y: &DVector<f64>) -> DVector<f64> {
        &self.A * y
    }

    fn coefficient_matrix(&self) -> Option<&DMatrix<f64>> {
        Some(&self.A)
    }
}

impl Display for LinearSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dy/dt = A*y, A = {}", self.A)
    }
}
