use log::warn;
use nalgebra::DMatrix;

/// threshold on the condition number above which a warning is logged
pub const CONDITION_WARN_THRESHOLD: f64 = 1e12;

/// Condition number in the 2-norm: the ratio of the largest singular value to the smallest.
/// Returns infinity for an exactly singular (or empty) matrix.
pub fn condition_number(A: &DMatrix<f64>) -> f64 {
    if A.is_empty() {
        return f64::INFINITY;
    }
    let singular_values = A.singular_values();
    let max_sigma = singular_values.max();
    let min_sigma = singular_values.min();
    if min_sigma == 0.0 {
        f64::INFINITY
    } else {
        max_sigma / min_sigma
    }
}

/// Logs a warning if the condition number is above `threshold`. Nothing is rejected:
/// conditioning of the coefficient matrix is the caller's business.
pub fn poorly_conditioned(A: &DMatrix<f64>, threshold: f64, what: &str) -> (bool, f64) {
    let cond = condition_number(A);
    let poorly_conditioned = cond > threshold;
    if poorly_conditioned {
        warn!("{} is poorly conditioned. Condition number = {:.3e}", what, cond);
    }
    (poorly_conditioned, cond)
}
