//! Error type for configuration, validation and export.
//!
//! The compute path (integration, exact solution, global error) never returns these:
//! failures there are turned into empty or partial trajectories plus a diagnostic message.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StiffOdeError {
    #[error("step size must be positive and finite, got {0}")]
    InvalidStep(f64),
    #[error("invalid time window [{start}, {end}]: {reason}")]
    InvalidTimeWindow {
        start: f64,
        end: f64,
        reason: &'static str,
    },
    #[error("coefficient matrix must be square, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("state of length {state} does not match system of dimension {system}")]
    DimensionMismatch { system: usize, state: usize },
    #[error("system is not linear time-invariant, no constant coefficient matrix")]
    NotLinearTimeInvariant,
    #[error("iteration matrix I - h*A is singular for h = {0}")]
    SingularIterationMatrix(f64),
    #[error("coefficient matrix has complex eigenvalues, closed-form solution is not available")]
    ComplexSpectrum,
    #[error("coefficient matrix is not diagonalizable")]
    NotDiagonalizable,
    #[error("task file: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("task file: missing key `{0}`")]
    MissingKey(String),
    #[error("task file: key `{key}` expected {expected}")]
    WrongType { key: String, expected: &'static str },
    #[error("unknown loglevel `{0}`, expected debug, info, warn, error or off")]
    UnknownLogLevel(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
