use thiserror::Error;

use crate::model::ConfigError;
use crate::solver::SolveError;
use crate::symbolic::SymbolicError;

#[derive(Error, Debug)]
pub enum PertsolError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Solver failed: {0}")]
    Solve(#[from] SolveError),
    #[error("Symbolic engine failed: {0}")]
    Symbolic(#[from] SymbolicError),
    /// The divisor used to scale the residual is zero or not finite
    #[error("Residual normalization is undefined (divisor = {value})")]
    Normalization { value: f64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
