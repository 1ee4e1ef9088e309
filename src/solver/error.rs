//! Coefficient solver error types

use thiserror::Error;

use crate::model::{CoefficientIndex, Expansion};
use crate::symbolic::SymbolicError;

/// Errors raised while determining Taylor coefficients
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The equation for a coefficient has no admissible root, several roots
    /// without a selection rule, or depends on another unsolved coefficient
    #[error("Cannot solve for {index}: {reason}. Equation: {equation}")]
    Unsolvable {
        index: CoefficientIndex,
        reason: String,
        equation: String,
    },

    /// The symbolic engine failed on the equation for a coefficient
    #[error("Symbolic engine failed while solving for {index}: {source}")]
    Engine {
        index: CoefficientIndex,
        #[source]
        source: SymbolicError,
    },

    /// The index lies outside the truncated expansion
    #[error("{index} lies outside the {expansion:?} expansion")]
    OutsideExpansion {
        index: CoefficientIndex,
        expansion: Expansion,
    },

    /// A coefficient was solved twice
    #[error("{index} has already been solved")]
    AlreadySolved { index: CoefficientIndex },

    /// A coefficient was read before being solved
    #[error("{index} has not been solved")]
    Unsolved { index: CoefficientIndex },
}
