//! Error types for the symbolic engine

use thiserror::Error;

/// Errors raised while evaluating, solving or compiling expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolicError {
    /// A symbol had no value during evaluation or compilation
    #[error("Unbound symbol '{symbol}'")]
    UnboundSymbol { symbol: String },

    /// An equation meant to contain one unknown contains others
    #[error("Equation in '{unknown}' also contains {others:?}: {equation}")]
    ExtraSymbols {
        unknown: String,
        others: Vec<String>,
        equation: String,
    },

    /// An equation is not a polynomial of the admitted degree in its unknown
    #[error("Equation is not polynomial of degree <= {max_degree} in '{unknown}': {equation}")]
    DegreeTooHigh {
        unknown: String,
        max_degree: usize,
        equation: String,
    },

    /// A compiled function was called with the wrong number of arguments
    #[error("Compiled function expects {expected} arguments, got {found}")]
    Arity { expected: usize, found: usize },
}
