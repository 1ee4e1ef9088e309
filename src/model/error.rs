//! Configuration error types

use thiserror::Error;

/// Invalid model or grid configuration, detected before any solving
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter is outside its admissible range
    #[error("Invalid parameter: {param} = {value} ({reason})")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    /// The expansion point is not a steady state of the capital dynamics
    #[error(
        "kss = {kss} is not a steady state: f'(kss) = {marginal_product} but rho = {rho}"
    )]
    NotSteadyState {
        kss: f64,
        marginal_product: f64,
        rho: f64,
    },

    /// An evaluation grid axis is malformed
    #[error("Invalid {axis} grid: {reason}")]
    InvalidGrid { axis: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(param: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
