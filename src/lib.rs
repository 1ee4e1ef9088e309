//! Perturbation solver for the optimal consumption policy of a
//! continuous-time growth model.
//!
//! The policy is approximated by a Taylor polynomial around the
//! deterministic steady state. Its coefficients are found one at a time by
//! differentiating the residual of the optimality condition, evaluating at
//! the expansion point and solving for the single new unknown.
//!
//! ```rust,no_run
//! use pertsol::prelude::*;
//!
//! let model = GrowthModel::deterministic(ModelParams::deterministic_reference()).unwrap();
//! let solution = solve(&model).unwrap();
//! let residual = ResidualFunction::new(&solution).unwrap();
//! println!("c(kss) = {}", solution.steady_state_consumption());
//! println!("R(1.2) = {:e}", residual.at(1.2, 0.0).unwrap());
//! ```

pub mod error;
pub mod evaluate;
pub mod model;
pub mod pipeline;
pub mod residual;
pub mod solver;
pub mod symbolic;

pub use crate::evaluate::{GridAxis, GridOptions, PolicyFunction, ResidualFunction, ResidualGrid};
pub use crate::model::{
    CoefficientIndex, ConfigError, Expansion, GrowthModel, ModelParams, Variant,
};
pub use crate::pipeline::{run, PerturbationConfig, PipelineOutput};
pub use crate::residual::Residual;
pub use crate::solver::{solve, CoefficientTable, Solution, SolveError};
pub use error::PertsolError;

pub mod prelude {
    pub use crate::evaluate::{
        sample, GridAxis, GridOptions, PolicyFunction, ResidualCurve, ResidualFunction,
        ResidualGrid, ResidualSurface,
    };
    pub use crate::model::{CoefficientIndex, Expansion, GrowthModel, ModelParams, Variant};
    pub use crate::pipeline::{run, PerturbationConfig, PipelineOutput};
    pub use crate::solver::{solve, CoefficientTable, Solution, SolutionSummary};
    pub use crate::PertsolError;
}
