//! End-to-end runs: configuration, solving, evaluation and output
//!
//! A [`PerturbationConfig`] is loaded from JSON; every field is optional:
//!
//! ```json
//! {
//!   "variant": "stochastic",
//!   "params": { "order": 4, "rho": 0.05, "alpha": 0.25, "gamma": -10.0, "kss": 1.0 },
//!   "grid": {
//!     "capital": { "start": 0.8, "end": 1.2, "points": 100 },
//!     "variance": { "start": 0.0, "end": 0.001, "points": 100 }
//!   }
//! }
//! ```
//!
//! Missing `params` default to the reference calibration of the variant and
//! a missing `grid` to [`GridOptions::for_variant`].

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PertsolError;
use crate::evaluate::{sample, GridOptions, PolicyFunction, ResidualFunction, ResidualGrid};
use crate::model::{ConfigError, GrowthModel, ModelParams, Variant};
use crate::solver::{self, Solution};

/// Configuration of one perturbation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationConfig {
    pub variant: Variant,
    pub params: Option<ModelParams>,
    pub grid: Option<GridOptions>,
}

impl PerturbationConfig {
    /// Reference deterministic run
    pub fn deterministic() -> Self {
        Self {
            variant: Variant::Deterministic,
            params: Some(ModelParams::deterministic_reference()),
            grid: Some(GridOptions::for_variant(Variant::Deterministic)),
        }
    }

    /// Reference stochastic run
    pub fn stochastic() -> Self {
        Self {
            variant: Variant::Stochastic,
            params: Some(ModelParams::stochastic_reference()),
            grid: Some(GridOptions::for_variant(Variant::Stochastic)),
        }
    }

    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Switch the variant. An explicit grid describes the old variant's axes,
    /// so it is dropped in favour of the new variant's default grid.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        if variant != self.variant {
            self.grid = None;
        }
        self.variant = variant;
        self
    }

    pub fn with_grid(mut self, grid: GridOptions) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn from_file(path: &Path) -> Result<Self, PertsolError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, PertsolError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String, PertsolError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parameters in effect, falling back to the variant's reference calibration.
    pub fn model_params(&self) -> ModelParams {
        self.params.unwrap_or(match self.variant {
            Variant::Deterministic => ModelParams::deterministic_reference(),
            Variant::Stochastic => ModelParams::stochastic_reference(),
        })
    }

    pub fn grid_options(&self) -> GridOptions {
        self.grid
            .unwrap_or_else(|| GridOptions::for_variant(self.variant))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model_params().validate()?;
        self.grid_options().validate(self.variant)
    }
}

/// Everything produced by [`run`]
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub solution: Solution,
    pub residual: ResidualFunction,
    pub policy: PolicyFunction,
    pub grid: ResidualGrid,
}

impl PipelineOutput {
    /// Write the sampled residual as CSV.
    pub fn write_residual_csv(&self, path: &Path) -> Result<(), PertsolError> {
        let file = File::create(path)?;
        self.grid.write_csv(BufWriter::new(file))
    }

    /// Write the coefficient report as pretty JSON.
    pub fn write_summary_json(&self, path: &Path) -> Result<(), PertsolError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.solution.summary())?;
        Ok(())
    }
}

/// Validate `config`, solve the model, compile and sample its residual.
pub fn run(config: &PerturbationConfig) -> Result<PipelineOutput, PertsolError> {
    config.validate()?;
    let grid_options = config.grid_options();
    let model = GrowthModel::new(config.variant, config.model_params())?;

    let solution = solver::solve(&model)?;
    let residual = ResidualFunction::new(&solution)?;
    let policy = PolicyFunction::new(&solution)?;
    let grid = sample(&residual, &grid_options)?;

    info!(
        variant = %config.variant,
        steady_state_consumption = solution.steady_state_consumption(),
        max_abs_residual = grid.max_abs(),
        "pipeline finished"
    );

    Ok(PipelineOutput {
        solution,
        residual,
        policy,
        grid,
    })
}
