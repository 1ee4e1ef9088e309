//! Numeric evaluation of a solved policy
//!
//! The residual of the solved policy is compiled into a plain numeric
//! function of the state variables and scaled so that values are comparable
//! across calibrations:
//!
//! | Variant | Normalization |
//! |---------|---------------|
//! | Deterministic | rho c(kss) |
//! | Stochastic | rho U1(c(kss)) = rho c(kss) / gamma |
//!
//! [`grid`] samples the normalized residual over a capital grid (or a
//! capital x variance grid) and writes the samples as CSV.

pub mod grid;

use tracing::debug;

use crate::error::PertsolError;
use crate::model::{CoefficientIndex, Variant};
use crate::residual::marginal_utility_ratios;
use crate::solver::Solution;
use crate::symbolic::{lambdify, Bindings, CompiledFn, SymbolicError};

pub use grid::{sample, GridAxis, GridOptions, ResidualCurve, ResidualGrid, ResidualSurface};

/// Divisor applied to the residual of `solution`.
pub fn normalization(solution: &Solution) -> Result<f64, PertsolError> {
    let model = solution.model();
    let rho = model.params().rho;
    let a00 = solution
        .coefficients()
        .get(CoefficientIndex::new(0, 0))?;

    let value = match model.variant() {
        Variant::Deterministic => rho * a00,
        Variant::Stochastic => {
            let (u1, _) = marginal_utility_ratios(model);
            let mut at_steady_state = Bindings::new();
            at_steady_state.insert(model.symbols().consumption.clone(), a00);
            rho * u1.eval(&at_steady_state)?
        }
    };

    if !value.is_finite() || value == 0.0 {
        return Err(PertsolError::Normalization { value });
    }
    Ok(value)
}

/// Normalized residual of a solved policy, compiled for fast evaluation
#[derive(Debug, Clone)]
pub struct ResidualFunction {
    variant: Variant,
    normalization: f64,
    function: CompiledFn,
}

impl ResidualFunction {
    pub fn new(solution: &Solution) -> Result<Self, PertsolError> {
        let normalization = normalization(solution)?;
        let scaled = solution.residual_expr().scale(1.0 / normalization);
        let function = lambdify(&scaled, &solution.model().state_symbols())?;
        debug!(
            normalization,
            instructions = function.code().len(),
            "compiled residual function"
        );
        Ok(Self {
            variant: solution.variant(),
            normalization,
            function,
        })
    }

    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    /// Normalized residual at (k, sigma). `variance` is ignored by the
    /// deterministic variant.
    pub fn at(&self, capital: f64, variance: f64) -> Result<f64, SymbolicError> {
        call_state(&self.function, self.variant, capital, variance)
    }
}

/// Solved policy compiled for fast evaluation
#[derive(Debug, Clone)]
pub struct PolicyFunction {
    variant: Variant,
    function: CompiledFn,
}

impl PolicyFunction {
    pub fn new(solution: &Solution) -> Result<Self, PertsolError> {
        let function = lambdify(&solution.policy_expr(), &solution.model().state_symbols())?;
        Ok(Self {
            variant: solution.variant(),
            function,
        })
    }

    pub fn at(&self, capital: f64, variance: f64) -> Result<f64, SymbolicError> {
        call_state(&self.function, self.variant, capital, variance)
    }
}

fn call_state(
    function: &CompiledFn,
    variant: Variant,
    capital: f64,
    variance: f64,
) -> Result<f64, SymbolicError> {
    match variant {
        Variant::Deterministic => function.call(&[capital]),
        Variant::Stochastic => function.call(&[capital, variance]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GrowthModel, ModelParams};
    use crate::solver::solve;
    use approx::assert_relative_eq;

    #[test]
    fn deterministic_normalization_is_rho_c() {
        let model = GrowthModel::deterministic(ModelParams::default().with_order(2)).unwrap();
        let solution = solve(&model).unwrap();
        assert_relative_eq!(normalization(&solution).unwrap(), 0.05 * 0.2, epsilon = 1e-14);
    }

    #[test]
    fn stochastic_normalization_uses_marginal_utility_ratio() {
        let model = GrowthModel::stochastic(ModelParams::stochastic_reference().with_order(2))
            .unwrap();
        let solution = solve(&model).unwrap();
        assert_relative_eq!(
            normalization(&solution).unwrap(),
            0.05 * 0.2 / -10.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn compiled_policy_agrees_with_power_series() {
        let model = GrowthModel::stochastic(ModelParams::stochastic_reference().with_order(2))
            .unwrap();
        let solution = solve(&model).unwrap();
        let policy = PolicyFunction::new(&solution).unwrap();
        for (k, s) in [(0.9, 0.0), (1.0, 0.0005), (1.1, 0.001)] {
            assert_relative_eq!(
                policy.at(k, s).unwrap(),
                solution.policy_value_at(k, s),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn residual_vanishes_at_steady_state() {
        let model = GrowthModel::deterministic(ModelParams::default().with_order(3)).unwrap();
        let solution = solve(&model).unwrap();
        let residual = ResidualFunction::new(&solution).unwrap();
        assert!(residual.at(1.0, 0.0).unwrap().abs() < 1e-9);
    }
}
