//! Model definition
//!
//! A [`GrowthModel`] fixes the analytic forms of production and utility,
//! binds numeric values to every parameter, and declares the symbols of the
//! state variables and the unknown policy coefficients.
//!
//! | Quantity | Form |
//! |----------|------|
//! | Production | f(k) = (rho / alpha) k^alpha |
//! | Utility | u(c) = c^(1 + gamma) / (1 + gamma) |
//! | Policy | sum of a[i,j] / (i! j!) (k - kss)^i sigma^j |
//!
//! The deterministic variant expands in k only ([`Expansion::Column`]); the
//! stochastic variant expands jointly in k and the shock variance sigma
//! ([`Expansion::Triangle`]).

mod error;
mod expansion;
mod params;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::symbolic::{Bindings, Expr, Symbol};

pub use error::ConfigError;
pub use expansion::{CoefficientIndex, Expansion};
pub use params::ModelParams;

/// Which instantiation of the model is solved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Expansion in capital only
    #[default]
    Deterministic,
    /// Joint expansion in capital and shock variance
    Stochastic,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Deterministic => write!(f, "deterministic"),
            Variant::Stochastic => write!(f, "stochastic"),
        }
    }
}

/// Symbols of the state and control variables
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSymbols {
    /// Capital stock k
    pub capital: Symbol,
    /// Shock variance sigma
    pub variance: Symbol,
    /// Consumption c, the argument of the utility function
    pub consumption: Symbol,
}

impl Default for ModelSymbols {
    fn default() -> Self {
        Self {
            capital: Symbol::new("k"),
            variance: Symbol::new("sigma"),
            consumption: Symbol::new("c"),
        }
    }
}

/// A fully parameterized growth model
#[derive(Debug, Clone)]
pub struct GrowthModel {
    variant: Variant,
    params: ModelParams,
    symbols: ModelSymbols,
}

impl GrowthModel {
    /// Validate `params` and declare the model.
    pub fn new(variant: Variant, params: ModelParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            variant,
            params,
            symbols: ModelSymbols::default(),
        })
    }

    pub fn deterministic(params: ModelParams) -> Result<Self, ConfigError> {
        Self::new(Variant::Deterministic, params)
    }

    pub fn stochastic(params: ModelParams) -> Result<Self, ConfigError> {
        Self::new(Variant::Stochastic, params)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn symbols(&self) -> &ModelSymbols {
        &self.symbols
    }

    pub fn capital(&self) -> Expr {
        Expr::symbol(&self.symbols.capital)
    }

    pub fn variance(&self) -> Expr {
        Expr::symbol(&self.symbols.variance)
    }

    /// f(k) = (rho / alpha) k^alpha
    pub fn production(&self) -> Expr {
        self.capital()
            .powf(self.params.alpha)
            .scale(self.params.rho / self.params.alpha)
    }

    /// u(c) = c^(1 + gamma) / (1 + gamma)
    pub fn utility(&self) -> Expr {
        let exponent = 1.0 + self.params.gamma;
        Expr::symbol(&self.symbols.consumption)
            .powf(exponent)
            .scale(1.0 / exponent)
    }

    pub fn expansion(&self) -> Expansion {
        let order = self.params.order;
        match self.variant {
            Variant::Deterministic => Expansion::Column { order },
            Variant::Stochastic => Expansion::Triangle { order },
        }
    }

    /// Candidate policy c(k) or c(k, sigma) with symbolic coefficients.
    pub fn policy(&self) -> Expr {
        self.expansion().taylor_polynomial(
            &self.symbols.capital,
            &self.symbols.variance,
            self.params.kss,
        )
    }

    /// State variables, in the argument order of compiled functions.
    pub fn state_symbols(&self) -> Vec<Symbol> {
        match self.variant {
            Variant::Deterministic => vec![self.symbols.capital.clone()],
            Variant::Stochastic => vec![
                self.symbols.capital.clone(),
                self.symbols.variance.clone(),
            ],
        }
    }

    /// The expansion point k = kss, sigma = 0.
    pub fn expansion_point(&self) -> Bindings {
        let mut point = Bindings::new();
        point.insert(self.symbols.capital.clone(), self.params.kss);
        point.insert(self.symbols.variance.clone(), 0.0);
        point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameters_are_rejected_on_construction() {
        let params = ModelParams::default().with_alpha(1.5);
        assert!(GrowthModel::deterministic(params).is_err());
    }

    #[test]
    fn production_matches_closed_form() {
        let model = GrowthModel::deterministic(ModelParams::default()).unwrap();
        let mut point = model.expansion_point();
        point.insert(model.symbols().capital.clone(), 2.0);
        let value = model.production().eval(&point).unwrap();
        assert!((value - model.params().production_at(2.0)).abs() < 1e-15);
    }

    #[test]
    fn utility_marginal_is_power_of_consumption() {
        let model = GrowthModel::stochastic(ModelParams::stochastic_reference()).unwrap();
        let c = &model.symbols().consumption;
        let mut point = Bindings::new();
        point.insert(c.clone(), 0.5);
        // u'(c) = c^gamma
        let marginal = model.utility().diff(c).eval(&point).unwrap();
        assert!((marginal - 0.5_f64.powf(-10.0)).abs() < 1e-9);
    }

    #[test]
    fn policy_size_follows_variant() {
        let det = GrowthModel::deterministic(ModelParams::default().with_order(3)).unwrap();
        let sto = GrowthModel::stochastic(ModelParams::default().with_order(3)).unwrap();
        let det_symbols = det.policy().free_symbols();
        let sto_symbols = sto.policy().free_symbols();
        // 4 coefficients + k
        assert_eq!(det_symbols.len(), 5);
        // 10 coefficients + k + sigma
        assert_eq!(sto_symbols.len(), 12);
        assert_eq!(det.state_symbols().len(), 1);
        assert_eq!(sto.state_symbols().len(), 2);
    }
}
