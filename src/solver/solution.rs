use serde::Serialize;

use super::table::CoefficientTable;
use crate::model::{CoefficientIndex, GrowthModel, ModelParams, Variant};
use crate::residual::Residual;
use crate::symbolic::{Expr, SymbolicError};

/// Solved policy of a growth model
#[derive(Debug, Clone)]
pub struct Solution {
    model: GrowthModel,
    residual: Residual,
    table: CoefficientTable,
}

impl Solution {
    pub(crate) fn new(model: GrowthModel, residual: Residual, table: CoefficientTable) -> Self {
        Self {
            model,
            residual,
            table,
        }
    }

    pub fn model(&self) -> &GrowthModel {
        &self.model
    }

    pub fn variant(&self) -> Variant {
        self.model.variant()
    }

    pub fn coefficients(&self) -> &CoefficientTable {
        &self.table
    }

    /// Policy polynomial with every coefficient replaced by its value.
    pub fn policy_expr(&self) -> Expr {
        self.residual.policy().xreplace(&self.table.substitution())
    }

    /// Residual of the solved policy, a function of the state variables.
    pub fn residual_expr(&self) -> Expr {
        self.residual.expr().xreplace(&self.table.substitution())
    }

    /// c(k, sigma) from the power series. `sigma` is ignored by the
    /// deterministic variant.
    pub fn policy_value_at(&self, capital: f64, variance: f64) -> f64 {
        let deviation = capital - self.model.params().kss;
        self.table
            .iter()
            .map(|(index, value)| {
                value / index.factorial_weight()
                    * deviation.powi(index.capital as i32)
                    * variance.powi(index.variance as i32)
            })
            .sum()
    }

    pub fn production_value_at(&self, capital: f64) -> f64 {
        self.model.params().production_at(capital)
    }

    /// Consumption at the steady-state capital stock and the reporting
    /// variance of the model parameters.
    pub fn steady_state_consumption(&self) -> f64 {
        let params = self.model.params();
        let variance = match self.model.variant() {
            Variant::Deterministic => 0.0,
            Variant::Stochastic => params.variance,
        };
        self.policy_value_at(params.kss, variance)
    }

    /// d^(i+j) R / dk^i dsigma^j of the solved residual at the expansion point.
    pub fn residual_derivative(&self, index: CoefficientIndex) -> Result<f64, SymbolicError> {
        let symbols = self.model.symbols();
        self.residual_expr()
            .diff_n(&symbols.variance, index.variance)
            .diff_n(&symbols.capital, index.capital)
            .eval(&self.model.expansion_point())
    }

    pub fn summary(&self) -> SolutionSummary {
        let coefficients = self
            .table
            .iter()
            .map(|(index, value)| CoefficientEntry {
                capital: index.capital,
                variance: index.variance,
                derivative: value,
                power_series: value / index.factorial_weight(),
            })
            .collect();
        SolutionSummary {
            variant: self.variant(),
            params: *self.model.params(),
            steady_state_consumption: self.steady_state_consumption(),
            coefficients,
        }
    }
}

/// Serializable report of a solution
#[derive(Debug, Clone, Serialize)]
pub struct SolutionSummary {
    pub variant: Variant,
    pub params: ModelParams,
    pub steady_state_consumption: f64,
    pub coefficients: Vec<CoefficientEntry>,
}

/// One solved coefficient, as derivative a[i,j] and as power-series
/// coefficient a[i,j] / (i! j!)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoefficientEntry {
    pub capital: usize,
    pub variance: usize,
    pub derivative: f64,
    pub power_series: f64,
}

#[cfg(test)]
mod tests {
    use crate::model::{CoefficientIndex, GrowthModel, ModelParams};
    use crate::solver::solve;
    use crate::symbolic::Bindings;

    #[test]
    fn closed_form_matches_substituted_policy() {
        let model = GrowthModel::deterministic(ModelParams::default().with_order(3)).unwrap();
        let solution = solve(&model).unwrap();
        let policy = solution.policy_expr();
        let mut point = Bindings::new();
        for k in [0.5, 1.0, 1.7] {
            point.insert(model.symbols().capital.clone(), k);
            let symbolic = policy.eval(&point).unwrap();
            assert!((symbolic - solution.policy_value_at(k, 0.0)).abs() < 1e-12);
        }
        assert!((solution.steady_state_consumption() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn summary_lists_every_coefficient() {
        let model = GrowthModel::deterministic(ModelParams::default().with_order(2)).unwrap();
        let solution = solve(&model).unwrap();
        let summary = solution.summary();
        assert_eq!(summary.coefficients.len(), 3);
        let second = summary.coefficients[2];
        assert_eq!((second.capital, second.variance), (2, 0));
        assert!((second.power_series - second.derivative / 2.0).abs() < 1e-15);
        let a2 = solution.coefficients().get(CoefficientIndex::new(2, 0)).unwrap();
        assert_eq!(second.derivative, a2);
    }
}
