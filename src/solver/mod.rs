//! Perturbation coefficient solver
//!
//! Drives the residual to zero order by order at the expansion point
//! (k = kss, sigma = 0).
//!
//! 1. a[0,0] from the equilibrium condition c(kss) = f(kss).
//! 2. The capital column: differentiate the residual once more in k,
//!    evaluate at the expansion point, solve for a[i,0], substitute. The
//!    unknown a[i+1,0] drops out because its factor gamma (f - c) vanishes
//!    at the steady state.
//! 3. Stochastic variant only, for rows m = 1..n: differentiate m times in
//!    sigma to obtain a[0,m], then sweep the capital direction for
//!    a[j,m], j = 1..n-m.
//!
//! Every equation is evaluated numerically at the expansion point before
//! solving, so the solver only ever faces a polynomial in one unknown.

mod error;
mod solution;
mod stage;
mod table;

use tracing::{debug, info};

use crate::model::{CoefficientIndex, Expansion, GrowthModel};
use crate::residual::Residual;
use crate::symbolic::{self, Bindings, Expr, Solutions, Substitution, Symbol, SymbolicError};

pub use error::SolveError;
pub use solution::{CoefficientEntry, Solution, SolutionSummary};
pub use stage::SolveStage;
pub use table::CoefficientTable;

/// Characters of an equation kept in error messages.
pub(crate) const EQUATION_CONTEXT: usize = 240;

/// Relative agreement required between the roots obtained with the
/// remaining coefficient symbols bound to 0 and to 1.
const DEPENDENCE_TOL: f64 = 1e-8;

/// Solve every coefficient of `model`'s expansion.
pub fn solve(model: &GrowthModel) -> Result<Solution, SolveError> {
    PerturbationSolver::new(model).run()
}

/// Sequential coefficient solver for one model.
#[derive(Debug)]
pub struct PerturbationSolver<'a> {
    model: &'a GrowthModel,
    residual: Residual,
    point: Bindings,
}

impl<'a> PerturbationSolver<'a> {
    pub fn new(model: &'a GrowthModel) -> Self {
        Self {
            model,
            residual: Residual::build(model),
            point: model.expansion_point(),
        }
    }

    pub fn residual(&self) -> &Residual {
        &self.residual
    }

    pub fn run(self) -> Result<Solution, SolveError> {
        let expansion = self.model.expansion();
        info!(
            variant = %self.model.variant(),
            order = expansion.order(),
            coefficients = expansion.len(),
            "solving perturbation coefficients"
        );

        let mut table = CoefficientTable::new(expansion);
        self.solve_column(&mut table)?;
        if let Expansion::Triangle { order } = expansion {
            self.solve_rows(order, &mut table)?;
        }

        info!(solved = table.len(), "perturbation coefficients solved");
        Ok(Solution::new(self.model.clone(), self.residual, table))
    }

    fn solve_column(&self, table: &mut CoefficientTable) -> Result<(), SolveError> {
        let capital = &self.model.symbols().capital;

        let steady = CoefficientIndex::new(0, 0);
        let equilibrium = self.residual.policy() - &self.model.production();
        let value = self.solve_for(steady, &equilibrium)?;
        table.insert(steady, value)?;

        let start = self.residual.expr().xreplace(&table.substitution());
        (1..=self.model.params().order).try_fold(start, |current, i| {
            self.advance(current.diff(capital), CoefficientIndex::new(i, 0), table)
        })?;
        Ok(())
    }

    fn solve_rows(&self, order: usize, table: &mut CoefficientTable) -> Result<(), SolveError> {
        let capital = &self.model.symbols().capital;
        let variance = &self.model.symbols().variance;

        // d^(m-1) R / d sigma^(m-1) with every coefficient solved so far substituted
        let mut sigma_derivative = self.residual.expr().xreplace(&table.substitution());
        for m in 1..=order {
            let head = self.advance(
                sigma_derivative.diff(variance),
                CoefficientIndex::new(0, m),
                table,
            )?;
            (1..=order - m).try_fold(head.clone(), |current, j| {
                self.advance(current.diff(capital), CoefficientIndex::new(j, m), table)
            })?;
            debug!(row = m, "variance row solved");
            sigma_derivative = head.xreplace(&table.substitution());
        }
        Ok(())
    }

    /// Solve `derivative` for `index`, record it and substitute it back.
    fn advance(
        &self,
        derivative: Expr,
        index: CoefficientIndex,
        table: &mut CoefficientTable,
    ) -> Result<Expr, SolveError> {
        let value = self.solve_for(index, &derivative)?;
        table.insert(index, value)?;
        let mut known = Substitution::new();
        known.insert(index.symbol(), Expr::constant(value));
        Ok(derivative.xreplace(&known))
    }

    fn solve_for(&self, index: CoefficientIndex, derivative: &Expr) -> Result<f64, SolveError> {
        let stage = SolveStage::of(index);
        let equation = derivative.subs(&self.point);
        let unknown = index.symbol();
        let solutions = isolate(&equation, &unknown, index, stage.max_degree())?;
        let value = stage.select(index, &solutions, &equation)?;
        debug!(
            %index,
            %stage,
            value,
            nodes = equation.node_count(),
            "solved coefficient"
        );
        Ok(value)
    }
}

/// Solutions of `equation = 0` in `unknown` alone.
///
/// Symbols of higher-order coefficients may survive evaluation at the
/// expansion point with a factor that is zero only up to rounding. They are
/// bound to 0 and to 1 in turn, and the two solution sets must agree.
fn isolate(
    equation: &Expr,
    unknown: &Symbol,
    index: CoefficientIndex,
    max_degree: usize,
) -> Result<Solutions, SolveError> {
    let engine = |source: SymbolicError| SolveError::Engine { index, source };

    let others: Vec<Symbol> = equation
        .free_symbols()
        .into_iter()
        .filter(|s| s != unknown)
        .collect();
    if others.is_empty() {
        return symbolic::solve(equation, unknown, max_degree).map_err(engine);
    }

    let solve_with = |value: f64| {
        let bindings: Bindings = others.iter().map(|s| (s.clone(), value)).collect();
        symbolic::solve(&equation.subs(&bindings), unknown, max_degree).map_err(engine)
    };
    let at_zero = solve_with(0.0)?;
    let at_one = solve_with(1.0)?;

    if !at_zero.approx_eq(&at_one, DEPENDENCE_TOL) {
        let names: Vec<&str> = others.iter().map(|s| s.name()).collect();
        return Err(SolveError::Unsolvable {
            index,
            reason: format!("equation depends on unsolved coefficients {names:?}"),
            equation: equation.truncated(EQUATION_CONTEXT),
        });
    }
    debug!(%index, dropped = others.len(), "higher-order coefficients drop out");
    Ok(at_zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelParams;

    #[test]
    fn first_order_deterministic_solution() {
        let model = GrowthModel::deterministic(ModelParams::default().with_order(1)).unwrap();
        let solution = solve(&model).unwrap();
        let table = solution.coefficients();
        assert!(table.is_complete());
        assert!((table.get(CoefficientIndex::new(0, 0)).unwrap() - 0.2).abs() < 1e-12);
        let a1 = table.get(CoefficientIndex::new(1, 0)).unwrap();
        // Positive root of 10 a^2 - 0.5 a - 0.0075 = 0
        let expected = (0.5 + (0.25_f64 + 0.3).sqrt()) / 20.0;
        assert!((a1 - expected).abs() < 1e-10, "a1 = {a1}");
    }

    #[test]
    fn dependence_on_unsolved_symbol_is_reported() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let eq = Expr::symbol(&x) - Expr::symbol(&y);
        let result = isolate(&eq, &x, CoefficientIndex::new(2, 0), 1);
        assert!(matches!(result, Err(SolveError::Unsolvable { .. })));
    }

    #[test]
    fn negligible_dependence_is_tolerated() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let eq = Expr::symbol(&x).scale(2.0) - 1.0 + Expr::symbol(&y).scale(1e-18);
        let result = isolate(&eq, &x, CoefficientIndex::new(2, 0), 1).unwrap();
        assert!((result.roots()[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn quadratic_equation_for_higher_order_is_an_engine_error() {
        let x = Symbol::new("x");
        let eq = Expr::symbol(&x).powi(2) - 1.0;
        let result = isolate(&eq, &x, CoefficientIndex::new(3, 0), 1);
        assert!(matches!(result, Err(SolveError::Engine { .. })));
    }
}
