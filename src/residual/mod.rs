//! Residual equation builder
//!
//! Builds the first-order condition an optimal policy must satisfy, as an
//! expression in the candidate policy and its derivatives:
//!
//! - deterministic:
//!   `-rho c - gamma c c' + gamma f c' + c f'`
//! - stochastic:
//!   `U1 (f' - rho) + c_k (f - c + 2 sigma k) + sigma k^2 (U2 c_k^2 + c_kk)`
//!   with `U1 = u'/u''` and `U2 = u'''/u''` evaluated at c.
//!
//! The residual vanishes identically for the exact policy. It is never solved
//! in closed form; the solver drives it to zero order by order.

use crate::model::{GrowthModel, Variant};
use crate::symbolic::{Expr, Substitution};

/// Residual of the optimality condition for a candidate policy
#[derive(Debug, Clone)]
pub struct Residual {
    expr: Expr,
    policy: Expr,
}

impl Residual {
    /// Residual of `model` with its symbolic Taylor policy.
    pub fn build(model: &GrowthModel) -> Self {
        Self::for_policy(model, model.policy())
    }

    /// Residual of `model` for an arbitrary candidate `policy`.
    pub fn for_policy(model: &GrowthModel, policy: Expr) -> Self {
        let expr = match model.variant() {
            Variant::Deterministic => deterministic_residual(model, &policy),
            Variant::Stochastic => stochastic_residual(model, &policy),
        };
        Self { expr, policy }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn policy(&self) -> &Expr {
        &self.policy
    }
}

/// `-rho c - gamma c c' + gamma f c' + c f'`
fn deterministic_residual(model: &GrowthModel, c: &Expr) -> Expr {
    let p = model.params();
    let k = &model.symbols().capital;
    let f = model.production();
    let f_k = f.diff(k);
    let c_k = c.diff(k);

    Expr::sum([
        c.scale(-p.rho),
        Expr::product([Expr::constant(-p.gamma), c.clone(), c_k.clone()]),
        Expr::product([Expr::constant(p.gamma), f, c_k]),
        c * &f_k,
    ])
}

/// `U1 (f' - rho) + c_k (f - c + 2 sigma k) + sigma k^2 (U2 c_k^2 + c_kk)`
fn stochastic_residual(model: &GrowthModel, c: &Expr) -> Expr {
    let p = model.params();
    let symbols = model.symbols();
    let k = model.capital();
    let sigma = model.variance();
    let f = model.production();
    let f_k = f.diff(&symbols.capital);
    let c_k = c.diff(&symbols.capital);
    let c_kk = c_k.diff(&symbols.capital);

    let (u1, u2) = marginal_utility_ratios(model);
    let mut at_policy = Substitution::new();
    at_policy.insert(symbols.consumption.clone(), c.clone());
    let u1 = u1.xreplace(&at_policy);
    let u2 = u2.xreplace(&at_policy);

    let drift = Expr::sum([
        f.clone(),
        -c,
        Expr::product([Expr::constant(2.0), sigma.clone(), k.clone()]),
    ]);
    let diffusion = Expr::product([
        sigma,
        k.powi(2),
        Expr::sum([&u2 * &c_k.powi(2), c_kk]),
    ]);

    Expr::sum([u1 * (f_k - p.rho), &c_k * &drift, diffusion])
}

/// `(u'/u'', u'''/u'')` as expressions in the consumption symbol.
///
/// For CRRA utility these reduce to `c / gamma` and `(gamma - 1) / c`.
pub fn marginal_utility_ratios(model: &GrowthModel) -> (Expr, Expr) {
    let c = &model.symbols().consumption;
    let u = model.utility();
    let u_c = u.diff(c);
    let u_cc = u_c.diff(c);
    let u_ccc = u_cc.diff(c);
    (&u_c / &u_cc, &u_ccc / &u_cc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelParams;
    use crate::symbolic::{Bindings, Symbol};

    #[test]
    fn utility_ratios_reduce_for_crra() {
        let model = GrowthModel::stochastic(ModelParams::stochastic_reference()).unwrap();
        let (u1, u2) = marginal_utility_ratios(&model);
        let c = model.symbols().consumption.clone();
        let mut point = Bindings::new();
        point.insert(c.clone(), 0.7);
        assert!((u1.eval(&point).unwrap() - 0.7 / -10.0).abs() < 1e-14);
        assert!((u2.eval(&point).unwrap() - (-11.0 / 0.7)).abs() < 1e-12);
        // Powers of c collapse to a single factor
        assert_eq!(u1.free_symbols().len(), 1);
        assert!(u1.node_count() <= 3, "U1 not reduced: {}", u1);
    }

    #[test]
    fn stochastic_residual_at_zero_variance_is_scaled_deterministic() {
        let params = ModelParams::default().with_order(3);
        let det = GrowthModel::deterministic(params).unwrap();
        let sto = GrowthModel::stochastic(params).unwrap();

        // Identical candidate policy in k only: 0.2 + 0.06 (k - 1) - 0.1 (k - 1)^2
        let k = Symbol::new("k");
        let d = Expr::symbol(&k) - 1.0;
        let policy = 0.2 + d.scale(0.06) + d.powi(2).scale(-0.1);

        let r_det = Residual::for_policy(&det, policy.clone());
        let r_sto = Residual::for_policy(&sto, policy);

        let mut point = sto.expansion_point();
        for kv in [0.7, 1.0, 1.3] {
            point.insert(k.clone(), kv);
            let a = r_det.expr().eval(&point).unwrap();
            let b = r_sto.expr().eval(&point).unwrap();
            // gamma * stochastic residual equals the deterministic residual
            assert!((a - params.gamma * b).abs() < 1e-12, "k = {kv}: {a} vs {b}");
        }
    }

    #[test]
    fn exact_steady_state_policy_zeroes_level_residual() {
        let model = GrowthModel::deterministic(ModelParams::default()).unwrap();
        // c = f(kss) constant: residual at kss is c (f'(kss) - rho) = 0
        let residual = Residual::for_policy(&model, Expr::constant(0.2));
        let value = residual.expr().eval(&model.expansion_point()).unwrap();
        assert!(value.abs() < 1e-15);
    }
}
