use std::collections::HashMap;

use super::expr::{Expr, Node, Symbol};

impl Expr {
    /// Partial derivative with respect to `var`.
    ///
    /// Shared subexpressions are differentiated once per call.
    pub fn diff(&self, var: &Symbol) -> Expr {
        let mut memo = HashMap::new();
        differentiate(self, var, &mut memo)
    }

    /// `n`-th partial derivative with respect to `var`.
    pub fn diff_n(&self, var: &Symbol, n: usize) -> Expr {
        (0..n).fold(self.clone(), |expr, _| expr.diff(var))
    }
}

fn differentiate(expr: &Expr, var: &Symbol, memo: &mut HashMap<*const Node, Expr>) -> Expr {
    if let Some(done) = memo.get(&expr.id()) {
        return done.clone();
    }

    let derivative = match expr.node() {
        Node::Const(_) => Expr::zero(),
        Node::Symbol(s) => {
            if s == var {
                Expr::one()
            } else {
                Expr::zero()
            }
        }
        Node::Add(terms) => {
            let parts: Vec<Expr> = terms
                .iter()
                .map(|t| differentiate(t, var, memo))
                .collect();
            Expr::sum(parts)
        }
        Node::Mul(factors) => {
            let mut terms = Vec::with_capacity(factors.len());
            for (i, factor) in factors.iter().enumerate() {
                let d = differentiate(factor, var, memo);
                if d.is_zero() {
                    continue;
                }
                let parts: Vec<Expr> = factors
                    .iter()
                    .enumerate()
                    .map(|(j, g)| if i == j { d.clone() } else { g.clone() })
                    .collect();
                terms.push(Expr::product(parts));
            }
            Expr::sum(terms)
        }
        Node::Pow(base, exponent) => {
            let d = differentiate(base, var, memo);
            if d.is_zero() {
                Expr::zero()
            } else {
                Expr::product([Expr::constant(*exponent), base.powf(exponent - 1.0), d])
            }
        }
    };

    memo.insert(expr.id(), derivative.clone());
    derivative
}
