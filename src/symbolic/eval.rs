use std::collections::HashMap;

use super::error::SymbolicError;
use super::expr::{Expr, Node};
use super::subs::Bindings;

impl Expr {
    /// Numeric value of the expression under `bindings`.
    ///
    /// Every free symbol must be bound.
    pub fn eval(&self, bindings: &Bindings) -> Result<f64, SymbolicError> {
        let mut memo = HashMap::new();
        evaluate(self, bindings, &mut memo)
    }
}

fn evaluate(
    expr: &Expr,
    bindings: &Bindings,
    memo: &mut HashMap<*const Node, f64>,
) -> Result<f64, SymbolicError> {
    if let Some(v) = memo.get(&expr.id()) {
        return Ok(*v);
    }
    let value = match expr.node() {
        Node::Const(v) => *v,
        Node::Symbol(s) => *bindings
            .get(s)
            .ok_or_else(|| SymbolicError::UnboundSymbol {
                symbol: s.name().to_string(),
            })?,
        Node::Add(terms) => {
            let mut acc = 0.0;
            for term in terms {
                acc += evaluate(term, bindings, memo)?;
            }
            acc
        }
        Node::Mul(factors) => {
            let mut acc = 1.0;
            for factor in factors {
                acc *= evaluate(factor, bindings, memo)?;
            }
            acc
        }
        Node::Pow(base, exponent) => {
            let b = evaluate(base, bindings, memo)?;
            if exponent.fract() == 0.0 && exponent.abs() <= f64::from(i32::MAX) {
                b.powi(*exponent as i32)
            } else {
                b.powf(*exponent)
            }
        }
    };
    memo.insert(expr.id(), value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::Symbol;

    #[test]
    fn unbound_symbol_is_reported() {
        let x = Symbol::new("x");
        let e = Expr::symbol(&x) + 1.0;
        let err = e.eval(&Bindings::new()).unwrap_err();
        assert!(matches!(err, SymbolicError::UnboundSymbol { ref symbol } if symbol == "x"));
    }

    #[test]
    fn integer_powers_of_negative_bases() {
        let x = Symbol::new("x");
        let e = Expr::symbol(&x).powi(-3);
        let mut values = Bindings::new();
        values.insert(x, -2.0);
        assert_eq!(e.eval(&values).unwrap(), -0.125);
    }
}
