use std::collections::HashMap;

use super::expr::{Expr, Node, Symbol};

/// Symbol-to-expression replacement map.
pub type Substitution = HashMap<Symbol, Expr>;

/// Symbol-to-value map.
pub type Bindings = HashMap<Symbol, f64>;

impl Expr {
    /// Exact replacement of symbol leaves.
    ///
    /// Only symbols listed in `map` are touched; no pattern matching on larger
    /// subexpressions takes place. Rebuilt nodes go through the simplifying
    /// constructors, so substituting numbers folds constants on the way up.
    pub fn xreplace(&self, map: &Substitution) -> Expr {
        if map.is_empty() {
            return self.clone();
        }
        let mut memo = HashMap::new();
        replace(self, map, &mut memo)
    }

    /// Replace symbols by numeric values.
    pub fn subs(&self, values: &Bindings) -> Expr {
        let map: Substitution = values
            .iter()
            .map(|(symbol, value)| (symbol.clone(), Expr::constant(*value)))
            .collect();
        self.xreplace(&map)
    }

    /// Replace a single symbol by a numeric value.
    pub fn subs_one(&self, symbol: &Symbol, value: f64) -> Expr {
        let mut map = Substitution::new();
        map.insert(symbol.clone(), Expr::constant(value));
        self.xreplace(&map)
    }
}

fn replace(expr: &Expr, map: &Substitution, memo: &mut HashMap<*const Node, Expr>) -> Expr {
    if let Some(done) = memo.get(&expr.id()) {
        return done.clone();
    }

    let replaced = match expr.node() {
        Node::Const(_) => expr.clone(),
        Node::Symbol(s) => map.get(s).cloned().unwrap_or_else(|| expr.clone()),
        Node::Add(terms) => {
            let new_terms: Vec<Expr> = terms.iter().map(|t| replace(t, map, memo)).collect();
            if unchanged(terms, &new_terms) {
                expr.clone()
            } else {
                Expr::sum(new_terms)
            }
        }
        Node::Mul(factors) => {
            let new_factors: Vec<Expr> = factors.iter().map(|f| replace(f, map, memo)).collect();
            if unchanged(factors, &new_factors) {
                expr.clone()
            } else {
                Expr::product(new_factors)
            }
        }
        Node::Pow(base, exponent) => {
            let new_base = replace(base, map, memo);
            if new_base.same_node(base) {
                expr.clone()
            } else {
                new_base.powf(*exponent)
            }
        }
    };

    memo.insert(expr.id(), replaced.clone());
    replaced
}

fn unchanged(old: &[Expr], new: &[Expr]) -> bool {
    old.iter().zip(new).all(|(a, b)| a.same_node(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_substitution_folds_to_constant() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let e = Expr::symbol(&x) * Expr::symbol(&y) + 1.0;
        let mut values = Bindings::new();
        values.insert(x.clone(), 2.0);
        values.insert(y.clone(), 3.0);
        assert_eq!(e.subs(&values).as_const(), Some(7.0));
    }

    #[test]
    fn partial_substitution_keeps_other_symbols() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let e = Expr::symbol(&x) * Expr::symbol(&y);
        let reduced = e.subs_one(&x, 0.0);
        assert!(reduced.is_zero());
        let reduced = e.subs_one(&x, 2.0);
        assert!(reduced.contains(&y));
        assert!(!reduced.contains(&x));
    }

    #[test]
    fn replacement_by_expression_is_literal() {
        let c = Symbol::new("c");
        let k = Symbol::new("k");
        let u = Expr::symbol(&c).powi(2);
        let mut map = Substitution::new();
        map.insert(c.clone(), Expr::symbol(&k) + 1.0);
        let replaced = u.xreplace(&map);
        let mut values = Bindings::new();
        values.insert(k.clone(), 2.0);
        assert_eq!(replaced.eval(&values).unwrap(), 9.0);
    }

    #[test]
    fn untouched_expressions_keep_identity() {
        let x = Symbol::new("x");
        let e = Expr::symbol(&x).powi(3) + 2.0;
        let same = e.subs_one(&Symbol::new("z"), 1.0);
        assert!(same.same_node(&e));
    }
}
