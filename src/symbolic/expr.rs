// Expression DAG for the symbolic engine
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::rc::Rc;

/// A named scalar variable.
///
/// Symbols compare by name, so two independently created `Symbol::new("k")`
/// refer to the same variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(Rc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub enum Node {
    Const(f64),
    Symbol(Symbol),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    /// Power with a constant exponent
    Pow(Expr, f64),
}

/// Reference-counted expression node.
///
/// Expressions are immutable. Every rewrite (differentiation, substitution)
/// returns a new expression which shares the untouched subtrees of its input,
/// so repeated derivatives form a DAG rather than a tree.
///
/// All constructors simplify locally: constants are folded, nested sums and
/// products are flattened, zero terms and unit factors are dropped, and
/// powers of the same base inside a product are merged.
#[derive(Debug, Clone)]
pub struct Expr(Rc<Node>);

impl Expr {
    pub fn constant(value: f64) -> Self {
        Expr(Rc::new(Node::Const(value)))
    }

    pub fn zero() -> Self {
        Expr::constant(0.0)
    }

    pub fn one() -> Self {
        Expr::constant(1.0)
    }

    pub fn symbol(symbol: &Symbol) -> Self {
        Expr(Rc::new(Node::Symbol(symbol.clone())))
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    /// Identity of the underlying node, used as a memoization key.
    pub(crate) fn id(&self) -> *const Node {
        Rc::as_ptr(&self.0)
    }

    pub(crate) fn same_node(&self, other: &Expr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_const(&self) -> Option<f64> {
        match self.node() {
            Node::Const(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_const() == Some(0.0)
    }

    pub fn is_one(&self) -> bool {
        self.as_const() == Some(1.0)
    }

    /// Sum of `terms`.
    pub fn sum<I>(terms: I) -> Expr
    where
        I: IntoIterator<Item = Expr>,
    {
        let mut constant = 0.0;
        let mut flat: Vec<Expr> = Vec::new();
        for term in terms {
            if let Node::Const(v) = term.node() {
                constant += v;
                continue;
            }
            if let Node::Add(inner) = term.node() {
                for t in inner {
                    match t.node() {
                        Node::Const(v) => constant += v,
                        _ => flat.push(t.clone()),
                    }
                }
                continue;
            }
            flat.push(term);
        }

        if flat.is_empty() {
            return Expr::constant(constant);
        }
        if constant == 0.0 && flat.len() == 1 {
            return flat.swap_remove(0);
        }
        if constant != 0.0 {
            flat.insert(0, Expr::constant(constant));
        }
        Expr(Rc::new(Node::Add(flat)))
    }

    /// Product of `factors`.
    pub fn product<I>(factors: I) -> Expr
    where
        I: IntoIterator<Item = Expr>,
    {
        let mut coefficient = 1.0;
        let mut powers: Vec<(Expr, f64)> = Vec::new();
        for factor in factors {
            if let Node::Mul(inner) = factor.node() {
                for f in inner {
                    absorb_factor(f, &mut coefficient, &mut powers);
                }
                continue;
            }
            absorb_factor(&factor, &mut coefficient, &mut powers);
        }

        if coefficient == 0.0 {
            return Expr::zero();
        }

        let mut factors: Vec<Expr> = powers
            .into_iter()
            .filter(|(_, exponent)| *exponent != 0.0)
            .map(|(base, exponent)| base.powf(exponent))
            .collect();

        // Merged powers may have collapsed into constants
        let mut i = 0;
        while i < factors.len() {
            if let Some(v) = factors[i].as_const() {
                coefficient *= v;
                factors.remove(i);
            } else {
                i += 1;
            }
        }

        if coefficient == 0.0 {
            return Expr::zero();
        }
        if factors.is_empty() {
            return Expr::constant(coefficient);
        }
        if coefficient == 1.0 && factors.len() == 1 {
            return factors.swap_remove(0);
        }
        if coefficient != 1.0 {
            factors.insert(0, Expr::constant(coefficient));
        }
        Expr(Rc::new(Node::Mul(factors)))
    }

    /// `self` raised to a constant power.
    pub fn powf(&self, exponent: f64) -> Expr {
        if exponent == 0.0 {
            return Expr::one();
        }
        if exponent == 1.0 {
            return self.clone();
        }
        let integral = exponent.fract() == 0.0;
        match self.node() {
            Node::Const(v) => Expr::constant(v.powf(exponent)),
            Node::Pow(base, inner) if integral => base.powf(inner * exponent),
            Node::Mul(factors) if integral => {
                Expr::product(factors.iter().map(|f| f.powf(exponent)).collect::<Vec<_>>())
            }
            _ => Expr(Rc::new(Node::Pow(self.clone(), exponent))),
        }
    }

    pub fn powi(&self, exponent: i32) -> Expr {
        self.powf(f64::from(exponent))
    }

    pub fn recip(&self) -> Expr {
        self.powf(-1.0)
    }

    pub fn scale(&self, factor: f64) -> Expr {
        Expr::product([Expr::constant(factor), self.clone()])
    }

    /// Symbols occurring in the expression.
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut seen = HashSet::new();
        let mut out = BTreeSet::new();
        collect_symbols(self, &mut seen, &mut out);
        out
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.free_symbols().contains(symbol)
    }

    /// Number of distinct nodes reachable from this expression.
    pub fn node_count(&self) -> usize {
        let mut seen = HashSet::new();
        count_nodes(self, &mut seen);
        seen.len()
    }

    /// Rendering cut to at most `max_chars` characters, for error messages.
    pub fn truncated(&self, max_chars: usize) -> String {
        let text = self.to_string();
        if text.chars().count() <= max_chars {
            text
        } else {
            let head: String = text.chars().take(max_chars).collect();
            format!("{head}...")
        }
    }
}

fn absorb_factor(factor: &Expr, coefficient: &mut f64, powers: &mut Vec<(Expr, f64)>) {
    match factor.node() {
        Node::Const(v) => *coefficient *= v,
        Node::Pow(base, exponent) => merge_power(base, *exponent, powers),
        _ => merge_power(factor, 1.0, powers),
    }
}

fn merge_power(base: &Expr, exponent: f64, powers: &mut Vec<(Expr, f64)>) {
    for (existing, total) in powers.iter_mut() {
        if same_base(existing, base) {
            *total += exponent;
            return;
        }
    }
    powers.push((base.clone(), exponent));
}

fn same_base(a: &Expr, b: &Expr) -> bool {
    if a.same_node(b) {
        return true;
    }
    match (a.node(), b.node()) {
        (Node::Symbol(x), Node::Symbol(y)) => x == y,
        _ => false,
    }
}

fn collect_symbols(expr: &Expr, seen: &mut HashSet<*const Node>, out: &mut BTreeSet<Symbol>) {
    if !seen.insert(expr.id()) {
        return;
    }
    match expr.node() {
        Node::Const(_) => {}
        Node::Symbol(s) => {
            out.insert(s.clone());
        }
        Node::Add(children) | Node::Mul(children) => {
            for child in children {
                collect_symbols(child, seen, out);
            }
        }
        Node::Pow(base, _) => collect_symbols(base, seen, out),
    }
}

fn count_nodes(expr: &Expr, seen: &mut HashSet<*const Node>) {
    if !seen.insert(expr.id()) {
        return;
    }
    match expr.node() {
        Node::Const(_) | Node::Symbol(_) => {}
        Node::Add(children) | Node::Mul(children) => {
            for child in children {
                count_nodes(child, seen);
            }
        }
        Node::Pow(base, _) => count_nodes(base, seen),
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl From<&Symbol> for Expr {
    fn from(symbol: &Symbol) -> Self {
        Expr::symbol(symbol)
    }
}

// ----------------------------------------------------------------------------
// Operators
// ----------------------------------------------------------------------------

fn add_exprs(a: Expr, b: Expr) -> Expr {
    Expr::sum([a, b])
}

fn sub_exprs(a: Expr, b: Expr) -> Expr {
    Expr::sum([a, b.scale(-1.0)])
}

fn mul_exprs(a: Expr, b: Expr) -> Expr {
    Expr::product([a, b])
}

fn div_exprs(a: Expr, b: Expr) -> Expr {
    Expr::product([a, b.recip()])
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $combine:ident) => {
        impl std::ops::$trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $combine(self, rhs)
            }
        }
        impl std::ops::$trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $combine(self.clone(), rhs.clone())
            }
        }
        impl std::ops::$trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $combine(self, Expr::constant(rhs))
            }
        }
        impl std::ops::$trait<f64> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $combine(self.clone(), Expr::constant(rhs))
            }
        }
        impl std::ops::$trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $combine(Expr::constant(self), rhs)
            }
        }
        impl std::ops::$trait<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $combine(Expr::constant(self), rhs.clone())
            }
        }
    };
}

binary_op!(Add, add, add_exprs);
binary_op!(Sub, sub, sub_exprs);
binary_op!(Mul, mul, mul_exprs);
binary_op!(Div, div, div_exprs);

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.scale(-1.0)
    }
}

impl std::ops::Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.scale(-1.0)
    }
}

// ----------------------------------------------------------------------------
// Display
// ----------------------------------------------------------------------------

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Const(v) => write!(f, "{v}"),
            Node::Symbol(s) => write!(f, "{s}"),
            Node::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
            Node::Mul(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    match factor.node() {
                        Node::Add(_) => write!(f, "({factor})")?,
                        _ => write!(f, "{factor}")?,
                    }
                }
                Ok(())
            }
            Node::Pow(base, exponent) => {
                match base.node() {
                    Node::Symbol(_) => write!(f, "{base}")?,
                    Node::Const(v) if *v >= 0.0 => write!(f, "{base}")?,
                    _ => write!(f, "({base})")?,
                }
                if *exponent >= 0.0 && exponent.fract() == 0.0 {
                    write!(f, "^{exponent}")
                } else {
                    write!(f, "^({exponent})")
                }
            }
        }
    }
}
