use std::fmt;

use serde::{Deserialize, Serialize};

use crate::symbolic::{Expr, Symbol};

/// Index of a Taylor coefficient: powers of (k - kss) and of sigma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoefficientIndex {
    pub capital: usize,
    pub variance: usize,
}

impl CoefficientIndex {
    pub fn new(capital: usize, variance: usize) -> Self {
        Self { capital, variance }
    }

    pub fn total_order(&self) -> usize {
        self.capital + self.variance
    }

    /// The symbol standing for this coefficient in expressions.
    pub fn symbol(&self) -> Symbol {
        Symbol::new(&self.to_string())
    }

    /// capital! * variance!
    pub fn factorial_weight(&self) -> f64 {
        factorial(self.capital) * factorial(self.variance)
    }
}

impl fmt::Display for CoefficientIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a[{},{}]", self.capital, self.variance)
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|i| i as f64).product()
}

/// Shape of the set of coefficients in a truncated expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    /// a[i,0] for i = 0..=order
    Column { order: usize },
    /// a[i,j] for i + j <= order
    Triangle { order: usize },
}

impl Expansion {
    pub fn order(&self) -> usize {
        match self {
            Expansion::Column { order } | Expansion::Triangle { order } => *order,
        }
    }

    pub fn contains(&self, index: CoefficientIndex) -> bool {
        match self {
            Expansion::Column { order } => index.variance == 0 && index.capital <= *order,
            Expansion::Triangle { order } => index.total_order() <= *order,
        }
    }

    /// All indices, in the order in which they are solved.
    ///
    /// The capital column a[0,0], a[1,0], .. comes first; the triangle then
    /// continues row by row in the variance power m, ascending in the
    /// capital power within each row.
    pub fn solve_order(&self) -> Vec<CoefficientIndex> {
        let order = self.order();
        let mut indices: Vec<CoefficientIndex> =
            (0..=order).map(|i| CoefficientIndex::new(i, 0)).collect();
        if let Expansion::Triangle { .. } = self {
            for m in 1..=order {
                for j in 0..=order - m {
                    indices.push(CoefficientIndex::new(j, m));
                }
            }
        }
        indices
    }

    pub fn len(&self) -> usize {
        let order = self.order();
        match self {
            Expansion::Column { .. } => order + 1,
            Expansion::Triangle { .. } => (order + 1) * (order + 2) / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncated Taylor polynomial with one symbolic coefficient per index:
    ///
    /// sum over (i, j) of a[i,j] / (i! j!) * (k - kss)^i * sigma^j
    pub fn taylor_polynomial(&self, capital: &Symbol, variance: &Symbol, kss: f64) -> Expr {
        let deviation = Expr::symbol(capital) - kss;
        let sigma = Expr::symbol(variance);
        Expr::sum(
            self.solve_order()
                .into_iter()
                .map(|index| {
                    Expr::product([
                        Expr::constant(1.0 / index.factorial_weight()),
                        Expr::symbol(&index.symbol()),
                        deviation.powi(index.capital as i32),
                        sigma.powi(index.variance as i32),
                    ])
                })
                .collect::<Vec<_>>(),
        )
    }
}
