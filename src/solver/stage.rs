use std::fmt;

use tracing::warn;

use super::error::SolveError;
use super::EQUATION_CONTEXT;
use crate::model::CoefficientIndex;
use crate::symbolic::{Expr, Solutions};

/// Solving rule applied to a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStage {
    /// a[0,0], pinned by c(kss) = f(kss)
    ZerothOrder,
    /// a[1,0], quadratic; the unique positive root is taken
    FirstOrder,
    /// Every other coefficient; the equation must be linear
    HigherOrder,
}

impl SolveStage {
    pub fn of(index: CoefficientIndex) -> Self {
        match (index.capital, index.variance) {
            (0, 0) => SolveStage::ZerothOrder,
            (1, 0) => SolveStage::FirstOrder,
            _ => SolveStage::HigherOrder,
        }
    }

    /// Highest degree the equation may have in its unknown.
    pub fn max_degree(&self) -> usize {
        match self {
            SolveStage::FirstOrder => 2,
            SolveStage::ZerothOrder | SolveStage::HigherOrder => 1,
        }
    }

    /// Pick the value of `index` among `solutions`.
    pub fn select(
        &self,
        index: CoefficientIndex,
        solutions: &Solutions,
        equation: &Expr,
    ) -> Result<f64, SolveError> {
        let unsolvable = |reason: String| SolveError::Unsolvable {
            index,
            reason,
            equation: equation.truncated(EQUATION_CONTEXT),
        };

        let roots = match solutions {
            Solutions::Everything => {
                return Err(unsolvable(
                    "every value satisfies the equation".to_string(),
                ))
            }
            Solutions::Roots(roots) => roots,
        };

        match self {
            SolveStage::FirstOrder => {
                let positive: Vec<f64> = roots.iter().copied().filter(|r| *r > 0.0).collect();
                match positive.as_slice() {
                    [root] => {
                        if roots.len() > 1 {
                            warn!(%index, ?roots, selected = root, "discarding non-positive roots");
                        }
                        Ok(*root)
                    }
                    [] => Err(unsolvable(format!(
                        "no positive root among {roots:?}; the policy must increase with capital"
                    ))),
                    _ => Err(unsolvable(format!(
                        "several positive roots {positive:?} and no rule to choose between them"
                    ))),
                }
            }
            SolveStage::ZerothOrder | SolveStage::HigherOrder => match roots.as_slice() {
                [root] => Ok(*root),
                [] => Err(unsolvable("no real root".to_string())),
                _ => Err(unsolvable(format!(
                    "several roots {roots:?} and no rule to choose between them"
                ))),
            },
        }
    }
}

impl fmt::Display for SolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStage::ZerothOrder => write!(f, "zeroth-order"),
            SolveStage::FirstOrder => write!(f, "first-order"),
            SolveStage::HigherOrder => write!(f, "higher-order"),
        }
    }
}
