use std::collections::BTreeMap;

use ndarray::{Array1, Array2};

use super::error::SolveError;
use crate::model::{CoefficientIndex, Expansion};
use crate::symbolic::{Expr, Substitution};

/// Write-once table of solved Taylor coefficients.
///
/// Keys are restricted to the indices of the truncated [`Expansion`]
/// (the column i <= n, or the triangle i + j <= n). Reading an index that
/// has not been solved is an error rather than an implicit zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    expansion: Expansion,
    values: BTreeMap<CoefficientIndex, f64>,
}

impl CoefficientTable {
    pub fn new(expansion: Expansion) -> Self {
        Self {
            expansion,
            values: BTreeMap::new(),
        }
    }

    pub fn expansion(&self) -> Expansion {
        self.expansion
    }

    /// Record the solved value of `index`.
    pub fn insert(&mut self, index: CoefficientIndex, value: f64) -> Result<(), SolveError> {
        if !self.expansion.contains(index) {
            return Err(SolveError::OutsideExpansion {
                index,
                expansion: self.expansion,
            });
        }
        if self.values.contains_key(&index) {
            return Err(SolveError::AlreadySolved { index });
        }
        self.values.insert(index, value);
        Ok(())
    }

    /// Solved value a[i,j].
    pub fn get(&self, index: CoefficientIndex) -> Result<f64, SolveError> {
        if !self.expansion.contains(index) {
            return Err(SolveError::OutsideExpansion {
                index,
                expansion: self.expansion,
            });
        }
        self.values
            .get(&index)
            .copied()
            .ok_or(SolveError::Unsolved { index })
    }

    /// Power-series coefficient a[i,j] / (i! j!).
    pub fn power_series_coefficient(&self, index: CoefficientIndex) -> Result<f64, SolveError> {
        Ok(self.get(index)? / index.factorial_weight())
    }

    pub fn is_solved(&self, index: CoefficientIndex) -> bool {
        self.values.contains_key(&index)
    }

    pub fn is_complete(&self) -> bool {
        self.values.len() == self.expansion.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Solved entries, sorted by capital power and then variance power.
    pub fn iter(&self) -> impl Iterator<Item = (CoefficientIndex, f64)> + '_ {
        self.values.iter().map(|(index, value)| (*index, *value))
    }

    /// Replacement of every solved coefficient symbol by its value.
    pub fn substitution(&self) -> Substitution {
        self.iter()
            .map(|(index, value)| (index.symbol(), Expr::constant(value)))
            .collect()
    }

    /// The solved capital column a[0,0], .., a[n,0].
    pub fn column(&self) -> Result<Array1<f64>, SolveError> {
        let order = self.expansion.order();
        let mut column = Array1::zeros(order + 1);
        for i in 0..=order {
            column[i] = self.get(CoefficientIndex::new(i, 0))?;
        }
        Ok(column)
    }

    /// Solved values as a matrix indexed by [capital power, variance power].
    ///
    /// Entries outside the expansion or not yet solved are zero.
    pub fn derivatives(&self) -> Array2<f64> {
        self.to_array(|_, value| value)
    }

    /// Power-series coefficients as a matrix indexed like [`Self::derivatives`].
    pub fn power_series(&self) -> Array2<f64> {
        self.to_array(|index, value| value / index.factorial_weight())
    }

    fn to_array(&self, f: impl Fn(CoefficientIndex, f64) -> f64) -> Array2<f64> {
        let order = self.expansion.order();
        let cols = match self.expansion {
            Expansion::Column { .. } => 1,
            Expansion::Triangle { .. } => order + 1,
        };
        let mut out = Array2::zeros((order + 1, cols));
        for (index, value) in self.iter() {
            out[[index.capital, index.variance]] = f(index, value);
        }
        out
    }
}
