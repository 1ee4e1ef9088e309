use std::collections::HashMap;

use super::error::SymbolicError;
use super::expr::{Expr, Symbol};

/// Relative size below which a polynomial coefficient counts as zero.
const COEFFICIENT_TOL: f64 = 1e-10;

/// Points at which the derivative above the admitted degree must vanish.
const EXCESS_SAMPLES: [f64; 5] = [0.0, 1.0, -1.0, 2.0, -0.5];

/// Characters of an equation kept in error messages.
const EQUATION_CONTEXT: usize = 240;

/// Real solution set of `equation = 0` in one unknown.
#[derive(Debug, Clone, PartialEq)]
pub enum Solutions {
    /// Finitely many real roots, ascending. Empty when there is no real root.
    Roots(Vec<f64>),
    /// The equation holds for every value of the unknown.
    Everything,
}

impl Solutions {
    pub fn roots(&self) -> &[f64] {
        match self {
            Solutions::Roots(r) => r,
            Solutions::Everything => &[],
        }
    }

    /// Root-wise comparison with a relative tolerance.
    pub fn approx_eq(&self, other: &Solutions, rel_tol: f64) -> bool {
        match (self, other) {
            (Solutions::Everything, Solutions::Everything) => true,
            (Solutions::Roots(a), Solutions::Roots(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        (x - y).abs() <= rel_tol * x.abs().max(y.abs()).max(1.0)
                    })
            }
            _ => false,
        }
    }
}

/// Coefficients `[c0, c1, ..]` of `expr` as a polynomial in `unknown`.
///
/// `expr` must contain no symbol other than `unknown`. The coefficients are
/// read off the derivatives at zero; the `(max_degree + 1)`-th derivative
/// must vanish.
pub fn polynomial_coefficients(
    expr: &Expr,
    unknown: &Symbol,
    max_degree: usize,
) -> Result<Vec<f64>, SymbolicError> {
    let others: Vec<String> = expr
        .free_symbols()
        .into_iter()
        .filter(|s| s != unknown)
        .map(|s| s.name().to_string())
        .collect();
    if !others.is_empty() {
        return Err(SymbolicError::ExtraSymbols {
            unknown: unknown.name().to_string(),
            others,
            equation: expr.truncated(EQUATION_CONTEXT),
        });
    }

    let mut at_zero = HashMap::new();
    at_zero.insert(unknown.clone(), 0.0);

    let mut coefficients = Vec::with_capacity(max_degree + 1);
    let mut derivative = expr.clone();
    let mut factorial = 1.0;
    for degree in 0..=max_degree {
        if degree > 0 {
            derivative = derivative.diff(unknown);
            factorial *= degree as f64;
        }
        coefficients.push(derivative.eval(&at_zero)? / factorial);
    }

    // The excess derivative can vanish at zero without vanishing identically
    let excess = derivative.diff(unknown);
    if !excess.is_zero() {
        let scale = coefficients.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        let mut at = at_zero;
        for x in EXCESS_SAMPLES {
            at.insert(unknown.clone(), x);
            let value = excess.eval(&at)?;
            let bound = COEFFICIENT_TOL * scale.max(f64::MIN_POSITIVE) * x.abs().max(1.0);
            if !value.is_finite() || value.abs() > bound {
                return Err(SymbolicError::DegreeTooHigh {
                    unknown: unknown.name().to_string(),
                    max_degree,
                    equation: expr.truncated(EQUATION_CONTEXT),
                });
            }
        }
    }

    Ok(coefficients)
}

/// Real roots of the polynomial with coefficients `[c0, c1, c2, ..]`, degree <= 2.
///
/// Leading coefficients that are negligible relative to the largest
/// non-constant coefficient are dropped before solving. The constant term
/// never makes a coefficient negligible.
pub(crate) fn real_roots(coefficients: &[f64]) -> Solutions {
    let scale = coefficients
        .iter()
        .skip(1)
        .fold(0.0_f64, |m, c| m.max(c.abs()));
    if scale == 0.0 {
        return match coefficients.first() {
            Some(c0) if *c0 != 0.0 => Solutions::Roots(Vec::new()),
            _ => Solutions::Everything,
        };
    }

    let mut degree = coefficients.len() - 1;
    while degree > 1 && coefficients[degree].abs() <= COEFFICIENT_TOL * scale {
        degree -= 1;
    }

    match degree {
        1 => Solutions::Roots(vec![-coefficients[0] / coefficients[1]]),
        2 => {
            let (c, b, a) = (coefficients[0], coefficients[1], coefficients[2]);
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 {
                return Solutions::Roots(Vec::new());
            }
            // Numerically stable form of the quadratic formula
            let q = -0.5 * (b + b.signum() * discriminant.sqrt());
            let mut roots = if q == 0.0 {
                vec![0.0, 0.0]
            } else {
                vec![q / a, c / q]
            };
            roots.sort_by(|x, y| x.total_cmp(y));
            if discriminant == 0.0 {
                roots.dedup();
            }
            Solutions::Roots(roots)
        }
        _ => unreachable!("real_roots handles polynomials up to degree two"),
    }
}

/// Solve `equation = 0` for `unknown`, admitting polynomials up to `max_degree <= 2`.
pub fn solve(
    equation: &Expr,
    unknown: &Symbol,
    max_degree: usize,
) -> Result<Solutions, SymbolicError> {
    let coefficients = polynomial_coefficients(equation, unknown, max_degree.min(2))?;
    Ok(real_roots(&coefficients))
}
