use std::io::Write;

use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ResidualFunction;
use crate::error::PertsolError;
use crate::model::{ConfigError, Variant};

/// Evenly spaced points from `start` to `end`, both included
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

impl GridAxis {
    pub fn new(start: f64, end: f64, points: usize) -> Self {
        Self { start, end, points }
    }

    pub fn values(&self) -> Array1<f64> {
        Array1::linspace(self.start, self.end, self.points)
    }

    pub fn validate(&self, axis: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidGrid {
            axis: axis.to_string(),
            reason,
        };
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(invalid("bounds must be finite".to_string()));
        }
        if self.start >= self.end {
            return Err(invalid(format!(
                "start ({}) must be below end ({})",
                self.start, self.end
            )));
        }
        if self.points == 0 {
            return Err(invalid("at least one point is required".to_string()));
        }
        Ok(())
    }
}

/// Axes over which the residual is sampled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridOptions {
    pub capital: GridAxis,
    /// Only used by the stochastic variant
    pub variance: GridAxis,
}

impl GridOptions {
    /// Default grid for `variant`.
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Deterministic => Self {
                capital: GridAxis::new(0.1, 2.5, 100),
                variance: GridAxis::new(0.0, 0.001, 100),
            },
            Variant::Stochastic => Self {
                capital: GridAxis::new(0.8, 1.2, 100),
                variance: GridAxis::new(0.0, 0.001, 100),
            },
        }
    }

    pub fn with_capital(mut self, capital: GridAxis) -> Self {
        self.capital = capital;
        self
    }

    pub fn with_variance(mut self, variance: GridAxis) -> Self {
        self.variance = variance;
        self
    }

    pub fn validate(&self, variant: Variant) -> Result<(), ConfigError> {
        self.capital.validate("capital")?;
        if self.capital.start <= 0.0 {
            return Err(ConfigError::InvalidGrid {
                axis: "capital".to_string(),
                reason: format!("capital must be positive, got start = {}", self.capital.start),
            });
        }
        if variant == Variant::Stochastic {
            self.variance.validate("variance")?;
            if self.variance.start < 0.0 {
                return Err(ConfigError::InvalidGrid {
                    axis: "variance".to_string(),
                    reason: format!(
                        "variance cannot be negative, got start = {}",
                        self.variance.start
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for GridOptions {
    fn default() -> Self {
        Self::for_variant(Variant::Deterministic)
    }
}

/// Normalized residual along a capital grid
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualCurve {
    pub capital: Array1<f64>,
    pub residual: Array1<f64>,
}

/// Normalized residual over a capital x variance grid
///
/// Element `[i, j]` of every array belongs to capital point `i` and
/// variance point `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualSurface {
    pub capital: Array2<f64>,
    pub variance: Array2<f64>,
    pub residual: Array2<f64>,
}

#[derive(Serialize)]
struct CurveRow {
    capital: f64,
    residual: f64,
    log10_abs_residual: f64,
}

#[derive(Serialize)]
struct SurfaceRow {
    capital: f64,
    variance: f64,
    residual: f64,
    log10_abs_residual: f64,
}

impl ResidualCurve {
    /// log10 |residual|; exact zeros map to negative infinity.
    pub fn log_magnitude(&self) -> Array1<f64> {
        self.residual.mapv(|r| r.abs().log10())
    }

    /// Largest absolute change between neighbouring samples.
    pub fn max_adjacent_change(&self) -> f64 {
        self.residual
            .windows(2)
            .into_iter()
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f64::max)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), PertsolError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for (capital, residual) in self.capital.iter().zip(self.residual.iter()) {
            wtr.serialize(CurveRow {
                capital: *capital,
                residual: *residual,
                log10_abs_residual: residual.abs().log10(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ResidualSurface {
    pub fn log_magnitude(&self) -> Array2<f64> {
        self.residual.mapv(|r| r.abs().log10())
    }

    /// Largest absolute change between neighbours along either axis.
    pub fn max_adjacent_change(&self) -> f64 {
        let r = &self.residual;
        let along_capital = &r.slice(s![1.., ..]) - &r.slice(s![..-1, ..]);
        let along_variance = &r.slice(s![.., 1..]) - &r.slice(s![.., ..-1]);
        along_capital
            .iter()
            .chain(along_variance.iter())
            .fold(0.0_f64, |acc, d| acc.max(d.abs()))
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), PertsolError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for ((i, j), residual) in self.residual.indexed_iter() {
            wtr.serialize(SurfaceRow {
                capital: self.capital[[i, j]],
                variance: self.variance[[i, j]],
                residual: *residual,
                log10_abs_residual: residual.abs().log10(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Sampled residual, shaped by the model variant
#[derive(Debug, Clone, PartialEq)]
pub enum ResidualGrid {
    Curve(ResidualCurve),
    Surface(ResidualSurface),
}

impl ResidualGrid {
    pub fn len(&self) -> usize {
        match self {
            ResidualGrid::Curve(curve) => curve.residual.len(),
            ResidualGrid::Surface(surface) => surface.residual.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_adjacent_change(&self) -> f64 {
        match self {
            ResidualGrid::Curve(curve) => curve.max_adjacent_change(),
            ResidualGrid::Surface(surface) => surface.max_adjacent_change(),
        }
    }

    /// Largest |residual| over the grid.
    pub fn max_abs(&self) -> f64 {
        let max_abs = |acc: f64, r: &f64| acc.max(r.abs());
        match self {
            ResidualGrid::Curve(curve) => curve.residual.iter().fold(0.0, max_abs),
            ResidualGrid::Surface(surface) => surface.residual.iter().fold(0.0, max_abs),
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), PertsolError> {
        match self {
            ResidualGrid::Curve(curve) => curve.write_csv(writer),
            ResidualGrid::Surface(surface) => surface.write_csv(writer),
        }
    }
}

/// Sample `function` over `grid`.
///
/// The deterministic variant uses the capital axis only.
pub fn sample(function: &ResidualFunction, grid: &GridOptions) -> Result<ResidualGrid, PertsolError> {
    let capital = grid.capital.values();
    match function.variant {
        Variant::Deterministic => {
            let mut residual = Array1::zeros(capital.len());
            for (out, k) in residual.iter_mut().zip(capital.iter()) {
                *out = function.at(*k, 0.0)?;
            }
            info!(points = capital.len(), "sampled residual curve");
            Ok(ResidualGrid::Curve(ResidualCurve { capital, residual }))
        }
        Variant::Stochastic => {
            let variance = grid.variance.values();
            let shape = (capital.len(), variance.len());
            let mut k_mesh = Array2::zeros(shape);
            let mut s_mesh = Array2::zeros(shape);
            let mut residual = Array2::zeros(shape);
            for (i, k) in capital.iter().enumerate() {
                for (j, s) in variance.iter().enumerate() {
                    k_mesh[[i, j]] = *k;
                    s_mesh[[i, j]] = *s;
                    residual[[i, j]] = function.at(*k, *s)?;
                }
            }
            info!(
                capital_points = shape.0,
                variance_points = shape.1,
                "sampled residual surface"
            );
            Ok(ResidualGrid::Surface(ResidualSurface {
                capital: k_mesh,
                variance: s_mesh,
                residual,
            }))
        }
    }
}
