use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Relative tolerance of the steady-state condition f'(kss) = rho.
const STEADY_STATE_TOL: f64 = 1e-9;

/// Numeric parameters of the growth model
///
/// Production is f(k) = (rho / alpha) k^alpha and utility is
/// u(c) = c^(1 + gamma) / (1 + gamma).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Order `n` of the Taylor polynomial (>= 1)
    pub order: usize,
    /// Continuous-time discount rate
    pub rho: f64,
    /// Production elasticity of capital, in (0, 1)
    pub alpha: f64,
    /// Utility curvature; relative risk aversion is -gamma
    pub gamma: f64,
    /// Steady-state capital stock, the expansion point in k
    pub kss: f64,
    /// Shock variance at which the stochastic policy is reported
    ///
    /// The expansion point in the variance direction is always zero.
    pub variance: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::deterministic_reference()
    }
}

impl ModelParams {
    /// Reference calibration of the deterministic model (order 5)
    pub fn deterministic_reference() -> Self {
        Self {
            order: 5,
            rho: 0.05,
            alpha: 0.25,
            gamma: -10.0,
            kss: 1.0,
            variance: 0.0,
        }
    }

    /// Reference calibration of the stochastic model (order 4)
    pub fn stochastic_reference() -> Self {
        Self {
            order: 4,
            ..Self::deterministic_reference()
        }
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_kss(mut self, kss: f64) -> Self {
        self.kss = kss;
        self
    }

    pub fn with_variance(mut self, variance: f64) -> Self {
        self.variance = variance;
        self
    }

    /// f(k) = (rho / alpha) k^alpha
    pub fn production_at(&self, k: f64) -> f64 {
        self.rho / self.alpha * k.powf(self.alpha)
    }

    /// f'(k) = rho k^(alpha - 1)
    pub fn marginal_product_at(&self, k: f64) -> f64 {
        self.rho * k.powf(self.alpha - 1.0)
    }

    /// Check every parameter and the steady-state condition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order < 1 {
            return Err(ConfigError::invalid("order", self.order, "must be at least 1"));
        }
        if !self.rho.is_finite() || self.rho <= 0.0 {
            return Err(ConfigError::invalid("rho", self.rho, "must be positive"));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(ConfigError::invalid("alpha", self.alpha, "must lie in (0, 1)"));
        }
        if !self.gamma.is_finite() {
            return Err(ConfigError::invalid("gamma", self.gamma, "must be finite"));
        }
        if self.gamma == 0.0 {
            return Err(ConfigError::invalid(
                "gamma",
                self.gamma,
                "u''(c) vanishes for gamma = 0",
            ));
        }
        if self.gamma == -1.0 {
            return Err(ConfigError::invalid(
                "gamma",
                self.gamma,
                "c^(1 + gamma) / (1 + gamma) is undefined for gamma = -1",
            ));
        }
        if !self.kss.is_finite() || self.kss <= 0.0 {
            return Err(ConfigError::invalid("kss", self.kss, "must be positive"));
        }
        if !self.variance.is_finite() || self.variance < 0.0 {
            return Err(ConfigError::invalid(
                "variance",
                self.variance,
                "must be non-negative",
            ));
        }

        let marginal_product = self.marginal_product_at(self.kss);
        if (marginal_product - self.rho).abs() > STEADY_STATE_TOL * self.rho {
            return Err(ConfigError::NotSteadyState {
                kss: self.kss,
                marginal_product,
                rho: self.rho,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_parameters_are_valid() {
        assert!(ModelParams::deterministic_reference().validate().is_ok());
        assert!(ModelParams::stochastic_reference().validate().is_ok());
        assert_eq!(ModelParams::stochastic_reference().order, 4);
    }

    #[test]
    fn steady_state_output() {
        let params = ModelParams::default();
        assert!((params.production_at(1.0) - 0.2).abs() < 1e-15);
        assert!((params.marginal_product_at(1.0) - 0.05).abs() < 1e-15);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let base = ModelParams::default();
        let cases = [
            base.with_order(0),
            base.with_rho(0.0),
            base.with_alpha(1.0),
            base.with_alpha(0.0),
            base.with_gamma(0.0),
            base.with_gamma(-1.0),
            base.with_gamma(f64::NAN),
            base.with_kss(-1.0),
            base.with_variance(-0.1),
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(ConfigError::InvalidParameter { .. })),
                "{:?} should be rejected",
                params
            );
        }
    }

    #[test]
    fn rejects_capital_off_the_steady_state() {
        let params = ModelParams::default().with_kss(2.0);
        assert!(matches!(
            params.validate(),
            Err(ConfigError::NotSteadyState { .. })
        ));
    }

    #[test]
    fn deserializes_with_defaults() {
        let params: ModelParams = serde_json::from_str(r#"{ "order": 3, "gamma": -2.0 }"#).unwrap();
        assert_eq!(params.order, 3);
        assert_eq!(params.gamma, -2.0);
        assert_eq!(params.rho, 0.05);
        assert_eq!(params.kss, 1.0);
    }
}
