//! Control law gains
//!
//! u = -K1·sig(g, α) - K2·sig(g, β) - Kₛ·sign(g)  [+ K_d·d(t)]
//!
//! α < 1 dominates near equilibrium, β > 1 dominates far from it; together
//! they bound the settling time independently of the initial error.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Gains and exponents of the fixed-time control law
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlGains {
    /// Gain on the sub-linear term
    pub k1: f64,
    /// Gain on the super-linear term
    pub k2: f64,
    /// Sub-linear exponent, 0 < α < 1
    pub alpha: f64,
    /// Super-linear exponent, β > 1
    pub beta: f64,
    /// Switching (sign) term gain
    pub k_sign: f64,
}

impl Default for ControlGains {
    fn default() -> Self {
        Self {
            k1: 0.10,
            k2: 0.10,
            alpha: 0.5,
            beta: 1.5,
            k_sign: 0.01,
        }
    }
}

impl ControlGains {
    /// Check gain positivity and exponent ranges
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let positive = [("k1", self.k1), ("k2", self.k2), ("k_sign", self.k_sign)];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigurationError::InvalidGains(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigurationError::InvalidGains(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.beta > 1.0 && self.beta.is_finite()) {
            return Err(ConfigurationError::InvalidGains(format!(
                "beta must be greater than 1, got {}",
                self.beta
            )));
        }
        Ok(())
    }
}

/// Whether the control law injects the bounded synthetic disturbance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DisturbanceMode {
    /// Plain distributed law
    #[default]
    None,
    /// Robust variant: adds gain·disturbance(2N, t) to the command
    Bounded {
        /// Disturbance gain K_d, independent of the sign-term gain
        gain: f64,
    },
}

impl DisturbanceMode {
    /// Default robust variant gain
    pub const DEFAULT_GAIN: f64 = 0.01;

    /// Robust variant with the default gain
    pub fn bounded() -> Self {
        DisturbanceMode::Bounded {
            gain: Self::DEFAULT_GAIN,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            DisturbanceMode::None => Ok(()),
            DisturbanceMode::Bounded { gain } if gain >= 0.0 && gain.is_finite() => Ok(()),
            DisturbanceMode::Bounded { gain } => Err(ConfigurationError::InvalidGains(format!(
                "disturbance gain must be non-negative and finite, got {gain}"
            ))),
        }
    }
}
