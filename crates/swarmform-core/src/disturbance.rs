//! Bounded synthetic disturbance
//!
//! Deterministic perturbation used to exercise disturbance rejection of the
//! control law. Every channel is bounded in magnitude by a = 0.99/√n, so the
//! Euclidean norm of the first n channels never exceeds 0.99:
//!
//! ‖d(n, t)‖² ≤ n·a² = 0.9801 < 1

use std::f64::consts::PI;

use nalgebra::DVector;

use crate::error::{ConfigurationError, FormationError};

/// Number of channels in the basis table
pub const MAX_DISTURBANCE_CHANNELS: usize = 18;

/// Scale numerator keeping the combined norm below one
const AMPLITUDE: f64 = 0.99;

/// One basis signal of the disturbance table
#[derive(Debug, Clone, Copy, PartialEq)]
enum Basis {
    /// Constant offset
    Constant,
    /// sin(t + k·π/10)
    Sin(u8),
    /// cos(t + k·π/10)
    Cos(u8),
}

impl Basis {
    fn eval(self, t: f64) -> f64 {
        match self {
            Basis::Constant => 1.0,
            Basis::Sin(k) => (t + f64::from(k) * PI / 10.0).sin(),
            Basis::Cos(k) => (t + f64::from(k) * PI / 10.0).cos(),
        }
    }
}

const TABLE: [Basis; MAX_DISTURBANCE_CHANNELS] = [
    Basis::Constant,
    Basis::Sin(1),
    Basis::Cos(2),
    Basis::Constant,
    Basis::Sin(3),
    Basis::Sin(3),
    Basis::Constant,
    Basis::Sin(4),
    Basis::Cos(5),
    Basis::Constant,
    Basis::Sin(6),
    Basis::Sin(6),
    Basis::Constant,
    Basis::Sin(7),
    Basis::Cos(8),
    Basis::Constant,
    Basis::Sin(9),
    Basis::Sin(9),
];

/// Evaluate the first `n` disturbance channels at time `t`
///
/// # Errors
/// - [`ConfigurationError::DisturbanceChannels`] if `n` exceeds the table
/// - [`FormationError::InvariantViolation`] if the norm bound fails
pub fn disturbance(n: usize, t: f64) -> Result<DVector<f64>, FormationError> {
    if n > MAX_DISTURBANCE_CHANNELS {
        return Err(ConfigurationError::DisturbanceChannels {
            requested: n,
            max: MAX_DISTURBANCE_CHANNELS,
        }
        .into());
    }
    if n == 0 {
        return Ok(DVector::zeros(0));
    }

    let a = AMPLITUDE / (n as f64).sqrt();
    let d = DVector::from_iterator(n, TABLE[..n].iter().map(|basis| a * basis.eval(t)));

    let norm = d.norm();
    if !(norm < 1.0) {
        return Err(FormationError::InvariantViolation(format!(
            "disturbance norm {norm} exceeds unit bound for {n} channels at t={t}"
        )));
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_norm_bounded_for_all_sizes() {
        for n in 1..=MAX_DISTURBANCE_CHANNELS {
            for step in 0..2000 {
                let t = -50.0 + step as f64 * 0.05;
                let d = disturbance(n, t).unwrap();
                assert_eq!(d.len(), n);
                assert!(d.norm() < 1.0, "n={n} t={t} norm={}", d.norm());
            }
        }
    }

    #[test]
    fn test_too_many_channels_is_configuration_error() {
        let err = disturbance(MAX_DISTURBANCE_CHANNELS + 1, 0.0).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            FormationError::Configuration(ConfigurationError::DisturbanceChannels {
                requested: 19,
                max: 18
            })
        ));
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(disturbance(0, 3.0).unwrap().len(), 0);
    }

    #[test]
    fn test_table_values_at_zero() {
        let n = 4;
        let a = 0.99 / 2.0;
        let d = disturbance(n, 0.0).unwrap();

        assert_relative_eq!(d[0], a, epsilon = 1e-12);
        assert_relative_eq!(d[1], a * (PI / 10.0).sin(), epsilon = 1e-12);
        assert_relative_eq!(d[2], a * (2.0 * PI / 10.0).cos(), epsilon = 1e-12);
        assert_relative_eq!(d[3], a, epsilon = 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let d1 = disturbance(12, 7.25).unwrap();
        let d2 = disturbance(12, 7.25).unwrap();
        assert_eq!(d1, d2);
    }
}
