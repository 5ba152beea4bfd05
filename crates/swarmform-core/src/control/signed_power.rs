//! Signed fractional powers
//!
//! sig(x, p) = sign(x)·|x|^p
//!
//! For 0 < p < 1 the derivative is unbounded at zero while the value stays
//! continuous with sig(0, p) = 0. The zero case is part of the law and is
//! not smoothed.

use nalgebra::DVector;

/// Sign with sign(0) = 0
///
/// `f64::signum` returns ±1 for ±0.0, which would keep the switching term
/// active at equilibrium.
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Scalar signed power sign(x)·|x|^p
#[inline]
pub fn sig(x: f64, p: f64) -> f64 {
    sign(x) * x.abs().powf(p)
}

/// Elementwise signed power
pub fn sig_vec(v: &DVector<f64>, p: f64) -> DVector<f64> {
    v.map(|x| sig(x, p))
}

/// Elementwise sign
pub fn sign_vec(v: &DVector<f64>) -> DVector<f64> {
    v.map(sign)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sig_zero() {
        for p in [0.1, 0.5, 1.0, 1.5, 3.0] {
            assert_eq!(sig(0.0, p), 0.0);
            assert_eq!(sig(-0.0, p), 0.0);
        }
    }

    #[test]
    fn test_sig_is_odd() {
        for x in [1e-6, 0.3, 1.0, 2.5, 40.0] {
            for p in [0.5, 1.5] {
                assert_eq!(sig(-x, p), -sig(x, p));
            }
        }
    }

    #[test]
    fn test_sig_values() {
        assert_relative_eq!(sig(4.0, 0.5), 2.0, epsilon = 1e-12);
        assert_relative_eq!(sig(-4.0, 1.5), -8.0, epsilon = 1e-12);
        assert_relative_eq!(sig(0.25, 1.0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_sign_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(1e-300), 1.0);
        assert_eq!(sign(-2.0), -1.0);
    }

    #[test]
    fn test_vector_forms() {
        let v = DVector::from_vec(vec![-9.0, 0.0, 4.0]);
        assert_eq!(sig_vec(&v, 0.5).as_slice(), &[-3.0, 0.0, 2.0]);
        assert_eq!(sign_vec(&v).as_slice(), &[-1.0, 0.0, 1.0]);
    }
}
