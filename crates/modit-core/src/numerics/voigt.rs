//! Voigt line shape through the Faddeeva function.
//!
//! The Faddeeva function uses the four-region Humlicek (1982) rational
//! approximation, accurate to roughly 1e-4 relative over the upper half plane.

use num_complex::Complex64;
use std::f64::consts::{PI, SQRT_2};

const FAR_REGION: f64 = 15.0;
const MID_REGION: f64 = 5.5;

/// Faddeeva function `w(x + iy)` for `y >= 0`.
pub fn faddeeva_humlicek(x: f64, y: f64) -> Complex64 {
    let t = Complex64::new(y, -x);
    let s = x.abs() + y;

    if s >= FAR_REGION {
        return t * 0.564_189_6 / (t * t + 0.5);
    }

    if s >= MID_REGION {
        let u = t * t;
        return t * (u * 0.564_189_6 + 1.410_474) / (u * (u + 3.0) + 0.75);
    }

    if y >= 0.195 * x.abs() - 0.176 {
        let numerator =
            t * (t * (t * (t * 0.564_223_6 + 3.778_987) + 11.964_82) + 20.209_33) + 16.495_5;
        let denominator = t
            * (t * (t * (t * (t + 6.699_398) + 21.692_74) + 39.271_21) + 38.823_63)
            + 16.495_5;
        return numerator / denominator;
    }

    let u = t * t;
    let numerator = horner_alternating(
        u,
        &[36_183.31, 3_321.990_5, 1_540.787, 219.031_3, 35.766_83, 1.320_522, 0.564_19],
    );
    let denominator = horner_alternating(
        u,
        &[32_066.6, 24_322.84, 9_022.228, 2_186.181, 364.219_1, 61.570_37, 1.841_439, 1.0],
    );
    u.exp() - t * numerator / denominator
}

/// Evaluates `c0 - u (c1 - u (c2 - ...))`.
fn horner_alternating(u: Complex64, coefficients: &[f64]) -> Complex64 {
    coefficients
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &coefficient| {
            Complex64::new(coefficient, 0.0) - u * acc
        })
}

/// Area-normalized Voigt profile at offset `x` from line center.
///
/// `sigma` is the Gaussian standard deviation and `gamma` the Lorentzian
/// half-width at half-maximum, both in the units of `x`.
pub fn voigt_profile(x: f64, sigma: f64, gamma: f64) -> f64 {
    let scale = sigma * SQRT_2;
    let value = faddeeva_humlicek(x / scale, gamma / scale).re / (sigma * (2.0 * PI).sqrt());
    value.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::{faddeeva_humlicek, voigt_profile};
    use std::f64::consts::PI;

    #[test]
    fn faddeeva_is_unity_at_origin() {
        let value = faddeeva_humlicek(0.0, 0.0);
        assert!((value.re - 1.0).abs() < 1.0e-6);
        assert!(value.im.abs() < 1.0e-6);
    }

    #[test]
    fn voigt_reduces_to_gaussian_for_vanishing_lorentz_width() {
        let sigma: f64 = 1.7;
        for x in [0.0, 0.5, 1.7, 3.0] {
            let expected = (-0.5 * (x / sigma) * (x / sigma)).exp() / (sigma * (2.0 * PI).sqrt());
            let actual = voigt_profile(x, sigma, 1.0e-9);
            assert!(
                (actual - expected).abs() <= 1.0e-3 * expected.max(1.0e-3),
                "x={x}: expected {expected}, got {actual}"
            );
        }
    }

    #[test]
    fn voigt_reduces_to_lorentzian_for_narrow_gaussian() {
        let gamma = 2.0;
        for x in [0.0, 1.0, 5.0, 20.0] {
            let expected = gamma / (PI * (x * x + gamma * gamma));
            let actual = voigt_profile(x, 1.0e-3, gamma);
            assert!(
                (actual - expected).abs() <= 1.0e-3 * expected,
                "x={x}: expected {expected}, got {actual}"
            );
        }
    }

    #[test]
    fn voigt_profile_has_unit_area_and_is_symmetric() {
        let sigma = 1.3;
        let gamma = 0.4;
        let step = 0.01;
        let half_span: f64 = 4_000.0;
        let count = (2.0 * half_span / step) as usize;
        let area: f64 = (0..=count)
            .map(|index| voigt_profile(-half_span + step * index as f64, sigma, gamma) * step)
            .sum();

        assert!((area - 1.0).abs() < 2.0e-3, "area was {area}");
        let left = voigt_profile(-2.5, sigma, gamma);
        let right = voigt_profile(2.5, sigma, gamma);
        assert!((left - right).abs() <= 1.0e-15 * right);
    }
}
