//! Physical constants shared by the line-parameter and profile kernels (CGS units).
//!
//! Line strengths are tabulated at [`REFERENCE_TEMPERATURE`]; every temperature
//! scaling in the crate goes through these values instead of local literals.

pub const PI: f64 = std::f64::consts::PI;
/// Reference temperature of tabulated line strengths and broadening coefficients (K).
pub const REFERENCE_TEMPERATURE: f64 = 296.0;
/// Second radiation constant hc/k_B (cm K).
pub const HC_OVER_KB: f64 = 1.438_777_353_827_720_2;
/// Speed of light (cm/s).
pub const SPEED_OF_LIGHT: f64 = 2.997_924_58e10;
/// Boltzmann constant (erg/K).
pub const BOLTZMANN: f64 = 1.380_649e-16;
/// Atomic mass unit (g).
pub const ATOMIC_MASS_UNIT: f64 = 1.660_539_066_60e-24;
/// Natural broadening half-width per Einstein A coefficient, 1/(4 pi c) (cm^-1 s).
pub const NATURAL_BROADENING_PER_EINSTEIN_A: f64 = 1.0 / (4.0 * PI * SPEED_OF_LIGHT);
/// Default reference pressure-broadening half-width (cm^-1 bar^-1).
pub const DEFAULT_REFERENCE_BROADENING: f64 = 0.07;
/// Default temperature exponent of pressure broadening.
pub const DEFAULT_TEMPERATURE_EXPONENT: f64 = 0.5;

#[cfg(test)]
mod tests {
    use super::{
        ATOMIC_MASS_UNIT, BOLTZMANN, HC_OVER_KB, NATURAL_BROADENING_PER_EINSTEIN_A,
        REFERENCE_TEMPERATURE, SPEED_OF_LIGHT,
    };

    #[test]
    fn natural_broadening_coefficient_matches_tabulated_value() {
        assert!((NATURAL_BROADENING_PER_EINSTEIN_A - 2.654_418_8e-12).abs() <= 1.0e-18);
    }

    #[test]
    fn physics_constants_remain_finite_and_positive() {
        for value in [
            REFERENCE_TEMPERATURE,
            HC_OVER_KB,
            SPEED_OF_LIGHT,
            BOLTZMANN,
            ATOMIC_MASS_UNIT,
        ] {
            assert!(value.is_finite());
            assert!(value > 0.0);
        }
    }
}
