use crate::domain::ModitError;
use crate::numerics::{alternating_signs, log_grid, relative_gap};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WavenumberGridError {
    #[error("wavenumber grid needs at least 2 points, got {count}")]
    TooFewPoints { count: usize },
    #[error("wavenumber grid bounds must be finite, positive and increasing, got [{start}, {end}]")]
    InvalidBounds { start: f64, end: f64 },
    #[error("wavenumber grid point {index} must be finite, positive and above its predecessor, got {value}")]
    NotAscending { index: usize, value: f64 },
    #[error(
        "wavenumber grid is not log-uniform: step {index} is {actual}, expected {expected} (relative tolerance {tolerance})"
    )]
    NotLogUniform {
        index: usize,
        expected: f64,
        actual: f64,
        tolerance: f64,
    },
}

impl From<WavenumberGridError> for ModitError {
    fn from(error: WavenumberGridError) -> Self {
        ModitError::input_validation("INPUT.WAVENUMBER_GRID", error.to_string())
    }
}

/// Units accepted for grid bounds and wavelength export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum SpectralUnit {
    #[default]
    #[serde(rename = "cm-1")]
    Wavenumber,
    #[serde(rename = "AA")]
    Angstrom,
    #[serde(rename = "nm")]
    Nanometer,
    #[serde(rename = "um")]
    Micrometer,
}

impl SpectralUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wavenumber => "cm-1",
            Self::Angstrom => "AA",
            Self::Nanometer => "nm",
            Self::Micrometer => "um",
        }
    }

    pub const fn is_wavelength(self) -> bool {
        !matches!(self, Self::Wavenumber)
    }

    /// Converts a value in this unit to cm^-1. The mapping is its own inverse,
    /// so it also converts cm^-1 back to this unit.
    pub fn to_wavenumber(self, value: f64) -> f64 {
        match self {
            Self::Wavenumber => value,
            Self::Angstrom => 1.0e8 / value,
            Self::Nanometer => 1.0e7 / value,
            Self::Micrometer => 1.0e4 / value,
        }
    }
}

impl Display for SpectralUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Ascending wavenumber grid (cm^-1), uniform in `ln(nu)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WavenumberGrid {
    values: Vec<f64>,
    log_step: f64,
    signs: Arc<[f64]>,
}

impl WavenumberGrid {
    pub fn log_uniform(start: f64, end: f64, count: usize) -> Result<Self, WavenumberGridError> {
        if count < 2 {
            return Err(WavenumberGridError::TooFewPoints { count });
        }
        if !start.is_finite() || !end.is_finite() || !(start > 0.0) || !(end > start) {
            return Err(WavenumberGridError::InvalidBounds { start, end });
        }
        let values =
            log_grid(start, end, count).ok_or(WavenumberGridError::InvalidBounds { start, end })?;
        Ok(Self::from_validated(values))
    }

    /// Grid between two bounds given in `unit`; wavelength bounds may come in
    /// either order and are converted to ascending wavenumber.
    pub fn from_spectral_range(
        start: f64,
        end: f64,
        count: usize,
        unit: SpectralUnit,
    ) -> Result<Self, WavenumberGridError> {
        if !(start > 0.0) || !(end > 0.0) {
            return Err(WavenumberGridError::InvalidBounds { start, end });
        }
        let first = unit.to_wavenumber(start);
        let second = unit.to_wavenumber(end);
        Self::log_uniform(first.min(second), first.max(second), count)
    }

    /// Adopts caller-supplied points after checking they are log-uniform to
    /// within `tolerance` (relative, per step).
    pub fn from_points(points: Vec<f64>, tolerance: f64) -> Result<Self, WavenumberGridError> {
        if points.len() < 2 {
            return Err(WavenumberGridError::TooFewPoints {
                count: points.len(),
            });
        }
        for (index, &value) in points.iter().enumerate() {
            let ascending = index == 0 || value > points[index - 1];
            if !value.is_finite() || value <= 0.0 || !ascending {
                return Err(WavenumberGridError::NotAscending { index, value });
            }
        }

        let expected = mean_log_step(&points);
        for (index, window) in points.windows(2).enumerate() {
            let actual = (window[1] / window[0]).ln();
            if relative_gap(actual, expected) > tolerance {
                return Err(WavenumberGridError::NotLogUniform {
                    index,
                    expected,
                    actual,
                    tolerance,
                });
            }
        }

        Ok(Self::from_validated(points))
    }

    fn from_validated(values: Vec<f64>) -> Self {
        let log_step = mean_log_step(&values);
        let signs = alternating_signs(values.len() + 1).into();
        Self {
            values,
            log_step,
            signs,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// `ln(nu_{i+1} / nu_i)`.
    pub fn log_step(&self) -> f64 {
        self.log_step
    }

    /// Spectral resolution `R = 1 / log_step = (N - 1) / ln(nu_max / nu_min)`.
    pub fn resolution(&self) -> f64 {
        1.0 / self.log_step
    }

    /// Checkerboard of length `N + 1` shared by every index built on this grid.
    pub fn alternating_signs(&self) -> Arc<[f64]> {
        Arc::clone(&self.signs)
    }

    pub fn wavelengths(&self, unit: SpectralUnit) -> Vec<f64> {
        self.values
            .iter()
            .map(|value| unit.to_wavenumber(*value))
            .collect()
    }

    pub fn contains(&self, wavenumber: f64) -> bool {
        wavenumber >= self.first() && wavenumber <= self.last()
    }
}

fn mean_log_step(values: &[f64]) -> f64 {
    (values[values.len() - 1] / values[0]).ln() / (values.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::{SpectralUnit, WavenumberGrid, WavenumberGridError};

    #[test]
    fn log_uniform_grid_has_constant_ratio_and_expected_resolution() {
        let grid = WavenumberGrid::log_uniform(4000.0, 4100.0, 1001).expect("grid");
        assert_eq!(grid.len(), 1001);
        assert_eq!(grid.first(), 4000.0);
        assert_eq!(grid.last(), 4100.0);

        let expected_resolution = 1000.0 / (4100.0_f64 / 4000.0).ln();
        assert!((grid.resolution() - expected_resolution).abs() < 1.0e-6 * expected_resolution);
        for window in grid.values().windows(2) {
            assert!(((window[1] / window[0]).ln() - grid.log_step()).abs() < 1.0e-12);
        }
        assert_eq!(grid.alternating_signs().len(), 1002);
    }

    #[test]
    fn wavelength_bounds_are_converted_to_ascending_wavenumber() {
        let grid = WavenumberGrid::from_spectral_range(22_900.0, 23_000.0, 100, SpectralUnit::Angstrom)
            .expect("grid");
        assert!((grid.first() - 1.0e8 / 23_000.0).abs() < 1.0e-9);
        assert!((grid.last() - 1.0e8 / 22_900.0).abs() < 1.0e-9);

        let wavelengths = grid.wavelengths(SpectralUnit::Micrometer);
        assert!((wavelengths[0] - 2.3).abs() < 1.0e-12);
        assert!(wavelengths[0] > wavelengths[99]);
    }

    #[test]
    fn grid_rejects_degenerate_bounds() {
        assert_eq!(
            WavenumberGrid::log_uniform(4000.0, 4000.0, 10),
            Err(WavenumberGridError::InvalidBounds {
                start: 4000.0,
                end: 4000.0
            })
        );
        assert_eq!(
            WavenumberGrid::log_uniform(4000.0, 4100.0, 1),
            Err(WavenumberGridError::TooFewPoints { count: 1 })
        );
    }

    #[test]
    fn caller_points_must_be_log_uniform() {
        let points = WavenumberGrid::log_uniform(1000.0, 1200.0, 50)
            .expect("grid")
            .values()
            .to_vec();
        assert!(WavenumberGrid::from_points(points, 1.0e-9).is_ok());

        let linear: Vec<f64> = (0..50).map(|index| 1000.0 + 4.0 * index as f64).collect();
        assert!(matches!(
            WavenumberGrid::from_points(linear, 1.0e-9),
            Err(WavenumberGridError::NotLogUniform { index: 0, .. })
        ));

        assert!(matches!(
            WavenumberGrid::from_points(vec![1000.0, 999.0, 1001.0], 1.0e-9),
            Err(WavenumberGridError::NotAscending { index: 1, .. })
        ));
    }

    #[test]
    fn spectral_units_serialize_with_conventional_labels() {
        let unit: SpectralUnit = serde_json::from_str("\"cm-1\"").expect("unit");
        assert_eq!(unit, SpectralUnit::Wavenumber);
        assert_eq!(
            serde_json::to_string(&SpectralUnit::Nanometer).expect("serialize"),
            "\"nm\""
        );
    }
}
