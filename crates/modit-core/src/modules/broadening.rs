//! Broadening-parameter grids.
//!
//! Each layer gets a grid of normalized Lorentz widths, uniform in `log10`,
//! that brackets every contributing line's width. Lines are later split between
//! the two grid points that bracket them with weights linear in `log10`.

use crate::domain::{ModitError, ModitResult};
use faer::Mat;
use serde::{Deserialize, Serialize};

/// Widths below this are raised to it before taking logarithms.
pub const MINIMUM_NORMALIZED_WIDTH: f64 = 1.0e-12;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BroadeningGridError {
    #[error("broadening grid resolution must be finite and > 0, got {0}")]
    InvalidResolution(f64),
    #[error("broadening grid margin must be finite and >= 0, got {0}")]
    InvalidMargin(f64),
    #[error("normalized width of line {line} must be finite and >= 0, got {value}")]
    InvalidWidth { line: usize, value: f64 },
    #[error("{what} shape mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    ShapeMismatch {
        what: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
}

impl From<BroadeningGridError> for ModitError {
    fn from(error: BroadeningGridError) -> Self {
        ModitError::input_validation("INPUT.BROADENING_GRID", error.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BroadeningGridPolicy {
    /// Target spacing in `log10(width)`.
    pub resolution: f64,
    /// Padding added below the minimum and above the maximum, in `log10`.
    pub margin: f64,
    /// Shrink the spacing so the grid ends exactly at the padded maximum.
    pub adopt: bool,
    /// Give every layer the length of the longest layer grid.
    pub shared_length: bool,
}

impl Default for BroadeningGridPolicy {
    fn default() -> Self {
        Self {
            resolution: 0.2,
            margin: 1.0e-10,
            adopt: true,
            shared_length: false,
        }
    }
}

impl BroadeningGridPolicy {
    pub fn validate(&self) -> Result<(), BroadeningGridError> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(BroadeningGridError::InvalidResolution(self.resolution));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(BroadeningGridError::InvalidMargin(self.margin));
        }
        Ok(())
    }

    fn natural_length(&self, span: f64) -> usize {
        if self.adopt {
            (span / self.resolution) as usize + 2
        } else {
            ((span / self.resolution).ceil() as usize + 1).max(2)
        }
    }
}

/// Ascending broadening grid with cached `log10` values.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadeningGrid {
    values: Vec<f64>,
    log_values: Vec<f64>,
}

impl BroadeningGrid {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, point: usize) -> f64 {
        self.values[point]
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Lower bracketing point and the `log10`-linear weight of the next point.
    pub fn bracket(&self, width: f64) -> (usize, f64) {
        let log_width = width.max(MINIMUM_NORMALIZED_WIDTH).log10();
        let last_lower = self.log_values.len() - 2;
        let lower = self
            .log_values
            .partition_point(|value| *value <= log_width)
            .saturating_sub(1)
            .min(last_lower);
        let span = self.log_values[lower + 1] - self.log_values[lower];
        let weight = if span > 0.0 {
            ((log_width - self.log_values[lower]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (lower, weight)
    }

    fn from_log_values(log_values: Vec<f64>, min_width: f64, max_width: f64) -> Self {
        let mut values: Vec<f64> = log_values.iter().map(|value| 10f64.powf(*value)).collect();
        let last = values.len() - 1;
        values[0] = values[0].min(min_width);
        values[last] = values[last].max(max_width);
        let log_values = values.iter().map(|value| value.log10()).collect();
        Self { values, log_values }
    }
}

/// Padded `log10` range of a set of widths.
fn padded_log_range(widths: &[f64], margin: f64) -> Result<Option<(f64, f64)>, BroadeningGridError> {
    let mut range: Option<(f64, f64)> = None;
    for (line, &value) in widths.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(BroadeningGridError::InvalidWidth { line, value });
        }
        let value = value.max(MINIMUM_NORMALIZED_WIDTH);
        range = Some(match range {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }
    Ok(range.map(|(min, max)| (min.log10() - margin, max.log10() + margin)))
}

fn grid_over_range(
    log_min: f64,
    log_max: f64,
    length: usize,
    policy: &BroadeningGridPolicy,
) -> Vec<f64> {
    let span = log_max - log_min;
    let step = if policy.adopt && span > 0.0 {
        span / (length - 1) as f64
    } else {
        policy.resolution
    };
    (0..length)
        .map(|point| log_min + step * point as f64)
        .collect()
}

/// Broadening grid covering `widths`; `None` when there are no widths.
pub fn build_broadening_grid(
    widths: &[f64],
    policy: &BroadeningGridPolicy,
) -> Result<Option<BroadeningGrid>, BroadeningGridError> {
    policy.validate()?;
    let Some((log_min, log_max)) = padded_log_range(widths, policy.margin)? else {
        return Ok(None);
    };
    let length = policy.natural_length(log_max - log_min);
    Ok(Some(grid_from_range(log_min, log_max, length, policy)))
}

fn grid_from_range(
    log_min: f64,
    log_max: f64,
    length: usize,
    policy: &BroadeningGridPolicy,
) -> BroadeningGrid {
    let log_values = grid_over_range(log_min, log_max, length, policy);
    BroadeningGrid::from_log_values(
        log_values,
        10f64.powf(log_min + policy.margin),
        10f64.powf(log_max - policy.margin),
    )
}

/// Per-layer inputs: `[layer x line]` normalized Lorentz widths and strengths.
/// Only lines with a positive strength in a layer shape that layer's grid.
#[derive(Debug, Clone, Copy)]
pub struct BroadeningGridInput<'a> {
    pub normalized_widths: &'a Mat<f64>,
    pub line_strengths: &'a Mat<f64>,
}

impl<'a> BroadeningGridInput<'a> {
    pub fn new(normalized_widths: &'a Mat<f64>, line_strengths: &'a Mat<f64>) -> Self {
        Self {
            normalized_widths,
            line_strengths,
        }
    }

    fn validate(&self) -> Result<(), BroadeningGridError> {
        let (rows, cols) = (self.line_strengths.nrows(), self.line_strengths.ncols());
        if self.normalized_widths.nrows() != rows || self.normalized_widths.ncols() != cols {
            return Err(BroadeningGridError::ShapeMismatch {
                what: "normalized width matrix",
                expected_rows: rows,
                expected_cols: cols,
                rows: self.normalized_widths.nrows(),
                cols: self.normalized_widths.ncols(),
            });
        }
        Ok(())
    }

    fn contributing_widths(&self, layer: usize) -> Vec<f64> {
        (0..self.line_strengths.ncols())
            .filter(|line| self.line_strengths[(layer, *line)] > 0.0)
            .map(|line| self.normalized_widths[(layer, line)])
            .collect()
    }
}

/// One grid per layer; layers without contributing lines get `None`.
pub fn build_layer_broadening_grids(
    input: BroadeningGridInput<'_>,
    policy: &BroadeningGridPolicy,
) -> ModitResult<Vec<Option<BroadeningGrid>>> {
    input.validate()?;
    policy.validate()?;

    let mut ranges = Vec::with_capacity(input.line_strengths.nrows());
    for layer in 0..input.line_strengths.nrows() {
        let widths = input.contributing_widths(layer);
        ranges.push(padded_log_range(&widths, policy.margin)?);
    }

    let shared = if policy.shared_length {
        ranges
            .iter()
            .flatten()
            .map(|(min, max)| policy.natural_length(max - min))
            .max()
    } else {
        None
    };

    let grids: Vec<Option<BroadeningGrid>> = ranges
        .into_iter()
        .map(|range| {
            range.map(|(log_min, log_max)| {
                let length = shared.unwrap_or_else(|| policy.natural_length(log_max - log_min));
                grid_from_range(log_min, log_max, length, policy)
            })
        })
        .collect();

    tracing::debug!(
        layers = grids.len(),
        empty_layers = grids.iter().filter(|grid| grid.is_none()).count(),
        max_points = grids.iter().flatten().map(BroadeningGrid::len).max().unwrap_or(0),
        shared_length = policy.shared_length,
        "built broadening grids"
    );
    Ok(grids)
}
