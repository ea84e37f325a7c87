use super::grid::WavenumberGrid;
use crate::domain::ModitError;
use std::sync::Arc;

/// Slack, in grid steps, for centers that round just past an end point.
const EDGE_SLACK: f64 = 1.0e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WavenumberIndexError {
    #[error(
        "line {line} center {center} cm^-1 lies outside the wavenumber grid [{first}, {last}] cm^-1"
    )]
    OutOfRange {
        line: usize,
        center: f64,
        first: f64,
        last: f64,
    },
}

impl From<WavenumberIndexError> for ModitError {
    fn from(error: WavenumberIndexError) -> Self {
        ModitError::input_validation("INPUT.LINE_OUTSIDE_GRID", error.to_string())
    }
}

/// Continuous grid position of each line center, split into a lower neighbor
/// and the linear weight of the next neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct WavenumberIndex {
    grid_len: usize,
    positions: Vec<f64>,
    lower: Vec<usize>,
    upper_weights: Vec<f64>,
    signs: Arc<[f64]>,
}

impl WavenumberIndex {
    pub fn from_lines(
        grid: &WavenumberGrid,
        centers: &[f64],
    ) -> Result<Self, WavenumberIndexError> {
        let origin = grid.first();
        let log_step = grid.log_step();
        let last_position = (grid.len() - 1) as f64;
        let last_lower = grid.len() - 2;

        let mut positions = Vec::with_capacity(centers.len());
        let mut lower = Vec::with_capacity(centers.len());
        let mut upper_weights = Vec::with_capacity(centers.len());
        for (line, &center) in centers.iter().enumerate() {
            let position = (center / origin).ln() / log_step;
            if !position.is_finite()
                || position < -EDGE_SLACK
                || position > last_position + EDGE_SLACK
            {
                return Err(WavenumberIndexError::OutOfRange {
                    line,
                    center,
                    first: grid.first(),
                    last: grid.last(),
                });
            }

            let position = position.clamp(0.0, last_position);
            let floor = (position.floor() as usize).min(last_lower);
            positions.push(position);
            lower.push(floor);
            upper_weights.push((position - floor as f64).clamp(0.0, 1.0));
        }

        Ok(Self {
            grid_len: grid.len(),
            positions,
            lower,
            upper_weights,
            signs: grid.alternating_signs(),
        })
    }

    pub fn line_count(&self) -> usize {
        self.positions.len()
    }

    pub fn grid_len(&self) -> usize {
        self.grid_len
    }

    pub fn position(&self, line: usize) -> f64 {
        self.positions[line]
    }

    pub fn lower_index(&self, line: usize) -> usize {
        self.lower[line]
    }

    pub fn upper_weight(&self, line: usize) -> f64 {
        self.upper_weights[line]
    }

    pub fn lower_weight(&self, line: usize) -> f64 {
        1.0 - self.upper_weights[line]
    }

    /// Checkerboard of length `grid_len + 1` applied to half-spectra.
    pub fn signs(&self) -> &[f64] {
        &self.signs
    }
}
