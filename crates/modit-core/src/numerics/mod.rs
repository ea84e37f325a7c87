pub mod fft;
pub mod voigt;

pub use fft::{ConvolutionPlan, alternating_signs};
pub use voigt::{faddeeva_humlicek, voigt_profile};

/// Neumaier-compensated sum; exact for cancelling large terms that would
/// swallow small ones.
pub fn stable_sum(values: &[f64]) -> f64 {
    let (sum, compensation) = values.iter().fold((0.0_f64, 0.0_f64), |(sum, lost), &value| {
        let next = sum + value;
        let lost = if sum.abs() >= value.abs() {
            lost + ((sum - next) + value)
        } else {
            lost + ((value - next) + sum)
        };
        (next, lost)
    });
    sum + compensation
}

/// Inclusive geometric grid; the endpoints are stored exactly.
pub fn log_grid(start: f64, end: f64, count: usize) -> Option<Vec<f64>> {
    if count < 2 || !(start > 0.0) || !(end > 0.0) {
        return None;
    }

    let log_start = start.ln();
    let step = (end.ln() - log_start) / ((count - 1) as f64);
    let mut grid = Vec::with_capacity(count);
    for index in 0..count {
        grid.push((log_start + step * (index as f64)).exp());
    }

    grid[0] = start;
    if let Some(last) = grid.last_mut() {
        *last = end;
    }

    Some(grid)
}

/// Linear interpolation clamped to the first/last sample outside the grid.
pub fn interpolate_linear(x: f64, x_grid: &[f64], y_grid: &[f64]) -> Option<f64> {
    if x_grid.len() < 2 || x_grid.len() != y_grid.len() {
        return None;
    }

    if !x_grid.windows(2).all(|window| window[0] <= window[1]) {
        return None;
    }

    if x <= x_grid[0] {
        return Some(y_grid[0]);
    }

    let last_index = x_grid.len() - 1;
    if x >= x_grid[last_index] {
        return Some(y_grid[last_index]);
    }

    let upper = x_grid.partition_point(|sample| *sample < x);
    let lower = upper - 1;
    let x0 = x_grid[lower];
    let x1 = x_grid[upper];
    if x1 == x0 {
        return Some(y_grid[upper]);
    }

    let interpolation = (x - x0) / (x1 - x0);
    Some(y_grid[lower] + interpolation * (y_grid[upper] - y_grid[lower]))
}

/// `|actual - expected|` relative to the larger magnitude; zero when both are zero.
pub fn relative_gap(actual: f64, expected: f64) -> f64 {
    let scale = actual.abs().max(expected.abs());
    if scale == 0.0 {
        return 0.0;
    }
    (actual - expected).abs() / scale
}

#[cfg(test)]
mod tests {
    use super::{interpolate_linear, log_grid, relative_gap, stable_sum};

    #[test]
    fn stable_sum_keeps_small_terms_between_cancelling_large_ones() {
        assert_eq!(stable_sum(&[1.0e16, 1.0, -1.0e16]), 1.0);
        assert_eq!(stable_sum(&[1.0, 1.0e100, 1.0, -1.0e100]), 2.0);
        assert_eq!(stable_sum(&[]), 0.0);
    }

    #[test]
    fn log_grid_is_geometric_and_inclusive() {
        assert_eq!(log_grid(1.0, 100.0, 1), None);
        assert_eq!(log_grid(0.0, 100.0, 3), None);

        let grid = log_grid(1.0, 100.0, 3).expect("grid");
        assert_eq!(grid[0], 1.0);
        assert!((grid[1] - 10.0).abs() < 1.0e-12);
        assert_eq!(grid[2], 100.0);
    }

    #[test]
    fn interpolate_linear_clamps_and_interpolates() {
        let x_grid = [0.0, 1.0, 2.0];
        let y_grid = [10.0, 20.0, 30.0];

        assert_eq!(interpolate_linear(-1.0, &x_grid, &y_grid), Some(10.0));
        assert_eq!(interpolate_linear(3.0, &x_grid, &y_grid), Some(30.0));
        assert_eq!(interpolate_linear(0.5, &x_grid, &y_grid), Some(15.0));
        assert_eq!(interpolate_linear(1.0, &x_grid, &y_grid), Some(20.0));
    }

    #[test]
    fn interpolate_linear_rejects_invalid_grids() {
        assert_eq!(interpolate_linear(0.5, &[0.0], &[1.0]), None);
        assert_eq!(interpolate_linear(0.5, &[0.0, 1.0], &[1.0]), None);
        assert_eq!(
            interpolate_linear(0.5, &[0.0, 2.0, 1.0], &[0.0, 2.0, 1.0]),
            None
        );
    }

    #[test]
    fn relative_gap_scales_by_the_larger_magnitude() {
        assert!((relative_gap(4050.0, 4050.5) - 0.5 / 4050.5).abs() < 1.0e-15);
        assert_eq!(relative_gap(0.0, 1.0e-10), 1.0);
        assert_eq!(relative_gap(2.0, 2.0), 0.0);
        assert_eq!(relative_gap(0.0, 0.0), 0.0);
    }
}
