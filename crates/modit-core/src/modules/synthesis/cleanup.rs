use crate::domain::{ModitError, ModitResult};
use faer::Mat;
use serde::{Deserialize, Serialize};

/// How negative FFT round-off in the cross-section matrix is treated.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NegativeValuePolicy {
    /// Largest tolerated `|negative value| / matrix max` before it counts as
    /// a correctness fault instead of round-off.
    pub relative_tolerance: f64,
    pub fail_on_fault: bool,
}

impl Default for NegativeValuePolicy {
    fn default() -> Self {
        Self {
            relative_tolerance: 1.0e3 * f64::EPSILON,
            fail_on_fault: false,
        }
    }
}

impl NegativeValuePolicy {
    pub fn validate(&self) -> ModitResult<()> {
        if !self.relative_tolerance.is_finite() || self.relative_tolerance < 0.0 {
            return Err(ModitError::input_validation(
                "INPUT.NEGATIVE_VALUE_POLICY",
                format!(
                    "relative tolerance must be finite and >= 0, got {}",
                    self.relative_tolerance
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeValueReport {
    /// Entries that were below zero and have been set to zero.
    pub clipped: usize,
    /// Most negative value seen (0 when nothing was clipped).
    pub minimum: f64,
    /// Matrix maximum used as the scale.
    pub scale: f64,
    /// Absolute fault threshold, `relative_tolerance * scale`.
    pub threshold: f64,
    pub fault: bool,
}

impl NegativeValueReport {
    pub fn relative_magnitude(&self) -> f64 {
        if self.scale > 0.0 {
            -self.minimum / self.scale
        } else {
            0.0
        }
    }
}

/// Sets every negative entry to zero and reports what was removed.
///
/// A fault is flagged when a removed value is larger in magnitude than the
/// policy threshold; with `fail_on_fault` that becomes a computation error.
pub fn clip_negative_values(
    matrix: &mut Mat<f64>,
    policy: &NegativeValuePolicy,
) -> ModitResult<NegativeValueReport> {
    let mut scale = 0.0_f64;
    let mut minimum = 0.0_f64;
    for col in 0..matrix.ncols() {
        for row in 0..matrix.nrows() {
            let value = matrix[(row, col)];
            scale = scale.max(value);
            minimum = minimum.min(value);
        }
    }

    let threshold = policy.relative_tolerance * scale;
    let mut clipped = 0;
    if minimum < 0.0 {
        for col in 0..matrix.ncols() {
            for row in 0..matrix.nrows() {
                if matrix[(row, col)] < 0.0 {
                    matrix[(row, col)] = 0.0;
                    clipped += 1;
                }
            }
        }
    }

    let report = NegativeValueReport {
        clipped,
        minimum,
        scale,
        threshold,
        fault: -minimum > threshold,
    };

    if report.fault {
        tracing::error!(
            clipped,
            minimum,
            scale,
            threshold,
            "negative cross sections exceed the round-off threshold"
        );
        if policy.fail_on_fault {
            return Err(ModitError::computation(
                "RUN.NEGATIVE_CROSS_SECTION",
                format!(
                    "cross-section minimum {minimum:e} exceeds the tolerated magnitude {threshold:e} (matrix max {scale:e})"
                ),
            ));
        }
    } else if clipped > 0 {
        tracing::warn!(
            clipped,
            minimum,
            relative = report.relative_magnitude(),
            "clipped negative cross sections from FFT round-off"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{NegativeValuePolicy, clip_negative_values};
    use crate::domain::ModitErrorCategory;
    use faer::Mat;

    #[test]
    fn round_off_negatives_are_clipped_without_fault() {
        let mut matrix = Mat::from_fn(2, 3, |row, col| match (row, col) {
            (0, 1) => -1.0e-40,
            (1, 2) => -3.0e-40,
            _ => 1.0e-25,
        });
        let report =
            clip_negative_values(&mut matrix, &NegativeValuePolicy::default()).expect("report");

        assert_eq!(report.clipped, 2);
        assert_eq!(report.minimum, -3.0e-40);
        assert!(!report.fault);
        assert_eq!(matrix[(0, 1)], 0.0);
        assert_eq!(matrix[(1, 2)], 0.0);
        assert_eq!(matrix[(0, 0)], 1.0e-25);
    }

    #[test]
    fn large_negatives_are_reported_as_faults() {
        let mut matrix = Mat::from_fn(1, 4, |_, col| if col == 2 { -1.0e-3 } else { 1.0 });
        let report =
            clip_negative_values(&mut matrix, &NegativeValuePolicy::default()).expect("report");
        assert!(report.fault);
        assert_eq!(report.clipped, 1);
        assert!((report.relative_magnitude() - 1.0e-3).abs() < 1.0e-15);
        assert_eq!(matrix[(0, 2)], 0.0);

        let strict = NegativeValuePolicy {
            fail_on_fault: true,
            ..NegativeValuePolicy::default()
        };
        let mut matrix = Mat::from_fn(1, 4, |_, col| if col == 2 { -1.0e-3 } else { 1.0 });
        let error = clip_negative_values(&mut matrix, &strict).expect_err("fault");
        assert_eq!(error.category(), ModitErrorCategory::ComputationError);
        assert_eq!(error.placeholder(), "RUN.NEGATIVE_CROSS_SECTION");
    }

    #[test]
    fn non_negative_matrix_is_untouched() {
        let mut matrix = Mat::<f64>::zeros(3, 3);
        let report =
            clip_negative_values(&mut matrix, &NegativeValuePolicy::default()).expect("report");
        assert_eq!(report.clipped, 0);
        assert!(!report.fault);
        assert_eq!(report.relative_magnitude(), 0.0);
    }
}
