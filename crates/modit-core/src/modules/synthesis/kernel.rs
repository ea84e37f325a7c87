use crate::numerics::fft::{ConvolutionError, ConvolutionPlan};
use crate::numerics::voigt_profile;
use num_complex::Complex64;

/// Half-spectrum of a Voigt kernel sampled in grid steps.
///
/// `normalized_doppler` is the Gaussian standard deviation and
/// `normalized_lorentz` the Lorentzian half-width, both in units of the
/// log-wavenumber step.
pub fn voigt_kernel_spectrum(
    plan: &ConvolutionPlan,
    normalized_doppler: f64,
    normalized_lorentz: f64,
) -> Result<Vec<Complex64>, ConvolutionError> {
    if !(normalized_doppler > 0.0) || !normalized_doppler.is_finite() {
        return Err(ConvolutionError::InvalidKernel);
    }
    plan.centered_kernel_spectrum(|offset| {
        voigt_profile(offset, normalized_doppler, normalized_lorentz)
    })
}

#[cfg(test)]
mod tests {
    use super::voigt_kernel_spectrum;
    use crate::numerics::fft::{ConvolutionError, ConvolutionPlan};

    #[test]
    fn kernel_spectrum_has_unit_dc_bin() {
        let plan = ConvolutionPlan::new(64).expect("plan");
        let spectrum = voigt_kernel_spectrum(&plan, 2.0, 0.5).expect("kernel");
        assert_eq!(spectrum.len(), 65);
        assert!((spectrum[0].re - 1.0).abs() < 1.0e-12);
        assert!(spectrum[0].im.abs() < 1.0e-12);
    }

    #[test]
    fn broader_kernels_damp_high_frequencies_more() {
        let plan = ConvolutionPlan::new(64).expect("plan");
        let narrow = voigt_kernel_spectrum(&plan, 1.0, 0.1).expect("narrow");
        let broad = voigt_kernel_spectrum(&plan, 1.0, 4.0).expect("broad");
        assert!(broad[10].norm() < narrow[10].norm());
    }

    #[test]
    fn zero_doppler_width_is_rejected() {
        let plan = ConvolutionPlan::new(8).expect("plan");
        assert_eq!(
            voigt_kernel_spectrum(&plan, 0.0, 1.0),
            Err(ConvolutionError::InvalidKernel)
        );
    }
}
