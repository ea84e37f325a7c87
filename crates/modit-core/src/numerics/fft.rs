//! Zero-padded real-FFT convolution on a fixed-length grid.
//!
//! Signals of length `N` are embedded in `2N`-point buffers so that the
//! circular convolution equals the linear one over offsets `(-N, N)`.
//! Kernels are sampled centered at index `N` of their buffer; the resulting
//! `(-1)^k` phase on half-spectrum bin `k` is removed with [`alternating_signs`].

use crate::domain::ModitError;
use num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvolutionError {
    #[error("convolution signal length must be at least 2, got {actual}")]
    SignalTooShort { actual: usize },
    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("kernel samples must be finite and non-negative with a positive sum")]
    InvalidKernel,
    #[error("real FFT failed: {message}")]
    Transform { message: String },
}

impl From<ConvolutionError> for ModitError {
    fn from(error: ConvolutionError) -> Self {
        ModitError::internal("RUN.FFT", error.to_string())
    }
}

/// Checkerboard `+1, -1, +1, ...` of the given length.
pub fn alternating_signs(len: usize) -> Vec<f64> {
    (0..len)
        .map(|index| if index % 2 == 0 { 1.0 } else { -1.0 })
        .collect()
}

#[derive(Clone)]
pub struct ConvolutionPlan {
    signal_len: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
}

impl Debug for ConvolutionPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvolutionPlan")
            .field("signal_len", &self.signal_len)
            .field("padded_len", &self.padded_len())
            .finish()
    }
}

impl ConvolutionPlan {
    pub fn new(signal_len: usize) -> Result<Self, ConvolutionError> {
        if signal_len < 2 {
            return Err(ConvolutionError::SignalTooShort { actual: signal_len });
        }

        let mut planner = RealFftPlanner::<f64>::new();
        let padded_len = 2 * signal_len;
        Ok(Self {
            signal_len,
            forward: planner.plan_fft_forward(padded_len),
            inverse: planner.plan_fft_inverse(padded_len),
        })
    }

    pub const fn signal_len(&self) -> usize {
        self.signal_len
    }

    pub const fn padded_len(&self) -> usize {
        2 * self.signal_len
    }

    /// Number of half-spectrum bins, `N + 1`.
    pub const fn spectrum_len(&self) -> usize {
        self.signal_len + 1
    }

    pub fn zeroed_spectrum(&self) -> Vec<Complex64> {
        vec![Complex64::new(0.0, 0.0); self.spectrum_len()]
    }

    /// Transforms an `N`-point signal, zero-padding it to `2N`.
    pub fn signal_spectrum(&self, signal: &[f64]) -> Result<Vec<Complex64>, ConvolutionError> {
        self.expect_len("signal", self.signal_len, signal.len())?;

        let mut buffer = vec![0.0; self.padded_len()];
        buffer[..self.signal_len].copy_from_slice(signal);
        self.transform(buffer)
    }

    /// Samples `profile(offset)` at offsets `-N..N`, normalizes the samples to
    /// unit sum, and transforms the buffer with the kernel center at index `N`.
    pub fn centered_kernel_spectrum<F>(&self, profile: F) -> Result<Vec<Complex64>, ConvolutionError>
    where
        F: Fn(f64) -> f64,
    {
        let center = self.signal_len as f64;
        let mut buffer: Vec<f64> = (0..self.padded_len())
            .map(|index| profile(index as f64 - center))
            .collect();

        if buffer
            .iter()
            .any(|sample| !sample.is_finite() || *sample < 0.0)
        {
            return Err(ConvolutionError::InvalidKernel);
        }
        let total: f64 = buffer.iter().sum();
        if !(total > 0.0) {
            return Err(ConvolutionError::InvalidKernel);
        }
        for sample in &mut buffer {
            *sample /= total;
        }

        self.transform(buffer)
    }

    /// Inverse of a product of a signal spectrum and a centered kernel spectrum.
    ///
    /// `signs` must be the `N + 1` checkerboard; the first `N` real samples of
    /// the unshifted convolution are returned.
    pub fn centered_inverse(
        &self,
        mut spectrum: Vec<Complex64>,
        signs: &[f64],
    ) -> Result<Vec<f64>, ConvolutionError> {
        self.expect_len("spectrum", self.spectrum_len(), spectrum.len())?;
        self.expect_len("sign array", self.spectrum_len(), signs.len())?;

        for (bin, sign) in spectrum.iter_mut().zip(signs) {
            *bin *= *sign;
        }
        // DC and Nyquist bins of a real signal carry no imaginary part.
        spectrum[0].im = 0.0;
        let last = spectrum.len() - 1;
        spectrum[last].im = 0.0;

        let mut output = vec![0.0; self.padded_len()];
        self.inverse
            .process(&mut spectrum, &mut output)
            .map_err(|error| ConvolutionError::Transform {
                message: error.to_string(),
            })?;

        let scale = 1.0 / self.padded_len() as f64;
        output.truncate(self.signal_len);
        for value in &mut output {
            *value *= scale;
        }
        Ok(output)
    }

    fn transform(&self, mut buffer: Vec<f64>) -> Result<Vec<Complex64>, ConvolutionError> {
        let mut spectrum = self.zeroed_spectrum();
        self.forward
            .process(&mut buffer, &mut spectrum)
            .map_err(|error| ConvolutionError::Transform {
                message: error.to_string(),
            })?;
        Ok(spectrum)
    }

    fn expect_len(
        &self,
        what: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), ConvolutionError> {
        if expected == actual {
            Ok(())
        } else {
            Err(ConvolutionError::LengthMismatch {
                what,
                expected,
                actual,
            })
        }
    }
}
