//! Line-by-line Voigt summation.
//!
//! Evaluates every line profile at every grid point, `O(layers x lines x N)`.
//! Used as the accuracy reference for [`ModitSynthesizer`](super::synthesis::ModitSynthesizer).

use super::synthesis::{
    CrossSectionMatrix, LayerDiagnostics, NegativeValuePolicy, SynthesisDiagnostics,
    SynthesisOutput, SynthesisRequest, clip_negative_values,
};
use super::traits::CrossSectionSynthesizer;
use crate::domain::{ExecutionMode, ModitResult};
use crate::numerics::voigt_profile;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DirectSynthesizer {
    execution_mode: ExecutionMode,
}

impl DirectSynthesizer {
    pub fn new(execution_mode: ExecutionMode) -> Self {
        Self { execution_mode }
    }

    fn synthesize_layer(request: &SynthesisRequest<'_>, layer: usize) -> (Vec<f64>, LayerDiagnostics) {
        let lines = request.lines;
        let parameters = request.parameters;
        let wavenumbers = request.grid.values();
        let mut row = vec![0.0; wavenumbers.len()];
        let mut contributing_lines = 0;

        for (line, &center) in lines.centers().iter().enumerate() {
            let strength = parameters.line_strength(layer, line);
            if !(strength > 0.0) {
                continue;
            }
            contributing_lines += 1;
            let sigma = parameters.doppler_width(layer, lines.isotopes()[line], center);
            let gamma = parameters.lorentz_width(layer, line);
            for (value, wavenumber) in row.iter_mut().zip(wavenumbers) {
                *value += strength * voigt_profile(wavenumber - center, sigma, gamma);
            }
        }

        (
            row,
            LayerDiagnostics {
                layer,
                contributing_lines,
                ..LayerDiagnostics::default()
            },
        )
    }
}

impl CrossSectionSynthesizer for DirectSynthesizer {
    fn method(&self) -> &'static str {
        "direct"
    }

    fn synthesize(&self, request: &SynthesisRequest<'_>) -> ModitResult<SynthesisOutput> {
        request.validate()?;

        let layers = request.layer_count();
        let results: Vec<(Vec<f64>, LayerDiagnostics)> = match self.execution_mode {
            ExecutionMode::Serial => (0..layers)
                .map(|layer| Self::synthesize_layer(request, layer))
                .collect(),
            ExecutionMode::Parallel => (0..layers)
                .into_par_iter()
                .map(|layer| Self::synthesize_layer(request, layer))
                .collect(),
        };
        let (rows, layer_diagnostics): (Vec<_>, Vec<_>) = results.into_iter().unzip();

        let mut cross_sections = CrossSectionMatrix::from_rows(&rows, request.grid.len());
        let negative_values =
            clip_negative_values(cross_sections.as_mat_mut(), &NegativeValuePolicy::default())?;
        tracing::info!(
            method = self.method(),
            layers,
            grid_len = request.grid.len(),
            lines = request.lines.len(),
            "cross-section synthesis finished"
        );

        Ok(SynthesisOutput {
            cross_sections,
            diagnostics: SynthesisDiagnostics {
                method: self.method(),
                execution_mode: self.execution_mode,
                layers: layer_diagnostics,
                negative_values,
            },
        })
    }
}
