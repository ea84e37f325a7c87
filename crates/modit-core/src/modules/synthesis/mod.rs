//! MODIT cross-section synthesis.
//!
//! Per layer, line strengths are binned onto `[isotope x broadening point x
//! wavenumber]` buckets, each bucket is convolved with a Voigt kernel through a
//! zero-padded real FFT, and the bucket results are summed in the frequency
//! domain before a single inverse transform. Cost is
//! `O(layers x buckets x N log N)` plus `O(layers x lines)` for binning.

mod binning;
mod cleanup;
mod kernel;

pub use binning::{LayerBinning, LineShapeDensity, bin_layer_line_strengths};
pub use cleanup::{NegativeValuePolicy, NegativeValueReport, clip_negative_values};
pub use kernel::voigt_kernel_spectrum;

use super::broadening::{
    BroadeningGrid, BroadeningGridInput, BroadeningGridPolicy, build_layer_broadening_grids,
};
use super::preprocess::LayerLineParameters;
use super::traits::CrossSectionSynthesizer;
use super::wavenumber::{WavenumberGrid, WavenumberIndex};
use crate::domain::{ExecutionMode, LineList, ModitError, ModitResult};
use crate::numerics::ConvolutionPlan;
use faer::Mat;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Inputs of one synthesis call. Everything is borrowed; the call owns only
/// its output.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub grid: &'a WavenumberGrid,
    pub lines: &'a LineList,
    pub index: &'a WavenumberIndex,
    pub parameters: &'a LayerLineParameters,
}

impl<'a> SynthesisRequest<'a> {
    pub fn new(
        grid: &'a WavenumberGrid,
        lines: &'a LineList,
        index: &'a WavenumberIndex,
        parameters: &'a LayerLineParameters,
    ) -> Self {
        Self {
            grid,
            lines,
            index,
            parameters,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.parameters.layer_count()
    }

    pub fn validate(&self) -> ModitResult<()> {
        let mismatch = |what: &str, expected: usize, actual: usize| {
            ModitError::input_validation(
                "INPUT.SYNTHESIS_REQUEST",
                format!("{what}: expected {expected}, got {actual}"),
            )
        };

        if self.index.grid_len() != self.grid.len() {
            return Err(mismatch(
                "wavenumber index grid length",
                self.grid.len(),
                self.index.grid_len(),
            ));
        }
        if self.index.line_count() != self.lines.len() {
            return Err(mismatch(
                "wavenumber index line count",
                self.lines.len(),
                self.index.line_count(),
            ));
        }
        if self.parameters.line_count() != self.lines.len() {
            return Err(mismatch(
                "layer parameter line count",
                self.lines.len(),
                self.parameters.line_count(),
            ));
        }
        if self.parameters.isotope_count() != self.lines.isotopologues().len() {
            return Err(mismatch(
                "layer parameter isotope count",
                self.lines.isotopologues().len(),
                self.parameters.isotope_count(),
            ));
        }
        if self.layer_count() == 0 {
            return Err(ModitError::input_validation(
                "INPUT.SYNTHESIS_REQUEST",
                "at least one layer is required",
            ));
        }
        Ok(())
    }
}

/// Dense `[layer x wavenumber]` cross sections in cm^2/molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionMatrix {
    values: Mat<f64>,
}

impl CrossSectionMatrix {
    pub fn from_rows(rows: &[Vec<f64>], grid_len: usize) -> Self {
        Self {
            values: Mat::from_fn(rows.len(), grid_len, |layer, point| rows[layer][point]),
        }
    }

    pub fn layer_count(&self) -> usize {
        self.values.nrows()
    }

    pub fn grid_len(&self) -> usize {
        self.values.ncols()
    }

    pub fn get(&self, layer: usize, point: usize) -> f64 {
        self.values[(layer, point)]
    }

    pub fn row(&self, layer: usize) -> Vec<f64> {
        (0..self.grid_len())
            .map(|point| self.values[(layer, point)])
            .collect()
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.layer_count()).map(|layer| self.row(layer)).collect()
    }

    pub fn max_value(&self) -> f64 {
        let mut max = 0.0_f64;
        for col in 0..self.grid_len() {
            for row in 0..self.layer_count() {
                max = max.max(self.values[(row, col)]);
            }
        }
        max
    }

    pub(crate) fn as_mat_mut(&mut self) -> &mut Mat<f64> {
        &mut self.values
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDiagnostics {
    pub layer: usize,
    pub contributing_lines: usize,
    pub broadening_points: usize,
    pub convolved_buckets: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisDiagnostics {
    pub method: &'static str,
    pub execution_mode: ExecutionMode,
    pub layers: Vec<LayerDiagnostics>,
    pub negative_values: NegativeValueReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutput {
    pub cross_sections: CrossSectionMatrix,
    pub diagnostics: SynthesisDiagnostics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SynthesisOptions {
    pub broadening: BroadeningGridPolicy,
    pub negative_values: NegativeValuePolicy,
    pub execution_mode: ExecutionMode,
}

/// FFT-based cross-section synthesizer over a broadening-parameter grid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModitSynthesizer {
    options: SynthesisOptions,
}

struct LayerResult {
    row: Vec<f64>,
    diagnostics: LayerDiagnostics,
}

struct LayerContext<'a> {
    request: &'a SynthesisRequest<'a>,
    plan: &'a ConvolutionPlan,
    normalized_widths: &'a Mat<f64>,
    broadening: &'a [Option<BroadeningGrid>],
}

impl ModitSynthesizer {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    fn synthesize_layer(context: &LayerContext<'_>, layer: usize) -> ModitResult<LayerResult> {
        let request = context.request;
        let grid_len = request.grid.len();
        let mut diagnostics = LayerDiagnostics {
            layer,
            ..LayerDiagnostics::default()
        };

        let Some(broadening) = context.broadening[layer].as_ref() else {
            tracing::debug!(layer, "layer has no contributing lines");
            return Ok(LayerResult {
                row: vec![0.0; grid_len],
                diagnostics,
            });
        };
        diagnostics.broadening_points = broadening.len();

        let strengths = request.parameters.layer_strengths(layer);
        let widths: Vec<f64> = (0..request.lines.len())
            .map(|line| context.normalized_widths[(layer, line)])
            .collect();
        let binning = LayerBinning {
            index: request.index,
            broadening,
            isotopes: request.lines.isotopes(),
            isotope_count: request.lines.isotopologues().len(),
        };
        let densities = bin_layer_line_strengths(&binning, &strengths, &widths);

        let resolution = request.grid.resolution();
        let plan = context.plan;
        let mut accumulated = plan.zeroed_spectrum();
        for density in &densities {
            diagnostics.contributing_lines += density.line_count();
            let doppler = request
                .parameters
                .normalized_doppler_width(layer, density.isotope(), resolution);
            for (point, bucket) in density.occupied_buckets() {
                let signal = plan.signal_spectrum(bucket)?;
                let kernel = voigt_kernel_spectrum(plan, doppler, broadening.value(point))?;
                for ((sum, lhs), rhs) in accumulated.iter_mut().zip(&signal).zip(&kernel) {
                    *sum += lhs * rhs;
                }
                diagnostics.convolved_buckets += 1;
            }
        }

        let mut row = plan.centered_inverse(accumulated, request.index.signs())?;
        for (value, center) in row.iter_mut().zip(request.grid.values()) {
            *value *= resolution / center;
        }

        tracing::debug!(
            layer,
            lines = diagnostics.contributing_lines,
            broadening_points = diagnostics.broadening_points,
            buckets = diagnostics.convolved_buckets,
            "synthesized layer"
        );
        Ok(LayerResult { row, diagnostics })
    }
}

impl CrossSectionSynthesizer for ModitSynthesizer {
    fn method(&self) -> &'static str {
        "modit"
    }

    fn synthesize(&self, request: &SynthesisRequest<'_>) -> ModitResult<SynthesisOutput> {
        request.validate()?;
        self.options.negative_values.validate()?;
        let started = Instant::now();

        let normalized_widths = request
            .parameters
            .normalized_lorentz_widths(request.lines, request.grid);
        let broadening = build_layer_broadening_grids(
            BroadeningGridInput::new(&normalized_widths, request.parameters.line_strengths()),
            &self.options.broadening,
        )?;
        let plan = ConvolutionPlan::new(request.grid.len())?;
        let context = LayerContext {
            request,
            plan: &plan,
            normalized_widths: &normalized_widths,
            broadening: &broadening,
        };

        let layers = request.layer_count();
        let results: Vec<LayerResult> = match self.options.execution_mode {
            ExecutionMode::Serial => (0..layers)
                .map(|layer| Self::synthesize_layer(&context, layer))
                .collect::<ModitResult<_>>()?,
            ExecutionMode::Parallel => (0..layers)
                .into_par_iter()
                .map(|layer| Self::synthesize_layer(&context, layer))
                .collect::<ModitResult<_>>()?,
        };

        let (rows, layer_diagnostics): (Vec<_>, Vec<_>) = results
            .into_iter()
            .map(|result| (result.row, result.diagnostics))
            .unzip();
        let mut cross_sections = CrossSectionMatrix::from_rows(&rows, request.grid.len());
        let negative_values =
            clip_negative_values(cross_sections.as_mat_mut(), &self.options.negative_values)?;

        tracing::info!(
            method = self.method(),
            layers,
            grid_len = request.grid.len(),
            lines = request.lines.len(),
            mode = %self.options.execution_mode,
            elapsed_ms = started.elapsed().as_secs_f64() * 1.0e3,
            "cross-section synthesis finished"
        );

        Ok(SynthesisOutput {
            cross_sections,
            diagnostics: SynthesisDiagnostics {
                method: self.method(),
                execution_mode: self.options.execution_mode,
                layers: layer_diagnostics,
                negative_values,
            },
        })
    }
}
