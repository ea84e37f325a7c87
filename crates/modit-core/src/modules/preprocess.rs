//! Line parameter preprocessing: per-layer line strength, Lorentz width and
//! Doppler width from the reference constants of a [`LineList`].
//!
//! Strengths are combined in log space and exponentiated once, so weak lines at
//! cold layers underflow to zero instead of producing NaN.

use crate::common::constants::{
    ATOMIC_MASS_UNIT, BOLTZMANN, HC_OVER_KB, NATURAL_BROADENING_PER_EINSTEIN_A,
    REFERENCE_TEMPERATURE, SPEED_OF_LIGHT,
};
use crate::domain::{AtmosphereProfile, LineList, ModitError, ModitResult, PartitionFunction};
use crate::modules::wavenumber::WavenumberGrid;
use faer::Mat;

/// `ln S(T)` from `ln S(Tref)`.
pub fn log_line_strength(
    log_reference_strength: f64,
    center: f64,
    lower_state_energy: f64,
    temperature: f64,
    partition_ratio: f64,
) -> f64 {
    let boltzmann = -HC_OVER_KB * lower_state_energy * (1.0 / temperature - 1.0 / REFERENCE_TEMPERATURE);
    let stimulated = (-(-HC_OVER_KB * center / temperature).exp_m1()).ln()
        - (-(-HC_OVER_KB * center / REFERENCE_TEMPERATURE).exp_m1()).ln();
    log_reference_strength + boltzmann + stimulated - partition_ratio.ln()
}

pub fn line_strength(
    log_reference_strength: f64,
    center: f64,
    lower_state_energy: f64,
    temperature: f64,
    partition_ratio: f64,
) -> f64 {
    log_line_strength(
        log_reference_strength,
        center,
        lower_state_energy,
        temperature,
        partition_ratio,
    )
    .exp()
}

/// Pressure-broadening half-width `gamma_ref P (Tref / T)^n` (cm^-1).
pub fn pressure_broadening(
    reference_broadening: f64,
    temperature_exponent: f64,
    temperature: f64,
    pressure: f64,
) -> f64 {
    reference_broadening * pressure * (REFERENCE_TEMPERATURE / temperature).powf(temperature_exponent)
}

/// Natural broadening half-width `A / (4 pi c)` (cm^-1).
pub fn natural_broadening(einstein_a: f64) -> f64 {
    NATURAL_BROADENING_PER_EINSTEIN_A * einstein_a
}

/// Doppler standard deviation divided by line center, `sqrt(kT / (m c^2))`.
pub fn doppler_velocity_ratio(temperature: f64, molecular_mass: f64) -> f64 {
    (BOLTZMANN * temperature / (molecular_mass * ATOMIC_MASS_UNIT)).sqrt() / SPEED_OF_LIGHT
}

#[derive(Debug, Clone, Copy)]
pub struct LineParameterInput<'a> {
    pub lines: &'a LineList,
    pub atmosphere: &'a AtmosphereProfile,
    pub partition: &'a dyn PartitionFunction,
}

impl<'a> LineParameterInput<'a> {
    pub fn new(
        lines: &'a LineList,
        atmosphere: &'a AtmosphereProfile,
        partition: &'a dyn PartitionFunction,
    ) -> Self {
        Self {
            lines,
            atmosphere,
            partition,
        }
    }
}

/// Derived quantities for one temperature/pressure profile.
///
/// Line-indexed matrices are `[layer x line]`; Doppler ratios are
/// `[layer x isotope]` because every line of an isotopologue shares the same
/// `sigma_D / nu` at a given temperature.
#[derive(Debug, Clone)]
pub struct LayerLineParameters {
    line_strengths: Mat<f64>,
    lorentz_widths: Mat<f64>,
    doppler_ratios: Mat<f64>,
}

impl LayerLineParameters {
    pub fn layer_count(&self) -> usize {
        self.line_strengths.nrows()
    }

    pub fn line_count(&self) -> usize {
        self.line_strengths.ncols()
    }

    pub fn isotope_count(&self) -> usize {
        self.doppler_ratios.ncols()
    }

    pub fn line_strengths(&self) -> &Mat<f64> {
        &self.line_strengths
    }

    pub fn lorentz_widths(&self) -> &Mat<f64> {
        &self.lorentz_widths
    }

    /// `S(T)` in cm/molecule.
    pub fn line_strength(&self, layer: usize, line: usize) -> f64 {
        self.line_strengths[(layer, line)]
    }

    /// Lorentz half-width in cm^-1.
    pub fn lorentz_width(&self, layer: usize, line: usize) -> f64 {
        self.lorentz_widths[(layer, line)]
    }

    pub fn doppler_ratio(&self, layer: usize, isotope: usize) -> f64 {
        self.doppler_ratios[(layer, isotope)]
    }

    /// Doppler standard deviation in cm^-1 for a line center.
    pub fn doppler_width(&self, layer: usize, isotope: usize, center: f64) -> f64 {
        self.doppler_ratio(layer, isotope) * center
    }

    /// Doppler width in grid steps; identical for every line of the isotope.
    pub fn normalized_doppler_width(&self, layer: usize, isotope: usize, resolution: f64) -> f64 {
        self.doppler_ratio(layer, isotope) * resolution
    }

    pub fn layer_strengths(&self, layer: usize) -> Vec<f64> {
        (0..self.line_count())
            .map(|line| self.line_strengths[(layer, line)])
            .collect()
    }

    /// `[layer x line]` Lorentz widths in grid steps.
    pub fn normalized_lorentz_widths(&self, lines: &LineList, grid: &WavenumberGrid) -> Mat<f64> {
        let resolution = grid.resolution();
        let centers = lines.centers();
        Mat::from_fn(self.layer_count(), self.line_count(), |layer, line| {
            self.lorentz_widths[(layer, line)] * resolution / centers[line]
        })
    }
}

/// Evaluates `S(T)`, Lorentz width and Doppler ratio for every layer.
pub fn compute_layer_line_parameters(
    input: LineParameterInput<'_>,
) -> ModitResult<LayerLineParameters> {
    let lines = input.lines;
    let atmosphere = input.atmosphere;
    let layer_count = atmosphere.layer_count();
    let isotope_count = lines.isotopologues().len();

    let mut partition_ratios = Mat::<f64>::zeros(layer_count, isotope_count);
    for layer in 0..layer_count {
        for isotope in 0..isotope_count {
            partition_ratios[(layer, isotope)] =
                input.partition.ratio(isotope, atmosphere.temperature(layer))?;
        }
    }

    let centers = lines.centers();
    let log_strengths = lines.log_reference_strengths();
    let energies = lines.lower_state_energies();
    let isotopes = lines.isotopes();
    let line_strengths = Mat::from_fn(layer_count, lines.len(), |layer, line| {
        line_strength(
            log_strengths[line],
            centers[line],
            energies[line],
            atmosphere.temperature(layer),
            partition_ratios[(layer, isotopes[line])],
        )
    });

    for layer in 0..layer_count {
        for line in 0..lines.len() {
            let value = line_strengths[(layer, line)];
            if !value.is_finite() {
                return Err(ModitError::computation(
                    "RUN.LINE_STRENGTH",
                    format!(
                        "line strength of line {line} in layer {layer} is not finite ({value}) at T = {} K",
                        atmosphere.temperature(layer)
                    ),
                ));
            }
        }
    }

    let reference_broadening = lines.reference_broadening();
    let exponents = lines.temperature_exponents();
    let einstein_a = lines.einstein_a();
    let lorentz_widths = Mat::from_fn(layer_count, lines.len(), |layer, line| {
        pressure_broadening(
            reference_broadening[line],
            exponents[line],
            atmosphere.temperature(layer),
            atmosphere.pressure(layer),
        ) + natural_broadening(einstein_a[line])
    });

    let isotopologues = lines.isotopologues();
    let doppler_ratios = Mat::from_fn(layer_count, isotope_count, |layer, isotope| {
        doppler_velocity_ratio(
            atmosphere.temperature(layer),
            isotopologues[isotope].molecular_mass,
        )
    });

    tracing::debug!(
        layers = layer_count,
        lines = lines.len(),
        isotopes = isotope_count,
        "computed per-layer line parameters"
    );

    Ok(LayerLineParameters {
        line_strengths,
        lorentz_widths,
        doppler_ratios,
    })
}
