use super::errors::ModitError;
use super::partition::{PartitionFunction, PartitionFunctionError};
use crate::common::constants::{DEFAULT_REFERENCE_BROADENING, DEFAULT_TEMPERATURE_EXPONENT};
use crate::modules::preprocess::line_strength;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineListError {
    #[error("line list is empty")]
    Empty,
    #[error("line list column '{column}' has {actual} entries, expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}: {column} must be {requirement}, got {value}")]
    InvalidValue {
        line: usize,
        column: &'static str,
        requirement: &'static str,
        value: f64,
    },
    #[error("line {line} references isotope {isotope}, but only {available} isotopologues are defined")]
    UnknownIsotope {
        line: usize,
        isotope: usize,
        available: usize,
    },
    #[error("line list defines no isotopologues; every line needs a molecular mass")]
    MissingIsotopologues,
    #[error("isotopologue '{name}' must have a finite molecular mass > 0, got {mass}")]
    InvalidIsotopologue { name: String, mass: f64 },
    #[error("line filter removed every line")]
    NothingRetained,
    #[error(transparent)]
    Partition(#[from] PartitionFunctionError),
}

impl From<LineListError> for ModitError {
    fn from(error: LineListError) -> Self {
        match error {
            LineListError::Partition(source) => source.into(),
            other => ModitError::input_validation("INPUT.LINE_LIST", other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Isotopologue {
    pub name: String,
    /// Molecular mass in atomic mass units.
    pub molecular_mass: f64,
}

impl Isotopologue {
    pub fn new(name: impl Into<String>, molecular_mass: f64) -> Self {
        Self {
            name: name.into(),
            molecular_mass,
        }
    }
}

/// Serialized line list. Broadening columns fall back to the default
/// `0.07 cm^-1 bar^-1` / `0.5` when absent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineListData {
    pub centers: Vec<f64>,
    pub reference_strengths: Vec<f64>,
    #[serde(default)]
    pub lower_state_energies: Option<Vec<f64>>,
    #[serde(default)]
    pub einstein_a: Option<Vec<f64>>,
    #[serde(default)]
    pub reference_broadening: Option<Vec<f64>>,
    #[serde(default)]
    pub temperature_exponents: Option<Vec<f64>>,
    pub isotopologues: Vec<Isotopologue>,
    #[serde(default)]
    pub isotopes: Option<Vec<usize>>,
}

/// Line-strength filter applied when a line list is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrengthFilter {
    /// Lines with `S(typical_temperature) <= threshold` are dropped; a
    /// threshold `<= 0` keeps every line.
    pub threshold: f64,
    pub typical_temperature: f64,
}

impl Default for StrengthFilter {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            typical_temperature: 1000.0,
        }
    }
}

impl StrengthFilter {
    pub const fn is_active(&self) -> bool {
        self.threshold > 0.0
    }
}

/// Immutable per-line spectroscopic constants.
///
/// Reference strengths are kept as `ln S(Tref)` so temperature scaling never
/// leaves log space before the final exponentiation.
#[derive(Debug, Clone, PartialEq)]
pub struct LineList {
    centers: Vec<f64>,
    log_reference_strengths: Vec<f64>,
    lower_state_energies: Vec<f64>,
    einstein_a: Vec<f64>,
    reference_broadening: Vec<f64>,
    temperature_exponents: Vec<f64>,
    isotopes: Vec<usize>,
    isotopologues: Vec<Isotopologue>,
}

#[derive(Debug, Clone)]
pub struct LineListBuilder {
    centers: Vec<f64>,
    reference_strengths: Vec<f64>,
    lower_state_energies: Option<Vec<f64>>,
    einstein_a: Option<Vec<f64>>,
    reference_broadening: Option<Vec<f64>>,
    temperature_exponents: Option<Vec<f64>>,
    isotopologues: Vec<Isotopologue>,
    isotopes: Option<Vec<usize>>,
}

impl LineListBuilder {
    pub fn lower_state_energies(mut self, values: Vec<f64>) -> Self {
        self.lower_state_energies = Some(values);
        self
    }

    pub fn einstein_a(mut self, values: Vec<f64>) -> Self {
        self.einstein_a = Some(values);
        self
    }

    pub fn broadening(mut self, reference_broadening: Vec<f64>, exponents: Vec<f64>) -> Self {
        self.reference_broadening = Some(reference_broadening);
        self.temperature_exponents = Some(exponents);
        self
    }

    pub fn isotopologues(mut self, isotopologues: Vec<Isotopologue>, isotopes: Vec<usize>) -> Self {
        self.isotopologues = isotopologues;
        self.isotopes = Some(isotopes);
        self
    }

    pub fn build(self) -> Result<LineList, LineListError> {
        let count = self.centers.len();
        if count == 0 {
            return Err(LineListError::Empty);
        }

        let column = |name: &'static str, values: Option<Vec<f64>>, fallback: f64| {
            let values = values.unwrap_or_else(|| vec![fallback; count]);
            if values.len() == count {
                Ok(values)
            } else {
                Err(LineListError::ColumnLength {
                    column: name,
                    expected: count,
                    actual: values.len(),
                })
            }
        };
        let reference_strengths = column("referenceStrengths", Some(self.reference_strengths), 0.0)?;
        let lower_state_energies = column("lowerStateEnergies", self.lower_state_energies, 0.0)?;
        let einstein_a = column("einsteinA", self.einstein_a, 0.0)?;
        let reference_broadening = column(
            "referenceBroadening",
            self.reference_broadening,
            DEFAULT_REFERENCE_BROADENING,
        )?;
        let temperature_exponents = column(
            "temperatureExponents",
            self.temperature_exponents,
            DEFAULT_TEMPERATURE_EXPONENT,
        )?;

        check_column("centers", &self.centers, "finite and > 0", |v| v > 0.0)?;
        check_column("referenceStrengths", &reference_strengths, "finite and > 0", |v| v > 0.0)?;
        check_column("lowerStateEnergies", &lower_state_energies, "finite and >= 0", |v| v >= 0.0)?;
        check_column("einsteinA", &einstein_a, "finite and >= 0", |v| v >= 0.0)?;
        check_column("referenceBroadening", &reference_broadening, "finite and >= 0", |v| v >= 0.0)?;
        check_column("temperatureExponents", &temperature_exponents, "finite", |_| true)?;

        if self.isotopologues.is_empty() {
            return Err(LineListError::MissingIsotopologues);
        }
        let isotopologues = self.isotopologues;
        for isotopologue in &isotopologues {
            if !isotopologue.molecular_mass.is_finite() || isotopologue.molecular_mass <= 0.0 {
                return Err(LineListError::InvalidIsotopologue {
                    name: isotopologue.name.clone(),
                    mass: isotopologue.molecular_mass,
                });
            }
        }

        let isotopes = self.isotopes.unwrap_or_else(|| vec![0; count]);
        if isotopes.len() != count {
            return Err(LineListError::ColumnLength {
                column: "isotopes",
                expected: count,
                actual: isotopes.len(),
            });
        }
        if let Some(line) = isotopes
            .iter()
            .position(|isotope| *isotope >= isotopologues.len())
        {
            return Err(LineListError::UnknownIsotope {
                line,
                isotope: isotopes[line],
                available: isotopologues.len(),
            });
        }

        Ok(LineList {
            centers: self.centers,
            log_reference_strengths: reference_strengths.iter().map(|value| value.ln()).collect(),
            lower_state_energies,
            einstein_a,
            reference_broadening,
            temperature_exponents,
            isotopes,
            isotopologues,
        })
    }
}

fn check_column(
    column: &'static str,
    values: &[f64],
    requirement: &'static str,
    accept: impl Fn(f64) -> bool,
) -> Result<(), LineListError> {
    match values
        .iter()
        .position(|value| !value.is_finite() || !accept(*value))
    {
        Some(line) => Err(LineListError::InvalidValue {
            line,
            column,
            requirement,
            value: values[line],
        }),
        None => Ok(()),
    }
}

impl LineList {
    /// Starts a line list from centers (cm^-1) and `S(Tref)` (cm/molecule).
    pub fn builder(centers: Vec<f64>, reference_strengths: Vec<f64>) -> LineListBuilder {
        LineListBuilder {
            centers,
            reference_strengths,
            lower_state_energies: None,
            einstein_a: None,
            reference_broadening: None,
            temperature_exponents: None,
            isotopologues: Vec::new(),
            isotopes: None,
        }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn log_reference_strengths(&self) -> &[f64] {
        &self.log_reference_strengths
    }

    pub fn lower_state_energies(&self) -> &[f64] {
        &self.lower_state_energies
    }

    pub fn einstein_a(&self) -> &[f64] {
        &self.einstein_a
    }

    pub fn reference_broadening(&self) -> &[f64] {
        &self.reference_broadening
    }

    pub fn temperature_exponents(&self) -> &[f64] {
        &self.temperature_exponents
    }

    pub fn isotopes(&self) -> &[usize] {
        &self.isotopes
    }

    pub fn isotopologues(&self) -> &[Isotopologue] {
        &self.isotopologues
    }

    pub fn reference_strength(&self, line: usize) -> f64 {
        self.log_reference_strengths[line].exp()
    }

    /// Keeps the lines at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<Self, LineListError> {
        if indices.is_empty() {
            return Err(LineListError::NothingRetained);
        }
        let pick = |values: &[f64]| indices.iter().map(|index| values[*index]).collect::<Vec<_>>();

        Ok(Self {
            centers: pick(&self.centers),
            log_reference_strengths: pick(&self.log_reference_strengths),
            lower_state_energies: pick(&self.lower_state_energies),
            einstein_a: pick(&self.einstein_a),
            reference_broadening: pick(&self.reference_broadening),
            temperature_exponents: pick(&self.temperature_exponents),
            isotopes: indices.iter().map(|index| self.isotopes[*index]).collect(),
            isotopologues: self.isotopologues.clone(),
        })
    }

    /// Keeps lines with `min - margin <= center <= max + margin`.
    pub fn retain_wavenumber_range(
        &self,
        min: f64,
        max: f64,
        margin: f64,
    ) -> Result<Self, LineListError> {
        let indices: Vec<usize> = self
            .centers
            .iter()
            .enumerate()
            .filter(|(_, center)| **center >= min - margin && **center <= max + margin)
            .map(|(index, _)| index)
            .collect();
        tracing::debug!(
            kept = indices.len(),
            dropped = self.len() - indices.len(),
            "wavenumber range filter"
        );
        self.select(&indices)
    }

    /// Drops lines whose strength at the typical temperature does not exceed
    /// the threshold.
    pub fn filter_by_strength(
        &self,
        filter: &StrengthFilter,
        partition: &dyn PartitionFunction,
    ) -> Result<Self, LineListError> {
        if !filter.is_active() {
            return Ok(self.clone());
        }

        let temperature = filter.typical_temperature;
        let ratios = (0..self.isotopologues.len())
            .map(|isotope| partition.ratio(isotope, temperature))
            .collect::<Result<Vec<_>, _>>()?;

        let indices: Vec<usize> = (0..self.len())
            .filter(|line| {
                line_strength(
                    self.log_reference_strengths[*line],
                    self.centers[*line],
                    self.lower_state_energies[*line],
                    temperature,
                    ratios[self.isotopes[*line]],
                ) > filter.threshold
            })
            .collect();
        tracing::debug!(
            kept = indices.len(),
            dropped = self.len() - indices.len(),
            threshold = filter.threshold,
            typical_temperature = temperature,
            "line strength filter"
        );
        self.select(&indices)
    }
}

impl TryFrom<LineListData> for LineList {
    type Error = LineListError;

    fn try_from(data: LineListData) -> Result<Self, Self::Error> {
        let mut builder = LineList::builder(data.centers, data.reference_strengths);
        builder.lower_state_energies = data.lower_state_energies;
        builder.einstein_a = data.einstein_a;
        builder.reference_broadening = data.reference_broadening;
        builder.temperature_exponents = data.temperature_exponents;
        builder.isotopologues = data.isotopologues;
        builder.isotopes = data.isotopes;
        builder.build()
    }
}
