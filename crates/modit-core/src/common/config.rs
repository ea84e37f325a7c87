//! JSON configuration and input documents.

use crate::domain::{
    AtmosphereData, AtmosphereProfile, ExecutionMode, LineList, LineListData, ModitError,
    PartitionTable, StrengthFilter, TabulatedPartitionFunction,
};
use crate::modules::broadening::BroadeningGridPolicy;
use crate::modules::synthesis::{NegativeValuePolicy, SynthesisOptions};
use crate::modules::wavenumber::{SpectralUnit, WavenumberGrid};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GRID_TOLERANCE: f64 = 1.0e-9;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {what} '{}': {source}", path.display())]
    Read {
        what: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {what} '{}': {source}", path.display())]
    Parse {
        what: &'static str,
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid {what}: {message}")]
    Invalid { what: &'static str, message: String },
}

impl From<ConfigError> for ModitError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Invalid { .. } => {
                ModitError::input_validation("INPUT.CONFIG", error.to_string())
            }
            ConfigError::Read { .. } | ConfigError::Parse { .. } => {
                ModitError::io_system("IO.CONFIG", error.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WavenumberGridConfig {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub unit: SpectralUnit,
    /// Explicit grid points in cm^-1; overrides the bounds when present.
    #[serde(default)]
    pub points: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisConfig {
    pub wavenumber_grid: WavenumberGridConfig,
    #[serde(default)]
    pub broadening: BroadeningGridPolicy,
    #[serde(default)]
    pub strength_filter: StrengthFilter,
    #[serde(default)]
    pub negative_values: NegativeValuePolicy,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default = "default_grid_tolerance")]
    pub grid_tolerance: f64,
}

fn default_grid_tolerance() -> f64 {
    DEFAULT_GRID_TOLERANCE
}

impl SynthesisConfig {
    pub fn new(wavenumber_grid: WavenumberGridConfig) -> Self {
        Self {
            wavenumber_grid,
            broadening: BroadeningGridPolicy::default(),
            strength_filter: StrengthFilter::default(),
            negative_values: NegativeValuePolicy::default(),
            execution_mode: ExecutionMode::default(),
            grid_tolerance: DEFAULT_GRID_TOLERANCE,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            what: "synthesis config",
            message,
        };

        self.broadening
            .validate()
            .map_err(|error| invalid(error.to_string()))?;
        self.negative_values
            .validate()
            .map_err(|error| invalid(error.message().to_string()))?;
        let typical = self.strength_filter.typical_temperature;
        if !typical.is_finite() || typical <= 0.0 {
            return Err(invalid(format!(
                "strengthFilter.typicalTemperature must be finite and > 0, got {typical}"
            )));
        }
        if !self.strength_filter.threshold.is_finite() {
            return Err(invalid(format!(
                "strengthFilter.threshold must be finite, got {}",
                self.strength_filter.threshold
            )));
        }
        if !self.grid_tolerance.is_finite() || self.grid_tolerance <= 0.0 {
            return Err(invalid(format!(
                "gridTolerance must be finite and > 0, got {}",
                self.grid_tolerance
            )));
        }
        self.wavenumber_grid()?;
        Ok(())
    }

    pub fn wavenumber_grid(&self) -> Result<WavenumberGrid, ConfigError> {
        let grid = &self.wavenumber_grid;
        let built = match &grid.points {
            Some(points) => WavenumberGrid::from_points(points.clone(), self.grid_tolerance),
            None => WavenumberGrid::from_spectral_range(grid.start, grid.end, grid.count, grid.unit),
        };
        built.map_err(|error| ConfigError::Invalid {
            what: "wavenumberGrid",
            message: error.to_string(),
        })
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            broadening: self.broadening,
            negative_values: self.negative_values,
            execution_mode: self.execution_mode,
        }
    }
}

fn load_json_document<T: DeserializeOwned>(
    path: &Path,
    what: &'static str,
) -> Result<T, ConfigError> {
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        what,
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
        what,
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_synthesis_config(path: impl AsRef<Path>) -> Result<SynthesisConfig, ConfigError> {
    let config: SynthesisConfig = load_json_document(path.as_ref(), "synthesis config")?;
    config.validate()?;
    Ok(config)
}

pub fn load_line_list(path: impl AsRef<Path>) -> Result<LineList, ModitError> {
    let data: LineListData = load_json_document(path.as_ref(), "line list")?;
    Ok(LineList::try_from(data)?)
}

pub fn load_atmosphere(path: impl AsRef<Path>) -> Result<AtmosphereProfile, ModitError> {
    let data: AtmosphereData = load_json_document(path.as_ref(), "atmosphere profile")?;
    Ok(AtmosphereProfile::try_from(data)?)
}

/// Reads a JSON array of per-isotopologue `{temperatures, values}` tables.
pub fn load_partition_tables(
    path: impl AsRef<Path>,
) -> Result<TabulatedPartitionFunction, ModitError> {
    let tables: Vec<PartitionTable> = load_json_document(path.as_ref(), "partition tables")?;
    Ok(TabulatedPartitionFunction::new(tables)?)
}
