//! Partition-function collaborators.
//!
//! Line strengths need `q(T) = Q(T) / Q(Tref)` per isotopologue; the synthesis
//! core only sees this trait.

use super::errors::ModitError;
use crate::common::constants::REFERENCE_TEMPERATURE;
use crate::numerics::interpolate_linear;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartitionFunctionError {
    #[error("isotope {isotope} has no partition function table ({available} tables available)")]
    UnknownIsotope { isotope: usize, available: usize },
    #[error(
        "temperature {temperature} K is outside the partition table of isotope {isotope} ({min} -- {max} K)"
    )]
    TemperatureOutOfRange {
        isotope: usize,
        temperature: f64,
        min: f64,
        max: f64,
    },
    #[error("partition table for isotope {isotope} is invalid: {reason}")]
    InvalidTable { isotope: usize, reason: String },
    #[error("partition ratio for isotope {isotope} at {temperature} K must be finite and > 0, got {value}")]
    InvalidRatio {
        isotope: usize,
        temperature: f64,
        value: f64,
    },
}

impl From<PartitionFunctionError> for ModitError {
    fn from(error: PartitionFunctionError) -> Self {
        ModitError::input_validation("INPUT.PARTITION_FUNCTION", error.to_string())
    }
}

pub trait PartitionFunction: Send + Sync + Debug {
    /// Partition function ratio `Q(T) / Q(Tref)` of one isotopologue.
    fn ratio(&self, isotope: usize, temperature: f64) -> Result<f64, PartitionFunctionError>;
}

/// Temperature-independent partition function; `q(T) = 1` for every isotope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitPartitionFunction;

impl PartitionFunction for UnitPartitionFunction {
    fn ratio(&self, _isotope: usize, _temperature: f64) -> Result<f64, PartitionFunctionError> {
        Ok(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PartitionTable {
    pub temperatures: Vec<f64>,
    pub values: Vec<f64>,
}

impl PartitionTable {
    pub fn new(temperatures: Vec<f64>, values: Vec<f64>) -> Self {
        Self {
            temperatures,
            values,
        }
    }

    fn validate(&self, isotope: usize) -> Result<(), PartitionFunctionError> {
        let invalid = |reason: String| PartitionFunctionError::InvalidTable { isotope, reason };

        if self.temperatures.len() < 2 {
            return Err(invalid(format!(
                "at least 2 temperatures are required, got {}",
                self.temperatures.len()
            )));
        }
        if self.temperatures.len() != self.values.len() {
            return Err(invalid(format!(
                "{} temperatures but {} values",
                self.temperatures.len(),
                self.values.len()
            )));
        }
        if let Some(index) = self
            .temperatures
            .windows(2)
            .position(|window| !(window[1] > window[0]))
        {
            return Err(invalid(format!(
                "temperatures must be strictly increasing at index {}",
                index + 1
            )));
        }
        if let Some(index) = self
            .values
            .iter()
            .position(|value| !value.is_finite() || *value <= 0.0)
        {
            return Err(invalid(format!(
                "partition value at index {index} must be finite and > 0"
            )));
        }
        if !self.covers(REFERENCE_TEMPERATURE) {
            return Err(invalid(format!(
                "table does not cover the reference temperature {REFERENCE_TEMPERATURE} K"
            )));
        }

        Ok(())
    }

    fn covers(&self, temperature: f64) -> bool {
        match (self.temperatures.first(), self.temperatures.last()) {
            (Some(min), Some(max)) => temperature >= *min && temperature <= *max,
            _ => false,
        }
    }

    fn interpolate(&self, temperature: f64) -> Option<f64> {
        interpolate_linear(temperature, &self.temperatures, &self.values)
    }
}

/// Tabulated `Q(T)` per isotopologue, linearly interpolated in temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedPartitionFunction {
    tables: Vec<PartitionTable>,
    reference_values: Vec<f64>,
}

impl TabulatedPartitionFunction {
    pub fn new(tables: Vec<PartitionTable>) -> Result<Self, PartitionFunctionError> {
        let mut reference_values = Vec::with_capacity(tables.len());
        for (isotope, table) in tables.iter().enumerate() {
            table.validate(isotope)?;
            let reference = table.interpolate(REFERENCE_TEMPERATURE).ok_or_else(|| {
                PartitionFunctionError::InvalidTable {
                    isotope,
                    reason: "reference temperature could not be interpolated".to_string(),
                }
            })?;
            reference_values.push(reference);
        }

        Ok(Self {
            tables,
            reference_values,
        })
    }

    pub fn isotope_count(&self) -> usize {
        self.tables.len()
    }

    pub fn partition_sum(
        &self,
        isotope: usize,
        temperature: f64,
    ) -> Result<f64, PartitionFunctionError> {
        let table = self
            .tables
            .get(isotope)
            .ok_or(PartitionFunctionError::UnknownIsotope {
                isotope,
                available: self.tables.len(),
            })?;

        if !table.covers(temperature) {
            return Err(PartitionFunctionError::TemperatureOutOfRange {
                isotope,
                temperature,
                min: table.temperatures[0],
                max: table.temperatures[table.temperatures.len() - 1],
            });
        }

        table
            .interpolate(temperature)
            .ok_or_else(|| PartitionFunctionError::InvalidTable {
                isotope,
                reason: format!("interpolation failed at {temperature} K"),
            })
    }
}

impl PartitionFunction for TabulatedPartitionFunction {
    fn ratio(&self, isotope: usize, temperature: f64) -> Result<f64, PartitionFunctionError> {
        let value = self.partition_sum(isotope, temperature)? / self.reference_values[isotope];
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(PartitionFunctionError::InvalidRatio {
                isotope,
                temperature,
                value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PartitionFunction, PartitionFunctionError, PartitionTable, TabulatedPartitionFunction,
        UnitPartitionFunction,
    };

    fn linear_table() -> PartitionTable {
        PartitionTable::new(vec![100.0, 296.0, 1000.0, 3000.0], vec![40.0, 107.0, 360.0, 1100.0])
    }

    #[test]
    fn unit_partition_function_is_always_one() {
        assert_eq!(UnitPartitionFunction.ratio(3, 1234.0), Ok(1.0));
    }

    #[test]
    fn tabulated_ratio_is_one_at_reference_temperature() {
        let partition = TabulatedPartitionFunction::new(vec![linear_table()]).expect("table");
        let ratio = partition.ratio(0, 296.0).expect("ratio");
        assert!((ratio - 1.0).abs() < 1.0e-15);
    }

    #[test]
    fn tabulated_ratio_interpolates_between_nodes() {
        let partition = TabulatedPartitionFunction::new(vec![linear_table()]).expect("table");
        let ratio = partition.ratio(0, 2000.0).expect("ratio");
        assert!((ratio - 730.0 / 107.0).abs() < 1.0e-12);
    }

    #[test]
    fn tabulated_ratio_rejects_out_of_table_temperatures() {
        let partition = TabulatedPartitionFunction::new(vec![linear_table()]).expect("table");
        let error = partition.ratio(0, 3500.0).expect_err("outside table");
        assert!(matches!(
            error,
            PartitionFunctionError::TemperatureOutOfRange { isotope: 0, .. }
        ));

        let error = partition.ratio(1, 500.0).expect_err("unknown isotope");
        assert_eq!(
            error,
            PartitionFunctionError::UnknownIsotope {
                isotope: 1,
                available: 1
            }
        );
    }

    #[test]
    fn table_validation_rejects_unsorted_or_uncovering_tables() {
        let unsorted = PartitionTable::new(vec![100.0, 500.0, 300.0], vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            TabulatedPartitionFunction::new(vec![unsorted]),
            Err(PartitionFunctionError::InvalidTable { isotope: 0, .. })
        ));

        let hot_only = PartitionTable::new(vec![500.0, 1000.0], vec![2.0, 3.0]);
        assert!(matches!(
            TabulatedPartitionFunction::new(vec![hot_only]),
            Err(PartitionFunctionError::InvalidTable { isotope: 0, .. })
        ));
    }
}
