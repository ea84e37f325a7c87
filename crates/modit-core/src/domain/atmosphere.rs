use super::errors::ModitError;
use crate::numerics::log_grid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AtmosphereError {
    #[error("atmosphere profile must contain at least one layer")]
    Empty,
    #[error("layer count mismatch: {temperatures} temperatures, {other} {what}")]
    LayerCountMismatch {
        what: &'static str,
        temperatures: usize,
        other: usize,
    },
    #[error("temperature of layer {layer} must be finite and > 0 K, got {value}")]
    InvalidTemperature { layer: usize, value: f64 },
    #[error("pressure of layer {layer} must be finite and > 0 bar, got {value}")]
    InvalidPressure { layer: usize, value: f64 },
    #[error("pressure delta of layer {layer} must be finite and >= 0 bar, got {value}")]
    InvalidPressureDelta { layer: usize, value: f64 },
    #[error("pressures must be strictly monotonic, layer {layer} breaks the ordering")]
    NonMonotonicPressure { layer: usize },
    #[error("pressure layers require 0 < top < bottom and at least 2 layers")]
    InvalidPressureRange,
}

impl From<AtmosphereError> for ModitError {
    fn from(error: AtmosphereError) -> Self {
        ModitError::input_validation("INPUT.ATMOSPHERE", error.to_string())
    }
}

/// Serialized form of an [`AtmosphereProfile`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtmosphereData {
    pub temperatures: Vec<f64>,
    pub pressures: Vec<f64>,
    #[serde(default)]
    pub pressure_deltas: Option<Vec<f64>>,
}

/// Ordered atmospheric layers; pressures in bar, temperatures in K.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphereProfile {
    temperatures: Vec<f64>,
    pressures: Vec<f64>,
    pressure_deltas: Option<Vec<f64>>,
}

impl AtmosphereProfile {
    pub fn new(temperatures: Vec<f64>, pressures: Vec<f64>) -> Result<Self, AtmosphereError> {
        if temperatures.is_empty() {
            return Err(AtmosphereError::Empty);
        }
        if temperatures.len() != pressures.len() {
            return Err(AtmosphereError::LayerCountMismatch {
                what: "pressures",
                temperatures: temperatures.len(),
                other: pressures.len(),
            });
        }
        for (layer, &value) in temperatures.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(AtmosphereError::InvalidTemperature { layer, value });
            }
        }
        for (layer, &value) in pressures.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(AtmosphereError::InvalidPressure { layer, value });
            }
        }
        validate_monotonic(&pressures)?;

        Ok(Self {
            temperatures,
            pressures,
            pressure_deltas: None,
        })
    }

    /// Isothermal layers at the given pressures.
    pub fn isothermal(temperature: f64, pressures: Vec<f64>) -> Result<Self, AtmosphereError> {
        Self::new(vec![temperature; pressures.len()], pressures)
    }

    /// `count` layers log-spaced from `top` to `bottom` (ascending pressure),
    /// with deltas `(1 - k) P` where `k` is the ratio between adjacent layers.
    pub fn log_pressure_layers(
        top: f64,
        bottom: f64,
        count: usize,
        temperature: impl Fn(f64) -> f64,
    ) -> Result<Self, AtmosphereError> {
        if !(top > 0.0) || !(bottom > top) {
            return Err(AtmosphereError::InvalidPressureRange);
        }
        let pressures = log_grid(top, bottom, count).ok_or(AtmosphereError::InvalidPressureRange)?;
        let ratio = (top / bottom).powf(1.0 / (count - 1) as f64);
        let deltas = pressures.iter().map(|pressure| (1.0 - ratio) * pressure).collect();
        let temperatures = pressures.iter().map(|pressure| temperature(*pressure)).collect();

        Self::new(temperatures, pressures)?.with_pressure_deltas(deltas)
    }

    /// Log-spaced layers with a power-law profile `T = t0 * P^alpha`.
    pub fn power_law(
        top: f64,
        bottom: f64,
        count: usize,
        t0: f64,
        alpha: f64,
    ) -> Result<Self, AtmosphereError> {
        Self::log_pressure_layers(top, bottom, count, |pressure| t0 * pressure.powf(alpha))
    }

    pub fn with_pressure_deltas(mut self, deltas: Vec<f64>) -> Result<Self, AtmosphereError> {
        if deltas.len() != self.temperatures.len() {
            return Err(AtmosphereError::LayerCountMismatch {
                what: "pressure deltas",
                temperatures: self.temperatures.len(),
                other: deltas.len(),
            });
        }
        if let Some(layer) = deltas
            .iter()
            .position(|value| !value.is_finite() || *value < 0.0)
        {
            return Err(AtmosphereError::InvalidPressureDelta {
                layer,
                value: deltas[layer],
            });
        }
        self.pressure_deltas = Some(deltas);
        Ok(self)
    }

    pub fn layer_count(&self) -> usize {
        self.temperatures.len()
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn pressures(&self) -> &[f64] {
        &self.pressures
    }

    pub fn pressure_deltas(&self) -> Option<&[f64]> {
        self.pressure_deltas.as_deref()
    }

    pub fn temperature(&self, layer: usize) -> f64 {
        self.temperatures[layer]
    }

    pub fn pressure(&self, layer: usize) -> f64 {
        self.pressures[layer]
    }
}

impl TryFrom<AtmosphereData> for AtmosphereProfile {
    type Error = AtmosphereError;

    fn try_from(data: AtmosphereData) -> Result<Self, Self::Error> {
        let profile = Self::new(data.temperatures, data.pressures)?;
        match data.pressure_deltas {
            Some(deltas) => profile.with_pressure_deltas(deltas),
            None => Ok(profile),
        }
    }
}

fn validate_monotonic(pressures: &[f64]) -> Result<(), AtmosphereError> {
    if pressures.len() < 2 {
        return Ok(());
    }

    let ascending = pressures[1] > pressures[0];
    for (offset, window) in pressures.windows(2).enumerate() {
        let ordered = if ascending {
            window[1] > window[0]
        } else {
            window[1] < window[0]
        };
        if !ordered {
            return Err(AtmosphereError::NonMonotonicPressure { layer: offset + 1 });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AtmosphereData, AtmosphereError, AtmosphereProfile};

    #[test]
    fn profile_rejects_layer_count_mismatch() {
        let error = AtmosphereProfile::new(vec![1000.0, 1100.0], vec![0.1]).expect_err("mismatch");
        assert_eq!(
            error,
            AtmosphereError::LayerCountMismatch {
                what: "pressures",
                temperatures: 2,
                other: 1
            }
        );
    }

    #[test]
    fn profile_accepts_either_monotonic_direction() {
        assert!(AtmosphereProfile::new(vec![900.0, 1000.0, 1100.0], vec![0.01, 0.1, 1.0]).is_ok());
        assert!(AtmosphereProfile::new(vec![1100.0, 1000.0, 900.0], vec![1.0, 0.1, 0.01]).is_ok());

        let error = AtmosphereProfile::new(vec![1000.0; 3], vec![0.01, 0.1, 0.1])
            .expect_err("repeated pressure");
        assert_eq!(error, AtmosphereError::NonMonotonicPressure { layer: 2 });
    }

    #[test]
    fn profile_rejects_non_physical_values() {
        assert!(matches!(
            AtmosphereProfile::new(vec![0.0], vec![1.0]),
            Err(AtmosphereError::InvalidTemperature { layer: 0, .. })
        ));
        assert!(matches!(
            AtmosphereProfile::new(vec![500.0], vec![f64::NAN]),
            Err(AtmosphereError::InvalidPressure { layer: 0, .. })
        ));
        assert_eq!(
            AtmosphereProfile::new(Vec::new(), Vec::new()),
            Err(AtmosphereError::Empty)
        );
    }

    #[test]
    fn power_law_profile_builds_log_spaced_layers_with_deltas() {
        let profile = AtmosphereProfile::power_law(1.0e-8, 1.0e2, 11, 1000.0, 0.1).expect("profile");
        assert_eq!(profile.layer_count(), 11);
        assert_eq!(profile.pressure(0), 1.0e-8);
        assert_eq!(profile.pressure(10), 1.0e2);
        assert!((profile.pressure(5) - 1.0e-3).abs() < 1.0e-15);
        assert!((profile.temperature(10) - 1000.0 * 100.0_f64.powf(0.1)).abs() < 1.0e-9);

        let deltas = profile.pressure_deltas().expect("deltas");
        assert!((deltas[10] - 0.9 * 100.0).abs() < 1.0e-9);
    }

    #[test]
    fn data_conversion_validates_deltas() {
        let data = AtmosphereData {
            temperatures: vec![1000.0, 1200.0],
            pressures: vec![0.1, 1.0],
            pressure_deltas: Some(vec![0.05]),
        };
        assert!(matches!(
            AtmosphereProfile::try_from(data),
            Err(AtmosphereError::LayerCountMismatch {
                what: "pressure deltas",
                ..
            })
        ));
    }
}
