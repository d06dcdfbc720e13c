//! Run configuration for the forward model.
//!
//! Everything that changes the numbers but is not part of the star itself:
//! radiation constants, the brightness-to-temperature scale, quadrature
//! tolerances and the visibility and weighting policies. Stored as JSON; any
//! field left out of the file takes its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::geometry::VisibilityModel;
use crate::phases::BrightnessWeighting;
use crate::photometry::{QuadratureTolerance, RadiationConstants, TemperatureScale};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardModelConfig {
    pub radiation: RadiationConstants,
    pub temperature_scale: TemperatureScale,
    pub quadrature: QuadratureTolerance,
    pub visibility: VisibilityModel,
    pub brightness_weighting: BrightnessWeighting,
}

impl ForwardModelConfig {
    /// Check that every value is usable before any integration starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.radiation.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "radiation constants must be positive and finite: {:?}",
                self.radiation
            )));
        }

        let sigma = self.temperature_scale.sigma;
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "temperature scale sigma must be positive and finite, got {sigma}"
            )));
        }

        let q = &self.quadrature;
        if !(q.absolute >= 0.0 && q.relative >= 0.0) || (q.absolute == 0.0 && q.relative == 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "quadrature tolerances must be non-negative and not both zero, got absolute {} relative {}",
                q.absolute, q.relative
            )));
        }
        if q.max_subdivisions == 0 {
            return Err(ConfigError::Invalid(
                "quadrature needs at least one subdivision".to_string(),
            ));
        }

        Ok(())
    }

    /// Load and validate a JSON config
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = ForwardModelConfig::default();
        config.validate().unwrap();
        assert_eq!(config.radiation, RadiationConstants::NORMALIZED);
        assert_eq!(config.temperature_scale.sigma, 1.0);
        assert_eq!(config.visibility, VisibilityModel::BackFaceCulled);
        assert_eq!(config.brightness_weighting, BrightnessWeighting::Final);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        let config = ForwardModelConfig {
            visibility: VisibilityModel::Literal,
            brightness_weighting: BrightnessWeighting::PerPhase,
            temperature_scale: TemperatureScale { sigma: 0.5 },
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = ForwardModelConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "visibility": "literal" }"#).unwrap();

        let loaded = ForwardModelConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded.visibility, VisibilityModel::Literal);
        assert_eq!(loaded.quadrature, QuadratureTolerance::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = ForwardModelConfig {
            temperature_scale: TemperatureScale { sigma: 0.0 },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ForwardModelConfig {
            quadrature: QuadratureTolerance {
                absolute: 0.0,
                relative: 0.0,
                max_subdivisions: 50,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "radiation": { "planck": -1.0, "speed_of_light": 1.0, "boltzmann": 1.0 } }"#)
            .unwrap();
        assert!(matches!(
            ForwardModelConfig::from_json_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_and_io_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ForwardModelConfig::from_json_file(&path),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ForwardModelConfig::from_json_file(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
