//! Configuration for the bound pass

use crate::bounds::{BOUND_SENTINEL, RADIUS_MARGIN};
use crate::{BoundsError, Result};
use serde::{Deserialize, Serialize};

/// Tuning for bounding box computation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Multiplier on the largest 1-sigma scale (default: 2.0)
    pub radius_margin: f32,
    /// Initial extent of an empty box (default: 1e6)
    pub sentinel: f32,
    /// Run columns on the rayon pool when the `parallel` feature is enabled
    pub parallel: bool,
    /// Grids narrower than this run sequentially (default: 64)
    pub min_parallel_columns: usize,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            radius_margin: RADIUS_MARGIN,
            sentinel: BOUND_SENTINEL,
            parallel: true,
            min_parallel_columns: 64,
        }
    }
}

impl BoundsConfig {
    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius_margin.is_finite() || self.radius_margin <= 0.0 {
            return Err(BoundsError::InvalidConfig(format!(
                "radius_margin must be positive and finite, got {}",
                self.radius_margin
            )));
        }
        if !self.sentinel.is_finite() || self.sentinel <= 0.0 {
            return Err(BoundsError::InvalidConfig(format!(
                "sentinel must be positive and finite, got {}",
                self.sentinel
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = BoundsConfig::default();
        assert_eq!(config.radius_margin, 2.0);
        assert_eq!(config.sentinel, 1e6);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = BoundsConfig::from_json(r#"{ "parallel": false }"#).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.radius_margin, 2.0);
        assert_eq!(config.min_parallel_columns, 64);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let err = BoundsConfig::from_json(r#"{ "radius_margin": -1.0 }"#).unwrap_err();
        assert!(err.to_string().contains("radius_margin"));

        let err = BoundsConfig::from_json(r#"{ "sentinel": 0.0 }"#).unwrap_err();
        assert!(err.to_string().contains("sentinel"));
    }

    #[test]
    fn test_from_json_reports_syntax_errors() {
        let err = BoundsConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, BoundsError::Json(_)));
    }
}
