use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::ml::BoostingParams;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub boosting: BoostingParams,
    pub training: TrainingSettings,
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(raw).map_err(|e| PipelineError::Config {
            reason: e.to_string(),
        })?;
        config.validate().map_err(|errors| PipelineError::Config {
            reason: errors.join("; "),
        })?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&raw)?;
        info!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = match self.boosting.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        if !(self.training.test_fraction >= 0.0 && self.training.test_fraction < 1.0) {
            errors.push(format!(
                "test_fraction must be in [0, 1), got {}",
                self.training.test_fraction
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Below this many rows `train` still succeeds but attaches a warning.
    pub min_recommended_samples: usize,
    /// Bars ahead whose close is the regression target.
    pub target_horizon: usize,
    /// Share of the newest rows held out by the CLI for evaluation.
    pub test_fraction: f64,
    pub drop_warmup: bool,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            min_recommended_samples: 50,
            target_horizon: 1,
            test_fraction: 0.2,
            drop_warmup: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.boosting.n_estimators, 500);
        assert_eq!(config.training.min_recommended_samples, 50);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [boosting]
            n_estimators = 100
            max_depth = 4

            [training]
            target_horizon = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.boosting.n_estimators, 100);
        assert_eq!(config.boosting.max_depth, 4);
        assert_eq!(config.boosting.learning_rate, 0.1);
        assert_eq!(config.training.target_horizon, 5);
        assert!(config.training.drop_warmup);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [boosting]
            subsample = 0.0
            [training]
            test_fraction = 1.0
            "#,
        )
        .unwrap_err();
        match err {
            PipelineError::Config { reason } => {
                assert!(reason.contains("subsample"));
                assert!(reason.contains("test_fraction"));
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            PipelineConfig::from_toml_str("boosting = ["),
            Err(PipelineError::Config { .. })
        ));
        assert!(PipelineConfig::from_file("/nonexistent/pipeline.toml").is_err());
    }
}
