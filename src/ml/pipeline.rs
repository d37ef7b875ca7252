use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::features::{assemble, FeatureTable, FeatureVector};
use super::gbm::{BoostingParams, GradientBoostedRegressor};
use super::metrics::{EvaluationMetrics, RegressionScores, TrainingMetrics, TrainingWarning};
use super::scaler::StandardScaler;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::types::{BarSeries, Frame};

pub const MODEL_NAME: &str = "Stock Price Predictor";
pub const MODEL_TYPE: &str = "regression";
pub const ALGORITHM: &str = "GradientBoostedTrees";

/// Static and state summary of a pipeline; available whether trained or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub name: String,
    pub model_type: String,
    pub algorithm: String,
    pub hyperparameters: BoostingParams,
    pub feature_names: Vec<String>,
    pub n_features: usize,
    pub is_trained: bool,
}

/// A fitted scaler and regressor that are only ever replaced together.
///
/// Immutable once built, so readers can hold it through an `Arc` while a new
/// model is trained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    scaler: StandardScaler,
    regressor: GradientBoostedRegressor,
    feature_names: Vec<String>,
    metrics: TrainingMetrics,
}

impl TrainedModel {
    pub fn fit(config: &PipelineConfig, features: &FeatureTable, target: &[f64]) -> Result<Self> {
        let n = features.len();
        if n == 0 {
            return Err(PipelineError::invalid("training table has no rows"));
        }
        if target.len() != n {
            return Err(PipelineError::invalid(format!(
                "training table has {} rows but target has {} values",
                n,
                target.len()
            )));
        }
        if !features.is_finite() {
            return Err(PipelineError::invalid("training table contains non-finite values"));
        }
        if let Some(i) = target.iter().position(|y| !y.is_finite()) {
            return Err(PipelineError::invalid(format!("target value at row {} is not finite", i)));
        }

        let matrix = features.to_matrix();
        let scaler = StandardScaler::fit(&matrix)?;
        let normalized = scaler.transform(&matrix)?;
        let regressor = GradientBoostedRegressor::fit(&normalized, target, &config.boosting)?;

        let fitted = regressor.predict(&normalized);
        let scores = RegressionScores::compute(target, &fitted);

        let mut warnings = Vec::new();
        let recommended = config.training.min_recommended_samples;
        if n < recommended {
            let warning = TrainingWarning::SmallSample {
                samples: n,
                recommended,
            };
            warn!("{}; model quality may be poor", warning);
            warnings.push(warning);
        }

        let metrics = TrainingMetrics {
            r2: scores.r2,
            rmse: scores.mse.sqrt(),
            mae: scores.mae,
            sample_count: n,
            feature_count: FeatureVector::NUM_FEATURES,
            warnings,
        };

        info!(
            "Regression model trained: {} samples, {} trees, r2={:.4}, rmse={:.4}, mae={:.4}",
            n,
            regressor.n_trees(),
            metrics.r2,
            metrics.rmse,
            metrics.mae
        );

        Ok(Self {
            scaler,
            regressor,
            feature_names: FeatureVector::feature_names(),
            metrics,
        })
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_matrix(&self, matrix: &Array2<f64>) -> Result<Vec<f64>> {
        let normalized = self.scaler.transform(matrix)?;
        Ok(self.regressor.predict(&normalized))
    }

    /// Predict from a boundary frame carrying `Open, High, Low, Close, Volume`.
    pub fn predict_frame(&self, frame: &Frame) -> Result<Vec<f64>> {
        if frame.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let series = BarSeries::from_frame(frame)?;
        self.predict_series(&series)
    }

    pub fn predict_series(&self, series: &BarSeries) -> Result<Vec<f64>> {
        if series.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let table = assemble(series);

        let warmup = table.warmup_rows();
        if warmup == table.len() {
            warn!(
                "all {} rows fall inside the indicator warm-up; predictions rely on fallback features",
                warmup
            );
        } else if warmup > 0 {
            debug!("{} of {} rows use warm-up fallback features", warmup, table.len());
        }

        self.predict_matrix(&table.to_matrix())
    }

    pub fn predict_features(&self, table: &FeatureTable) -> Result<Vec<f64>> {
        if table.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        if !table.is_finite() {
            return Err(PipelineError::invalid("feature table contains non-finite values"));
        }
        self.predict_matrix(&table.to_matrix())
    }

    pub fn predict_vector(&self, features: &FeatureVector) -> Result<f64> {
        let values = Array1::from(features.to_array().to_vec());
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::invalid("feature vector contains non-finite values"));
        }
        let normalized = Array1::from(self.scaler.transform_row(values.view()));
        Ok(self.regressor.predict_row(normalized.view()))
    }

    pub fn evaluate(&self, features: &FeatureTable, target: &[f64]) -> Result<EvaluationMetrics> {
        if target.len() != features.len() {
            return Err(PipelineError::invalid(format!(
                "evaluation table has {} rows but target has {} values",
                features.len(),
                target.len()
            )));
        }
        let predictions = self.predict_features(features)?;
        Ok(EvaluationMetrics::compute(target, &predictions))
    }

    /// Feature names with normalised gain, highest first.
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.regressor.feature_importance())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Feature standardization plus boosted regression behind one train/predict
/// surface.
///
/// Starts untrained. A successful [`train`](Self::train) swaps in a complete
/// new model; a failed one leaves the previous model untouched.
#[derive(Debug, Clone, Default)]
pub struct RegressionPipeline {
    config: PipelineConfig,
    model: Option<Arc<TrainedModel>>,
}

impl RegressionPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate().map_err(|errors| PipelineError::Config {
            reason: errors.join("; "),
        })?;
        Ok(Self {
            config,
            model: None,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// The current model, shared. Callers keep a consistent view even if the
    /// pipeline is retrained afterwards.
    pub fn snapshot(&self) -> Result<Arc<TrainedModel>> {
        self.model.clone().ok_or(PipelineError::NotTrained)
    }

    fn trained(&self) -> Result<&TrainedModel> {
        self.model.as_deref().ok_or(PipelineError::NotTrained)
    }

    pub fn train(&mut self, features: &FeatureTable, target: &[f64]) -> Result<TrainingMetrics> {
        let model = TrainedModel::fit(&self.config, features, target)?;
        let metrics = model.metrics.clone();
        self.model = Some(Arc::new(model));
        Ok(metrics)
    }

    /// Train from a frame holding the eleven named feature columns.
    pub fn train_frame(&mut self, frame: &Frame, target: &[f64]) -> Result<TrainingMetrics> {
        let features = FeatureTable::from_frame(frame)?;
        self.train(&features, target)
    }

    pub fn last_metrics(&self) -> Option<&TrainingMetrics> {
        self.model.as_deref().map(TrainedModel::metrics)
    }

    pub fn predict(&self, frame: &Frame) -> Result<Vec<f64>> {
        self.trained()?.predict_frame(frame)
    }

    pub fn predict_series(&self, series: &BarSeries) -> Result<Vec<f64>> {
        self.trained()?.predict_series(series)
    }

    pub fn predict_features(&self, table: &FeatureTable) -> Result<Vec<f64>> {
        self.trained()?.predict_features(table)
    }

    pub fn predict_vector(&self, features: &FeatureVector) -> Result<f64> {
        self.trained()?.predict_vector(features)
    }

    pub fn evaluate(&self, features: &FeatureTable, target: &[f64]) -> Result<EvaluationMetrics> {
        self.trained()?.evaluate(features, target)
    }

    pub fn feature_importance(&self) -> Result<Vec<(String, f64)>> {
        Ok(self.trained()?.feature_importance())
    }

    pub fn describe(&self) -> ModelDescription {
        ModelDescription {
            name: MODEL_NAME.to_string(),
            model_type: MODEL_TYPE.to_string(),
            algorithm: ALGORITHM.to_string(),
            hyperparameters: self.config.boosting.clone(),
            feature_names: FeatureVector::feature_names(),
            n_features: FeatureVector::NUM_FEATURES,
            is_trained: self.is_trained(),
        }
    }
}
