use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::features::{FeatureTable, FeatureVector};
use super::metrics::{EvaluationMetrics, TrainingMetrics};
use super::pipeline::{ModelDescription, RegressionPipeline, TrainedModel};
use crate::error::Result;
use crate::types::{BarSeries, Frame};

/// A [`RegressionPipeline`] shared between async tasks.
///
/// One `train` runs at a time and excludes every reader for its whole
/// duration. Predictions take the read lock only long enough to grab the
/// current model, then compute without holding it.
#[derive(Clone)]
pub struct SharedPipeline {
    inner: Arc<RwLock<RegressionPipeline>>,
}

impl SharedPipeline {
    pub fn new(pipeline: RegressionPipeline) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pipeline)),
        }
    }

    /// Fit on a blocking thread while holding the write lock.
    pub async fn train(&self, features: FeatureTable, target: Vec<f64>) -> Result<TrainingMetrics> {
        let mut guard = self.inner.clone().write_owned().await;
        let metrics = tokio::task::spawn_blocking(move || guard.train(&features, &target)).await??;

        info!("Shared pipeline swapped in a model trained on {} samples", metrics.sample_count);
        Ok(metrics)
    }

    pub async fn snapshot(&self) -> Result<Arc<TrainedModel>> {
        self.inner.read().await.snapshot()
    }

    pub async fn is_trained(&self) -> bool {
        self.inner.read().await.is_trained()
    }

    pub async fn predict(&self, frame: Frame) -> Result<Vec<f64>> {
        let model = self.snapshot().await?;
        tokio::task::spawn_blocking(move || model.predict_frame(&frame)).await?
    }

    pub async fn predict_series(&self, series: BarSeries) -> Result<Vec<f64>> {
        let model = self.snapshot().await?;
        tokio::task::spawn_blocking(move || model.predict_series(&series)).await?
    }

    pub async fn predict_vector(&self, features: FeatureVector) -> Result<f64> {
        self.snapshot().await?.predict_vector(&features)
    }

    pub async fn evaluate(&self, features: FeatureTable, target: Vec<f64>) -> Result<EvaluationMetrics> {
        let model = self.snapshot().await?;
        tokio::task::spawn_blocking(move || model.evaluate(&features, &target)).await?
    }

    pub async fn feature_importance(&self) -> Result<Vec<(String, f64)>> {
        self.inner.read().await.feature_importance()
    }

    pub async fn describe(&self) -> ModelDescription {
        self.inner.read().await.describe()
    }
}

impl From<RegressionPipeline> for SharedPipeline {
    fn from(pipeline: RegressionPipeline) -> Self {
        Self::new(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::PipelineError;
    use crate::ml::{assemble, BoostingParams};
    use crate::types::PriceBar;

    fn series(n: usize, start: f64) -> BarSeries {
        (0..n)
            .map(|i| {
                let close = start + i as f64;
                PriceBar::new(close, close + 1.0, close - 1.0, close, 1_000_000.0)
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn quick_pipeline() -> RegressionPipeline {
        let config = PipelineConfig {
            boosting: BoostingParams {
                n_estimators: 40,
                ..BoostingParams::default()
            },
            ..PipelineConfig::default()
        };
        RegressionPipeline::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_predict_before_train() {
        let shared = SharedPipeline::new(quick_pipeline());
        assert!(!shared.is_trained().await);
        let err = shared.predict_series(series(3, 100.0)).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotTrained));
        assert!(!shared.describe().await.is_trained);
    }

    #[tokio::test]
    async fn test_train_then_predict() {
        let shared = SharedPipeline::new(quick_pipeline());
        let bars = series(30, 100.0);

        let metrics = shared.train(assemble(&bars), bars.closes()).await.unwrap();
        assert_eq!(metrics.sample_count, 30);
        assert!(shared.is_trained().await);

        let predictions = shared.predict(bars.to_frame()).await.unwrap();
        assert_eq!(predictions.len(), 30);
        assert_eq!(shared.feature_importance().await.unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_snapshot_survives_retrain() {
        let shared = SharedPipeline::new(quick_pipeline());
        let first = series(30, 100.0);
        shared.train(assemble(&first), first.closes()).await.unwrap();

        let snapshot = shared.snapshot().await.unwrap();
        let query = series(5, 110.0);
        let before = snapshot.predict_series(&query).unwrap();

        let second = series(30, 500.0);
        shared.train(assemble(&second), second.closes()).await.unwrap();

        assert_eq!(snapshot.predict_series(&query).unwrap(), before);
        assert!(!Arc::ptr_eq(&snapshot, &shared.snapshot().await.unwrap()));
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_a_whole_model() {
        let shared = SharedPipeline::new(quick_pipeline());
        let bars = series(30, 100.0);
        shared.train(assemble(&bars), bars.closes()).await.unwrap();

        let query = series(4, 105.0);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let shared = shared.clone();
            let query = query.clone();
            handles.push(tokio::spawn(async move { shared.predict_series(query).await }));
        }
        let retrain = {
            let shared = shared.clone();
            let bars = bars.clone();
            tokio::spawn(async move { shared.train(assemble(&bars), bars.closes()).await })
        };

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        retrain.await.unwrap().unwrap();

        // retraining on identical data is deterministic
        for r in &results {
            assert_eq!(r, &results[0]);
        }
    }

    #[test]
    fn test_describe_from_sync_code() {
        let shared = SharedPipeline::from(quick_pipeline());
        let description = tokio_test::block_on(shared.describe());
        assert_eq!(description.n_features, 11);
        assert_eq!(description.hyperparameters.n_estimators, 40);
    }

    #[tokio::test]
    async fn test_failed_train_is_reported() {
        let shared = SharedPipeline::new(quick_pipeline());
        let err = shared.train(FeatureTable::default(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
        assert!(!shared.is_trained().await);
    }
}
