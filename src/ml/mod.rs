pub mod dataset;
pub mod features;
pub mod gbm;
pub mod metrics;
pub mod pipeline;
pub mod scaler;
pub mod shared;
pub mod streaming;

pub use dataset::TrainingSet;
pub use features::{assemble, FeatureTable, FeatureVector, WARMUP_BARS};
pub use gbm::{BoostingParams, GradientBoostedRegressor};
pub use metrics::{EvaluationMetrics, TrainingMetrics, TrainingWarning};
pub use pipeline::{ModelDescription, RegressionPipeline, TrainedModel};
pub use scaler::StandardScaler;
pub use shared::SharedPipeline;
pub use streaming::StreamingFeatures;
