//! Technical-indicator features and gradient-boosted price regression over
//! OHLCV bars.
//!
//! Raw bars flow through [`indicators`] into the eleven-column
//! [`ml::FeatureTable`] built by [`ml::assemble`], which feeds
//! [`ml::RegressionPipeline`] for both training and prediction.
//! [`ml::SharedPipeline`] wraps a pipeline for concurrent async use.

pub mod analytics;
pub mod config;
pub mod error;
pub mod indicators;
pub mod ml;
pub mod types;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use ml::{
    assemble, FeatureTable, FeatureVector, RegressionPipeline, SharedPipeline, TrainingMetrics,
    TrainingSet,
};
pub use types::{BarSeries, Frame, PriceBar};
