use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal condition noticed while training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainingWarning {
    SmallSample { samples: usize, recommended: usize },
}

impl fmt::Display for TrainingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingWarning::SmallSample {
                samples,
                recommended,
            } => write!(
                f,
                "only {} training samples, at least {} recommended",
                samples, recommended
            ),
        }
    }
}

/// In-sample fit statistics from one `train` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
    pub sample_count: usize,
    pub feature_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TrainingWarning>,
}

/// Scores on data the model was not fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    /// Mean absolute percentage error as a fraction (0.05 is 5%); undefined
    /// when any target is zero.
    pub mape: Option<f64>,
}

impl EvaluationMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        let scores = RegressionScores::compute(y_true, y_pred);
        let mape = if y_true.is_empty() || y_true.iter().any(|y| *y == 0.0) {
            None
        } else {
            let total: f64 = y_true
                .iter()
                .zip(y_pred)
                .map(|(t, p)| ((t - p) / t).abs())
                .sum();
            Some(total / y_true.len() as f64)
        };

        Self {
            mse: scores.mse,
            rmse: scores.mse.sqrt(),
            mae: scores.mae,
            r2: scores.r2,
            mape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RegressionScores {
    pub mse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionScores {
    /// Expects equal-length inputs. A constant target scores r2 = 1.0 on an
    /// exact fit and 0.0 otherwise.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        let n = y_true.len().min(y_pred.len());
        if n == 0 {
            return Self {
                mse: 0.0,
                mae: 0.0,
                r2: 0.0,
            };
        }
        let n_f = n as f64;

        let mean = y_true[..n].iter().sum::<f64>() / n_f;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        let mut abs_err = 0.0;
        for (t, p) in y_true.iter().zip(y_pred) {
            let err = t - p;
            ss_res += err * err;
            abs_err += err.abs();
            ss_tot += (t - mean).powi(2);
        }

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Self {
            mse: ss_res / n_f,
            mae: abs_err / n_f,
            r2,
        }
    }
}
