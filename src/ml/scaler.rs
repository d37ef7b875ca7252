use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Standard deviations at or below this are treated as a constant column.
const MIN_STD: f64 = 1e-10;

/// Per-column z-score standardization fitted on a training matrix.
///
/// Constant columns map to 0.0 so they carry no signal into the regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(features: &Array2<f64>) -> Result<Self> {
        let means = features
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::invalid("cannot fit scaler on an empty matrix"))?;
        let stds = features.std_axis(Axis(0), 0.0);

        Ok(Self {
            means: means.to_vec(),
            stds: stds.to_vec(),
        })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }

    fn scale(&self, j: usize, value: f64) -> f64 {
        let std = self.stds[j];
        if std > MIN_STD {
            (value - self.means[j]) / std
        } else {
            0.0
        }
    }

    pub fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.n_features() {
            return Err(PipelineError::invalid(format!(
                "scaler fitted on {} features, got {}",
                self.n_features(),
                features.ncols()
            )));
        }
        let mut normalized = features.clone();
        for ((_, j), value) in normalized.indexed_iter_mut() {
            *value = self.scale(j, *value);
        }
        Ok(normalized)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Vec<f64> {
        row.iter()
            .enumerate()
            .take(self.n_features())
            .map(|(j, v)| self.scale(j, *v))
            .collect()
    }
}
