//! Gradient-boosted regression trees for the squared-error objective.
//!
//! Each round fits a depth-limited tree to the current residuals using the
//! second-order split gain `G_L²/(H_L+λ) + G_R²/(H_R+λ) − G²/(H+λ)` with unit
//! hessians, then adds `learning_rate * leaf_weight` to every prediction.
//! Row and column subsampling draw without replacement from a seeded RNG, so a
//! given dataset and parameter set always produce the same model.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows drawn for each tree.
    pub subsample: f64,
    /// Fraction of feature columns drawn for each tree.
    pub colsample_bytree: f64,
    /// L2 penalty on leaf weights.
    pub reg_lambda: f64,
    /// Minimum hessian sum (row count, for squared error) in each child.
    pub min_child_weight: f64,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            max_depth: 6,
            learning_rate: 0.1,
            subsample: 0.8,
            colsample_bytree: 0.8,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            seed: 42,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.n_estimators == 0 {
            errors.push("n_estimators must be at least 1".to_string());
        }
        if self.max_depth == 0 {
            errors.push("max_depth must be at least 1".to_string());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            errors.push(format!("learning_rate must be in (0, 1], got {}", self.learning_rate));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            errors.push(format!("subsample must be in (0, 1], got {}", self.subsample));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            errors.push(format!(
                "colsample_bytree must be in (0, 1], got {}",
                self.colsample_bytree
            ));
        }
        if !(self.reg_lambda >= 0.0) {
            errors.push(format!("reg_lambda must be non-negative, got {}", self.reg_lambda));
        }
        if !(self.min_child_weight >= 0.0) {
            errors.push(format!(
                "min_child_weight must be non-negative, got {}",
                self.min_child_weight
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
enum TreeNode {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { weight } => return *weight,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_rows: Vec<usize>,
    right_rows: Vec<usize>,
}

/// Grows one tree over a row/column sample of the residuals.
struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    residuals: &'a [f64],
    features: &'a [usize],
    params: &'a BoostingParams,
    gains: &'a mut [f64],
}

impl TreeBuilder<'_> {
    fn leaf_weight(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        grad_sum / (hess_sum + self.params.reg_lambda)
    }

    fn score(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        grad_sum * grad_sum / (hess_sum + self.params.reg_lambda)
    }

    fn build(&mut self, rows: Vec<usize>, depth: usize) -> TreeNode {
        let grad_sum: f64 = rows.iter().map(|&r| self.residuals[r]).sum();
        let hess_sum = rows.len() as f64;
        let leaf = TreeNode::Leaf {
            weight: self.leaf_weight(grad_sum, hess_sum),
        };

        if depth >= self.params.max_depth || rows.len() < 2 {
            return leaf;
        }

        match self.best_split(&rows, grad_sum, hess_sum) {
            Some(split) => {
                self.gains[split.feature] += split.gain;
                let left = self.build(split.left_rows, depth + 1);
                let right = self.build(split.right_rows, depth + 1);
                TreeNode::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => leaf,
        }
    }

    fn best_split(&self, rows: &[usize], grad_sum: f64, hess_sum: f64) -> Option<SplitCandidate> {
        let parent_score = self.score(grad_sum, hess_sum);
        let min_child = self.params.min_child_weight;
        let mut best: Option<(usize, f64, f64)> = None;

        for &feature in self.features {
            let mut sorted: Vec<(f64, f64)> = rows
                .iter()
                .map(|&r| (self.x[[r, feature]], self.residuals[r]))
                .collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_grad = 0.0;
            for k in 1..sorted.len() {
                left_grad += sorted[k - 1].1;
                let (lo, hi) = (sorted[k - 1].0, sorted[k].0);
                if lo == hi {
                    continue;
                }
                let left_hess = k as f64;
                let right_hess = hess_sum - left_hess;
                if left_hess < min_child || right_hess < min_child {
                    continue;
                }

                let gain = self.score(left_grad, left_hess)
                    + self.score(grad_sum - left_grad, right_hess)
                    - parent_score;
                if gain > best.map_or(0.0, |(_, _, g)| g) {
                    best = Some((feature, split_threshold(lo, hi), gain));
                }
            }
        }

        let (feature, threshold, gain) = best?;
        let (left_rows, right_rows) = rows
            .iter()
            .partition(|&&r| self.x[[r, feature]] <= threshold);
        Some(SplitCandidate {
            feature,
            threshold,
            gain,
            left_rows,
            right_rows,
        })
    }
}

/// Midpoint between two distinct sorted values, such that `lo <= t < hi`.
fn split_threshold(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi {
        mid
    } else {
        lo
    }
}

fn sample_size(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).round() as usize).clamp(1, total)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    params: BoostingParams,
    base_score: f64,
    trees: Vec<TreeNode>,
    gain_by_feature: Vec<f64>,
}

impl GradientBoostedRegressor {
    /// Fit on a `(rows, features)` matrix.
    pub fn fit(x: &Array2<f64>, y: &[f64], params: &BoostingParams) -> Result<Self> {
        let (n, n_features) = x.dim();
        if n == 0 || n_features == 0 {
            return Err(PipelineError::EmptyInput);
        }
        if y.len() != n {
            return Err(PipelineError::invalid(format!(
                "{} feature rows but {} targets",
                n,
                y.len()
            )));
        }
        params.validate().map_err(|errors| PipelineError::Config {
            reason: errors.join("; "),
        })?;

        let base_score = y.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_score; n];
        let mut residuals = vec![0.0; n];
        let mut gain_by_feature = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(params.n_estimators);

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n_rows = sample_size(n, params.subsample);
        let n_cols = sample_size(n_features, params.colsample_bytree);

        for _ in 0..params.n_estimators {
            for i in 0..n {
                residuals[i] = y[i] - predictions[i];
            }

            let rows = sample(&mut rng, n, n_rows).into_vec();
            let mut features = sample(&mut rng, n_features, n_cols).into_vec();
            features.sort_unstable();

            let tree = TreeBuilder {
                x,
                residuals: &residuals,
                features: &features,
                params,
                gains: &mut gain_by_feature,
            }
            .build(rows, 0);

            for (i, prediction) in predictions.iter_mut().enumerate() {
                *prediction += params.learning_rate * tree.predict(x.row(i));
            }
            trees.push(tree);
        }

        debug!(
            "boosted {} trees over {} rows x {} features (max depth reached: {})",
            trees.len(),
            n,
            n_features,
            trees.iter().map(TreeNode::depth).max().unwrap_or(0)
        );

        Ok(Self {
            params: params.clone(),
            base_score,
            trees,
            gain_by_feature,
        })
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.trees.iter().fold(self.base_score, |acc, tree| {
            acc + self.params.learning_rate * tree.predict(row)
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Total split gain per feature, normalised to sum to 1. All zeros when no
    /// tree ever split.
    pub fn feature_importance(&self) -> Vec<f64> {
        let total: f64 = self.gain_by_feature.iter().sum();
        if total > 0.0 {
            self.gain_by_feature.iter().map(|g| g / total).collect()
        } else {
            vec![0.0; self.gain_by_feature.len()]
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.gain_by_feature.len()
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }
}
