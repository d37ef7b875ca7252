use serde::{Deserialize, Serialize};
use tracing::debug;

use super::features::{assemble, FeatureTable};
use crate::error::{PipelineError, Result};
use crate::types::BarSeries;

/// Features paired with a forward close-price target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    pub features: FeatureTable,
    pub target: Vec<f64>,
}

impl TrainingSet {
    pub fn new(features: FeatureTable, target: Vec<f64>) -> Result<Self> {
        if features.len() != target.len() {
            return Err(PipelineError::invalid(format!(
                "{} feature rows but {} targets",
                features.len(),
                target.len()
            )));
        }
        Ok(Self { features, target })
    }

    /// Row `i` is labelled with the close `horizon` bars later. The trailing
    /// `horizon` rows have no label and are dropped; `horizon == 0` labels each
    /// row with its own close.
    pub fn from_series(series: &BarSeries, horizon: usize) -> Result<Self> {
        if series.len() <= horizon {
            return Err(PipelineError::invalid(format!(
                "need more than {} bars to build targets {} bars ahead, got {}",
                horizon,
                horizon,
                series.len()
            )));
        }

        let table = assemble(series);
        let closes = series.closes();
        let usable = series.len() - horizon;
        let target = closes[horizon..].to_vec();

        debug!("training set: {} rows, horizon {}", usable, horizon);
        Ok(Self {
            features: table.slice(0, usable),
            target,
        })
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn without_warmup(&self) -> TrainingSet {
        let skip = self.features.warmup_rows();
        TrainingSet {
            features: self.features.slice(skip, self.len()),
            target: self.target[skip..].to_vec(),
        }
    }

    /// Oldest rows train, newest rows test; never shuffled.
    pub fn chronological_split(&self, test_fraction: f64) -> Result<(TrainingSet, TrainingSet)> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(PipelineError::invalid(format!(
                "test_fraction must be in [0, 1), got {}",
                test_fraction
            )));
        }
        let n = self.len();
        let split = (n as f64 * (1.0 - test_fraction)).floor() as usize;

        let train = TrainingSet {
            features: self.features.slice(0, split),
            target: self.target[..split].to_vec(),
        };
        let test = TrainingSet {
            features: self.features.slice(split, n),
            target: self.target[split..].to_vec(),
        };
        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::WARMUP_BARS;
    use crate::types::PriceBar;

    fn series(n: usize) -> BarSeries {
        (0..n)
            .map(|i| {
                let close = 50.0 + i as f64;
                PriceBar::new(close, close + 0.5, close - 0.5, close, 500.0)
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_forward_target() {
        let bars = series(10);
        let set = TrainingSet::from_series(&bars, 1).unwrap();
        assert_eq!(set.len(), 9);
        assert_eq!(set.features.len(), 9);
        assert_eq!(set.target[0], 51.0);
        assert_eq!(set.target[8], 59.0);
    }

    #[test]
    fn test_horizon_zero_matches_assemble() {
        let bars = series(12);
        let set = TrainingSet::from_series(&bars, 0).unwrap();
        assert_eq!(set.features, assemble(&bars));
        assert_eq!(set.target, bars.closes());
    }

    #[test]
    fn test_too_short_for_horizon() {
        assert!(TrainingSet::from_series(&series(3), 3).is_err());
    }

    #[test]
    fn test_without_warmup() {
        let set = TrainingSet::from_series(&series(40), 1).unwrap().without_warmup();
        assert_eq!(set.len(), 39 - WARMUP_BARS);
        assert_eq!(set.target[0], 50.0 + WARMUP_BARS as f64 + 1.0);
    }

    #[test]
    fn test_chronological_split() {
        let set = TrainingSet::from_series(&series(11), 1).unwrap();
        let (train, test) = set.chronological_split(0.2).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert_eq!(test.target, vec![59.0, 60.0]);
        assert!(set.chronological_split(1.0).is_err());
    }

    #[test]
    fn test_new_checks_lengths() {
        assert!(TrainingSet::new(FeatureTable::default(), vec![1.0]).is_err());
    }
}
