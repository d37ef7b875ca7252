use std::collections::VecDeque;

use super::{mean, population_std, trailing_window, Indicator};

/// Simple moving average with an expanding window for the first `period`
/// indices, so no index is left undefined.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| mean(trailing_window(values, i, period)))
        .collect()
}

/// Population standard deviation over the same window `sma` uses.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| population_std(trailing_window(values, i, period)))
        .collect()
}

/// Incremental moving average keeping a running sum over the window.
#[derive(Debug, Clone)]
pub struct RollingMean {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl RollingMean {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
        }
        self.value()
    }

    pub fn value(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.sum / self.window.len() as f64
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for RollingMean {
    fn name(&self) -> &'static str {
        "RollingMean"
    }

    fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma_expanding_prefix() {
        let values = [10.0, 20.0, 30.0, 40.0];
        let out = sma(&values, 3);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 10.0);
        assert_eq!(out[1], 15.0);
        assert_eq!(out[2], 20.0);
        assert_eq!(out[3], 30.0);
    }

    #[test]
    fn test_rolling_std_first_index_is_zero() {
        let out = rolling_std(&[5.0, 7.0, 9.0], 20);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 1.0);
    }

    #[test]
    fn test_empty_series() {
        assert!(sma(&[], 20).is_empty());
        assert!(rolling_std(&[], 20).is_empty());
    }

    #[test]
    fn test_incremental_matches_batch() {
        let values: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let batch = sma(&values, 20);
        let mut rolling = RollingMean::new(20);
        for (i, v) in values.iter().enumerate() {
            assert_relative_eq!(rolling.update(*v), batch[i], max_relative = 1e-9);
        }
        assert!(rolling.is_ready());
        rolling.reset();
        assert!(!rolling.is_ready());
        assert_eq!(rolling.value(), 0.0);
    }
}
