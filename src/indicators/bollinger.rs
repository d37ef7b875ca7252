use std::collections::VecDeque;

use super::{mean, population_std, rolling_std, sma, Indicator};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_STD_DEV: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Rolling mean bracketed by `k` population standard deviations.
///
/// Before `period` values exist the window is everything seen so far, so every
/// index carries a band. With `k >= 0`, `upper >= middle >= lower`.
pub fn bollinger_bands(prices: &[f64], period: usize, k: f64) -> BollingerSeries {
    let middle = sma(prices, period);
    let std = rolling_std(prices, period);
    let upper = middle.iter().zip(&std).map(|(m, s)| m + s * k).collect();
    let lower = middle.iter().zip(&std).map(|(m, s)| m - s * k).collect();

    BollingerSeries { upper, middle, lower }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerOutput {
    pub fn bandwidth(&self) -> f64 {
        self.upper - self.lower
    }

    /// Position of `price` inside the band, 0.5 for a collapsed band.
    pub fn percent_b(&self, price: f64) -> f64 {
        let width = self.bandwidth();
        if width == 0.0 {
            return 0.5;
        }
        (price - self.lower) / width
    }
}

#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
    prices: VecDeque<f64>,
    last: Option<BollingerOutput>,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        let period = period.max(1);
        Self {
            period,
            std_dev_multiplier,
            prices: VecDeque::with_capacity(period),
            last: None,
        }
    }

    pub fn default_params() -> Self {
        Self::new(DEFAULT_PERIOD, DEFAULT_STD_DEV)
    }

    pub fn update(&mut self, price: f64) -> BollingerOutput {
        self.prices.push_back(price);
        if self.prices.len() > self.period {
            self.prices.pop_front();
        }

        let window = self.prices.make_contiguous();
        let middle = mean(window);
        let deviation = population_std(window) * self.std_dev_multiplier;
        let output = BollingerOutput {
            upper: middle + deviation,
            middle,
            lower: middle - deviation,
        };
        self.last = Some(output);
        output
    }

    pub fn last(&self) -> Option<BollingerOutput> {
        self.last
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &'static str {
        "BollingerBands"
    }

    fn is_ready(&self) -> bool {
        self.prices.len() >= self.period
    }

    fn reset(&mut self) {
        self.prices.clear();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_linear_trend_bands() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + i as f64 * 0.5).collect();
        let bands = bollinger_bands(&prices, 20, 2.0);
        assert_eq!(bands.upper.len(), 50);
        // first index has a zero-width band
        assert_eq!(bands.upper[0], bands.lower[0]);
        for i in 1..50 {
            assert!(bands.upper[i] > bands.middle[i]);
            assert!(bands.middle[i] > bands.lower[i]);
        }
    }

    #[test]
    fn test_band_values() {
        let bands = bollinger_bands(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8, 2.0);
        assert_relative_eq!(bands.middle[7], 5.0);
        assert_relative_eq!(bands.upper[7], 9.0);
        assert_relative_eq!(bands.lower[7], 1.0);
    }

    #[test]
    fn test_incremental_matches_batch() {
        let prices: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.9).cos() * 3.0).collect();
        let batch = bollinger_bands(&prices, 20, 2.0);
        let mut inc = BollingerBands::default_params();
        for (i, p) in prices.iter().enumerate() {
            let o = inc.update(*p);
            assert_relative_eq!(o.middle, batch.middle[i], max_relative = 1e-9);
            assert_relative_eq!(o.upper, batch.upper[i], max_relative = 1e-9);
            assert_relative_eq!(o.lower, batch.lower[i], max_relative = 1e-9);
        }
        assert!(inc.is_ready());
    }

    #[test]
    fn test_percent_b() {
        let out = BollingerOutput { upper: 12.0, middle: 10.0, lower: 8.0 };
        assert_relative_eq!(out.percent_b(10.0), 0.5);
        assert_relative_eq!(out.percent_b(12.0), 1.0);
        let flat = BollingerOutput { upper: 10.0, middle: 10.0, lower: 10.0 };
        assert_eq!(flat.percent_b(11.0), 0.5);
    }

    proptest! {
        #[test]
        fn prop_band_ordering(prices in prop::collection::vec(0.01f64..10_000.0, 0..150)) {
            let bands = bollinger_bands(&prices, 20, 2.0);
            for i in 0..prices.len() {
                prop_assert!(bands.upper[i] >= bands.middle[i]);
                prop_assert!(bands.middle[i] >= bands.lower[i]);
            }
        }
    }
}
