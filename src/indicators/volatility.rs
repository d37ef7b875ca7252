use std::collections::VecDeque;

use super::{population_std, Indicator};

/// Volatility reported before `period` returns are available.
pub const FALLBACK_VOLATILITY: f64 = 0.02;

/// Simple return from `prev` to `current`; zero when `prev` is zero.
pub fn simple_return(prev: f64, current: f64) -> f64 {
    if prev == 0.0 {
        return 0.0;
    }
    (current - prev) / prev
}

pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| simple_return(w[0], w[1])).collect()
}

/// Population standard deviation of the `period` simple returns ending at
/// each index. Indices below `period` get [`FALLBACK_VOLATILITY`].
pub fn volatility(prices: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![FALLBACK_VOLATILITY; prices.len()];
    if period == 0 {
        return out;
    }
    let returns = simple_returns(prices);
    for i in period..prices.len() {
        out[i] = population_std(&returns[i - period..i]);
    }
    out
}

#[derive(Debug, Clone)]
pub struct Volatility {
    period: usize,
    prev_price: Option<f64>,
    returns: VecDeque<f64>,
    value: f64,
}

impl Volatility {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_price: None,
            returns: VecDeque::with_capacity(period),
            value: FALLBACK_VOLATILITY,
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        if let Some(prev) = self.prev_price {
            if self.period > 0 {
                self.returns.push_back(simple_return(prev, price));
                if self.returns.len() > self.period {
                    self.returns.pop_front();
                }
                if self.returns.len() == self.period {
                    self.value = population_std(self.returns.make_contiguous());
                }
            }
        }
        self.prev_price = Some(price);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &'static str {
        "Volatility"
    }

    fn is_ready(&self) -> bool {
        self.period > 0 && self.returns.len() == self.period
    }

    fn reset(&mut self) {
        *self = Volatility::new(self.period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_fallback_prefix_and_length() {
        let prices = [100.0, 101.0, 102.0, 101.0, 100.0, 101.0, 102.0, 101.0, 100.0, 99.0].repeat(2);
        let out = volatility(&prices, 10);
        assert_eq!(out.len(), prices.len());
        for v in &out[..10] {
            assert_eq!(*v, FALLBACK_VOLATILITY);
        }
        assert!(out[10..].iter().all(|v| *v >= 0.0 && *v != FALLBACK_VOLATILITY));
    }

    #[test]
    fn test_window_ends_at_current_price() {
        // returns: 0.1, 0.0, then 0.5 into the last price
        let prices = [10.0, 11.0, 11.0, 16.5];
        let out = volatility(&prices, 2);
        assert_relative_eq!(out[2], population_std(&[0.1, 0.0]));
        assert_relative_eq!(out[3], population_std(&[0.0, 0.5]));
    }

    #[test]
    fn test_zero_price_is_guarded() {
        let out = volatility(&[0.0, 1.0, 2.0, 3.0], 2);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_constant_prices_have_zero_volatility() {
        let out = volatility(&[5.0; 30], 20);
        assert_eq!(out[25], 0.0);
    }

    #[test]
    fn test_incremental_matches_batch() {
        let prices: Vec<f64> = (0..50).map(|i| 20.0 + (i as f64 * 1.3).sin()).collect();
        let batch = volatility(&prices, 20);
        let mut inc = Volatility::new(20);
        for (i, p) in prices.iter().enumerate() {
            assert_relative_eq!(inc.update(*p), batch[i], max_relative = 1e-9);
        }
        assert!(inc.is_ready());
        inc.reset();
        assert_eq!(inc.value(), FALLBACK_VOLATILITY);
    }

    proptest! {
        #[test]
        fn prop_volatility_non_negative(prices in prop::collection::vec(0.0f64..10_000.0, 0..150)) {
            for v in volatility(&prices, 20) {
                prop_assert!(v >= 0.0 && v.is_finite());
            }
        }
    }
}
