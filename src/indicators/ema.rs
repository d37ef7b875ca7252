use super::Indicator;

pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// EMA seeded with the first price.
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    let k = smoothing_factor(period);
    let mut out = Vec::with_capacity(prices.len());
    let mut prev: Option<f64> = None;
    for &price in prices {
        let next = match prev {
            Some(e) => price * k + e * (1.0 - k),
            None => price,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            multiplier: smoothing_factor(period),
            value: None,
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        let next = match self.value {
            Some(prev) => price * self.multiplier + prev * (1.0 - self.multiplier),
            None => price,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
    fn name(&self) -> &'static str {
        "EMA"
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    fn reset(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_seed_is_first_price() {
        let out = ema(&[10.0, 20.0, 30.0], 3);
        assert_eq!(out[0], 10.0);
        let k = 0.5;
        assert_relative_eq!(out[1], 20.0 * k + 10.0 * (1.0 - k));
        assert_relative_eq!(out[2], 30.0 * k + out[1] * (1.0 - k));
    }

    #[test]
    fn test_constant_series_stays_constant() {
        for v in ema(&[100.0; 10], 12) {
            assert_relative_eq!(v, 100.0);
        }
    }

    #[test]
    fn test_incremental_is_identical() {
        let prices = [5.0, 7.0, 6.5, 9.0, 8.0];
        let batch = ema(&prices, 4);
        let mut inc = Ema::new(4);
        assert!(!inc.is_ready());
        for (i, p) in prices.iter().enumerate() {
            assert_eq!(inc.update(*p), batch[i]);
        }
        assert_eq!(inc.period(), 4);
        inc.reset();
        assert_eq!(inc.value(), None);
    }
}
