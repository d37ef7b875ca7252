use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::{mean, simple_returns};
use crate::types::BarSeries;

/// Trading days used to annualise daily figures.
pub const TRADING_DAYS: f64 = 252.0;
pub const TREND_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Uptrend => write!(f, "Uptrend"),
            Trend::Downtrend => write!(f, "Downtrend"),
        }
    }
}

/// Descriptive return and trend statistics for a bar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub bars: usize,
    pub mean_return: f64,
    /// Sample standard deviation of bar-to-bar returns.
    pub daily_volatility: f64,
    pub annual_volatility: f64,
    pub max_return: f64,
    pub min_return: f64,
    /// Annualised, zero risk-free rate; 0 when returns do not vary.
    pub sharpe_ratio: f64,
    pub bars_above_sma: usize,
    pub bars_below_sma: usize,
    pub sma_crossovers: usize,
    /// Last close against its full-window SMA; `None` with fewer than
    /// [`TREND_WINDOW`] bars.
    pub trend: Option<Trend>,
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub fn summarize(series: &BarSeries) -> MarketSummary {
    let closes = series.closes();
    let returns = simple_returns(&closes);

    let mean_return = mean(&returns);
    let daily_volatility = sample_std(&returns);
    let annualization_factor = TRADING_DAYS.sqrt();
    let sharpe_ratio = if daily_volatility > 0.0 {
        (mean_return / daily_volatility) * annualization_factor
    } else {
        0.0
    };

    let (max_return, min_return) = if returns.is_empty() {
        (0.0, 0.0)
    } else {
        returns.iter().fold((f64::MIN, f64::MAX), |(hi, lo), r| (hi.max(*r), lo.min(*r)))
    };

    // Only indices with a full SMA window count.
    let mut bars_above_sma = 0;
    let mut bars_below_sma = 0;
    let mut sma_crossovers = 0;
    let mut previous_above: Option<bool> = None;
    let mut trend = None;
    for (offset, window) in closes.windows(TREND_WINDOW).enumerate() {
        let close = closes[offset + TREND_WINDOW - 1];
        let sma = mean(window);
        let above = close > sma;
        if above {
            bars_above_sma += 1;
        } else if close < sma {
            bars_below_sma += 1;
        }
        if previous_above.is_some_and(|prev| prev != above) {
            sma_crossovers += 1;
        }
        previous_above = Some(above);
        trend = Some(if above { Trend::Uptrend } else { Trend::Downtrend });
    }

    MarketSummary {
        bars: series.len(),
        mean_return,
        daily_volatility,
        annual_volatility: daily_volatility * annualization_factor,
        max_return,
        min_return,
        sharpe_ratio,
        bars_above_sma,
        bars_below_sma,
        sma_crossovers,
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceBar;
    use approx::assert_relative_eq;

    fn from_closes(closes: &[f64]) -> BarSeries {
        closes
            .iter()
            .map(|c| PriceBar::new(*c, *c, *c, *c, 1_000.0))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_return_statistics() {
        let summary = summarize(&from_closes(&[100.0, 110.0, 99.0]));
        assert_eq!(summary.bars, 3);
        assert_relative_eq!(summary.max_return, 0.1);
        assert_relative_eq!(summary.min_return, -0.1);
        assert_relative_eq!(summary.mean_return, 0.0, epsilon = 1e-12);
        assert_relative_eq!(summary.daily_volatility, (0.02f64).sqrt(), max_relative = 1e-12);
        assert_relative_eq!(summary.annual_volatility, summary.daily_volatility * 252f64.sqrt());
        assert_eq!(summary.trend, None);
    }

    #[test]
    fn test_flat_series_has_zero_sharpe() {
        let summary = summarize(&from_closes(&[50.0; 30]));
        assert_eq!(summary.sharpe_ratio, 0.0);
        assert_eq!(summary.bars_above_sma, 0);
        assert_eq!(summary.bars_below_sma, 0);
        assert_eq!(summary.trend, Some(Trend::Downtrend));
    }

    #[test]
    fn test_uptrend() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let summary = summarize(&from_closes(&closes));
        assert_eq!(summary.bars_above_sma, 21);
        assert_eq!(summary.bars_below_sma, 0);
        assert_eq!(summary.sma_crossovers, 0);
        assert_eq!(summary.trend, Some(Trend::Uptrend));
        assert!(summary.sharpe_ratio > 0.0);
        assert_eq!(Trend::Uptrend.to_string(), "Uptrend");
    }

    #[test]
    fn test_empty_series() {
        let summary = summarize(&BarSeries::default());
        assert_eq!(summary.bars, 0);
        assert_eq!(summary.max_return, 0.0);
        assert_eq!(summary.trend, None);
    }
}
