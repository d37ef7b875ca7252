use crate::indicators::{BollingerBands, Indicator, Macd, RollingMean, Rsi, Volatility};
use crate::types::PriceBar;

use super::features::{
    FeatureVector, BOLLINGER_PERIOD, BOLLINGER_STD_DEV, MACD_FAST, MACD_SIGNAL, MACD_SLOW,
    RSI_PERIOD, SMA_PERIOD, VOLATILITY_PERIOD,
};

/// Bar-at-a-time feature derivation for live feeds.
///
/// Follows the same fallback conventions as [`assemble`](super::assemble) but
/// accumulates its windows incrementally, so values can differ from the batch
/// table in the last few bits. Use the batch path when results must match a
/// training table exactly.
#[derive(Debug, Clone)]
pub struct StreamingFeatures {
    rsi: Rsi,
    macd: Macd,
    bands: BollingerBands,
    volatility: Volatility,
    volume_sma: RollingMean,
    price_sma: RollingMean,
    bars_seen: usize,
}

impl Default for StreamingFeatures {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingFeatures {
    pub fn new() -> Self {
        Self {
            rsi: Rsi::new(RSI_PERIOD),
            macd: Macd::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL),
            bands: BollingerBands::new(BOLLINGER_PERIOD, BOLLINGER_STD_DEV),
            volatility: Volatility::new(VOLATILITY_PERIOD),
            volume_sma: RollingMean::new(SMA_PERIOD),
            price_sma: RollingMean::new(SMA_PERIOD),
            bars_seen: 0,
        }
    }

    pub fn update(&mut self, bar: &PriceBar) -> FeatureVector {
        let close = bar.close;
        let macd = self.macd.update(close);
        let bands = self.bands.update(close);
        self.bars_seen += 1;

        FeatureVector {
            rsi_14: self.rsi.update(close),
            macd: macd.line,
            macd_signal: macd.signal,
            macd_histogram: macd.histogram,
            bb_upper: bands.upper,
            bb_middle: bands.middle,
            bb_lower: bands.lower,
            volatility: self.volatility.update(close),
            hl_ratio: bar.hl_ratio(),
            volume_sma_20: self.volume_sma.update(bar.volume),
            price_sma_20: self.price_sma.update(close),
        }
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// True once every indicator has a full window.
    pub fn is_warmed_up(&self) -> bool {
        self.rsi.is_ready()
            && self.bands.is_ready()
            && self.volatility.is_ready()
            && self.bars_seen >= super::features::WARMUP_BARS
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
