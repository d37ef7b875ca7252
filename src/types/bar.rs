use serde::{Deserialize, Serialize};

use super::frame::Frame;
use crate::error::{PipelineError, Result};

/// Column names every bar collection must carry. Case-sensitive.
pub const BAR_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// One OHLCV observation. Time ordering is implied by position in a [`BarSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { open, high, low, close, volume }
    }

    /// High over low with a small epsilon so a zero low never divides by zero.
    pub fn hl_ratio(&self) -> f64 {
        self.high / (self.low + 1e-8)
    }

    fn validate(&self, row: usize) -> Result<()> {
        let fields = [
            ("Open", self.open),
            ("High", self.high),
            ("Low", self.low),
            ("Close", self.close),
            ("Volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::invalid(format!(
                    "{} at row {} must be finite and non-negative, got {}",
                    name, row, value
                )));
            }
        }
        Ok(())
    }
}

/// Time-ordered sequence of bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub bars: Vec<PriceBar>,
}

impl BarSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    /// Validate a loosely-typed frame at the API boundary.
    ///
    /// Missing columns are a schema error; values that are not finite or are
    /// negative are invalid input. A zero-row frame converts to an empty series;
    /// callers that need rows check [`BarSeries::is_empty`].
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let columns = frame.require(&BAR_COLUMNS)?;
        let (open, high, low, close, volume) =
            (columns[0], columns[1], columns[2], columns[3], columns[4]);

        let mut bars = Vec::with_capacity(frame.len());
        for i in 0..frame.len() {
            let bar = PriceBar::new(open[i], high[i], low[i], close[i], volume[i]);
            bar.validate(i)?;
            bars.push(bar);
        }
        Ok(Self { bars })
    }

    pub fn to_frame(&self) -> Frame {
        let columns = vec![
            ("Open".to_string(), self.opens()),
            ("High".to_string(), self.highs()),
            ("Low".to_string(), self.lows()),
            ("Close".to_string(), self.closes()),
            ("Volume".to_string(), self.volumes()),
        ];
        // Every column is built from the same bars, so lengths always agree.
        Frame::from_columns_unchecked(columns)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

impl From<Vec<PriceBar>> for BarSeries {
    fn from(bars: Vec<PriceBar>) -> Self {
        Self::new(bars)
    }
}
