//! Technical indicators over `f64` price arrays.
//!
//! Two flavours live side by side:
//! - batch functions (`rsi`, `ema`, `macd`, `bollinger_bands`, `volatility`,
//!   `sma`, `rolling_std`) that map a whole series to an equal-length output,
//!   filling indices without enough history with a neutral fallback;
//! - incremental structs (`Rsi`, `Ema`, `Macd`, `BollingerBands`,
//!   `Volatility`, `RollingMean`) that carry filter state across `update`
//!   calls. They follow the same fallback conventions but accumulate in a
//!   different order, so their output is not bit-identical to the batch path.

pub mod ema;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod volatility;
pub mod rolling;

pub use ema::*;
pub use rsi::*;
pub use macd::*;
pub use bollinger::*;
pub use volatility::*;
pub use rolling::*;

pub trait Indicator {
    fn name(&self) -> &'static str;
    fn is_ready(&self) -> bool;
    fn reset(&mut self);
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.max(0.0).sqrt()
}

/// Window ending at `i`: the last `period` values, or everything seen so far
/// while fewer than `period` values exist.
pub(crate) fn trailing_window(values: &[f64], i: usize, period: usize) -> &[f64] {
    let start = (i + 1).saturating_sub(period.max(1));
    &values[start..=i]
}
