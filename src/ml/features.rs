use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::indicators::{bollinger_bands, macd, rsi, sma, volatility};
use crate::types::{BarSeries, Frame};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;
pub const VOLATILITY_PERIOD: usize = 20;
pub const SMA_PERIOD: usize = 20;

/// Leading rows whose indicators rely on neutral fills or unconverged EMA seeds.
pub const WARMUP_BARS: usize = MACD_SLOW;

/// Fixed-size feature vector for price regression.
///
/// Field order is the model contract: it matches [`FeatureVector::NAMES`] and
/// the column order of every matrix fed to the scaler and regressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rsi_14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub volatility: f64,
    pub hl_ratio: f64,
    pub volume_sma_20: f64,
    pub price_sma_20: f64,
}

impl FeatureVector {
    pub const NUM_FEATURES: usize = 11;

    pub const NAMES: [&'static str; Self::NUM_FEATURES] = [
        "RSI_14",
        "MACD",
        "MACD_Signal",
        "MACD_Histogram",
        "BB_Upper",
        "BB_Middle",
        "BB_Lower",
        "Volatility",
        "HL_Ratio",
        "Volume_SMA_20",
        "Price_SMA_20",
    ];

    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.rsi_14,
            self.macd,
            self.macd_signal,
            self.macd_histogram,
            self.bb_upper,
            self.bb_middle,
            self.bb_lower,
            self.volatility,
            self.hl_ratio,
            self.volume_sma_20,
            self.price_sma_20,
        ]
    }

    pub fn from_array(values: [f64; Self::NUM_FEATURES]) -> Self {
        Self {
            rsi_14: values[0],
            macd: values[1],
            macd_signal: values[2],
            macd_histogram: values[3],
            bb_upper: values[4],
            bb_middle: values[5],
            bb_lower: values[6],
            volatility: values[7],
            hl_ratio: values[8],
            volume_sma_20: values[9],
            price_sma_20: values[10],
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let index = Self::NAMES.iter().position(|n| *n == name)?;
        Some(self.to_array()[index])
    }

    pub fn feature_names() -> Vec<String> {
        Self::NAMES.iter().map(|n| n.to_string()).collect()
    }
}

/// One [`FeatureVector`] per input bar, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<FeatureVector>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureVector>) -> Self {
        Self { rows }
    }

    /// Build a table from a string-keyed frame carrying all eleven feature
    /// columns. Extra columns are ignored.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let columns = frame.require(&FeatureVector::NAMES).map_err(|e| match e {
            PipelineError::Schema { missing } => PipelineError::invalid(format!(
                "feature table is missing columns: {}",
                missing.join(", ")
            )),
            other => other,
        })?;

        let rows = (0..frame.len())
            .map(|i| {
                let mut values = [0.0; FeatureVector::NUM_FEATURES];
                for (j, column) in columns.iter().enumerate() {
                    values[j] = column[i];
                }
                FeatureVector::from_array(values)
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn to_frame(&self) -> Frame {
        let columns = FeatureVector::NAMES
            .iter()
            .map(|name| (name.to_string(), self.column(name).unwrap_or_default()))
            .collect();
        Frame::from_columns_unchecked(columns)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureVector> {
        self.rows.iter()
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = FeatureVector::NAMES.iter().position(|n| *n == name)?;
        Some(self.rows.iter().map(|r| r.to_array()[index]).collect())
    }

    /// Row-major `(rows, 11)` matrix in [`FeatureVector::NAMES`] order.
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.rows.len(), FeatureVector::NUM_FEATURES));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, value) in row.to_array().iter().enumerate() {
                matrix[[i, j]] = *value;
            }
        }
        matrix
    }

    /// How many leading rows fall inside the indicator warm-up.
    pub fn warmup_rows(&self) -> usize {
        self.rows.len().min(WARMUP_BARS)
    }

    /// The table without its warm-up rows.
    pub fn without_warmup(&self) -> FeatureTable {
        self.slice(self.warmup_rows(), self.rows.len())
    }

    pub fn slice(&self, start: usize, end: usize) -> FeatureTable {
        let end = end.min(self.rows.len());
        let start = start.min(end);
        FeatureTable::new(self.rows[start..end].to_vec())
    }

    pub fn is_finite(&self) -> bool {
        self.rows
            .iter()
            .all(|r| r.to_array().iter().all(|v| v.is_finite()))
    }
}

impl From<Vec<FeatureVector>> for FeatureTable {
    fn from(rows: Vec<FeatureVector>) -> Self {
        Self::new(rows)
    }
}

/// Derive the eleven-column feature table from raw bars.
///
/// This is the only feature transform used by both training-table
/// construction and prediction. No rows are dropped; warm-up rows carry the
/// indicators' neutral fallbacks.
pub fn assemble(series: &BarSeries) -> FeatureTable {
    let close = series.closes();
    let volume = series.volumes();

    let rsi_14 = rsi(&close, RSI_PERIOD);
    let macd_out = macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let bands = bollinger_bands(&close, BOLLINGER_PERIOD, BOLLINGER_STD_DEV);
    let vol = volatility(&close, VOLATILITY_PERIOD);
    let volume_sma = sma(&volume, SMA_PERIOD);
    let price_sma = sma(&close, SMA_PERIOD);

    let rows = series
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| FeatureVector {
            rsi_14: rsi_14[i],
            macd: macd_out.line[i],
            macd_signal: macd_out.signal[i],
            macd_histogram: macd_out.histogram[i],
            bb_upper: bands.upper[i],
            bb_middle: bands.middle[i],
            bb_lower: bands.lower[i],
            volatility: vol[i],
            hl_ratio: bar.hl_ratio(),
            volume_sma_20: volume_sma[i],
            price_sma_20: price_sma[i],
        })
        .collect();

    FeatureTable::new(rows)
}
