use super::Indicator;

/// Value used wherever RSI lacks history.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RS substituted when the average loss is exactly zero.
const ZERO_LOSS_RS: f64 = 100.0;

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 { ZERO_LOSS_RS } else { avg_gain / avg_loss };
    100.0 - 100.0 / (1.0 + rs)
}

fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else if change < 0.0 {
        (0.0, -change)
    } else {
        (0.0, 0.0)
    }
}

/// Wilder-smoothed RSI.
///
/// Indices below `period` are [`NEUTRAL_RSI`]. The value at `period` uses the
/// simple mean of the first `period` price changes; later values update the
/// averages recursively.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let n = prices.len();
    let mut out = vec![NEUTRAL_RSI; n];
    if period == 0 || n <= period {
        return out;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| split_change(w[1] - w[0]))
        .unzip();

    let p = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / p;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / p;

    for i in period..n {
        if i > period {
            avg_gain = (avg_gain * (p - 1.0) + gains[i - 1]) / p;
            avg_loss = (avg_loss * (p - 1.0) + losses[i - 1]) / p;
        }
        out[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

/// Incremental RSI with the same seeding and fallback as [`rsi`].
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_price: Option<f64>,
    changes: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    value: f64,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_price: None,
            changes: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            value: NEUTRAL_RSI,
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        if let Some(prev) = self.prev_price {
            if self.period > 0 {
                let (gain, loss) = split_change(price - prev);
                self.changes += 1;
                let p = self.period as f64;

                if self.changes < self.period {
                    self.gain_sum += gain;
                    self.loss_sum += loss;
                } else if self.changes == self.period {
                    self.avg_gain = (self.gain_sum + gain) / p;
                    self.avg_loss = (self.loss_sum + loss) / p;
                    self.value = rsi_from_averages(self.avg_gain, self.avg_loss);
                } else {
                    self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
                    self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
                    self.value = rsi_from_averages(self.avg_gain, self.avg_loss);
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

impl Indicator for Rsi {
    fn name(&self) -> &'static str {
        "RSI"
    }

    fn is_ready(&self) -> bool {
        self.period > 0 && self.changes >= self.period
    }

    fn reset(&mut self) {
        *self = Rsi::new(self.period);
    }
}
