use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalised OHLCV [`Candle`] model.
///
/// Covers the half-open interval `[start_time, end_time)`, where
/// `end_time = start_time + frequency`.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct Candle {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub quote_volume: Option<f64>,
    pub weighted_average: Option<f64>,
}

impl Candle {
    /// True if `low <= open, close <= high`. Vendor data is not validated against this.
    pub fn is_consistent(&self) -> bool {
        self.low <= self.high
            && (self.low..=self.high).contains(&self.open)
            && (self.low..=self.high).contains(&self.close)
    }

    /// The same candle priced in the market's base asset.
    ///
    /// Prices become their reciprocal rounded to 8 decimal places. The inverted high is the
    /// reciprocal of the original low (and vice versa). Volumes are left untouched.
    pub fn inverted(&self) -> Self {
        Self {
            open: invert_price(self.open),
            high: invert_price(self.low),
            low: invert_price(self.high),
            close: invert_price(self.close),
            weighted_average: self.weighted_average.map(invert_price),
            ..*self
        }
    }
}

/// `round(1 / price, 8)`.
pub fn invert_price(price: f64) -> f64 {
    const SCALE: f64 = 1e8;
    ((1.0 / price) * SCALE).round() / SCALE
}
