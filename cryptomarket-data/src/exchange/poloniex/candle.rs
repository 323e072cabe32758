use crate::{candle::Candle, de::de_flexible, frequency::Frequency};
use chrono::DateTime;
use serde::Deserialize;

/// Poloniex `returnChartData` row.
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "date": 1609459200,
///     "high": 0.02481,
///     "low": 0.024378,
///     "open": 0.024658,
///     "close": 0.02451,
///     "volume": 28.53,
///     "quoteVolume": 1162.19,
///     "weightedAverage": 0.024549
/// }
/// ```
///
/// A window without trades yields a single row with every field zero.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexCandle {
    pub date: i64,
    #[serde(deserialize_with = "de_flexible")]
    pub high: f64,
    #[serde(deserialize_with = "de_flexible")]
    pub low: f64,
    #[serde(deserialize_with = "de_flexible")]
    pub open: f64,
    #[serde(deserialize_with = "de_flexible")]
    pub close: f64,
    #[serde(deserialize_with = "de_flexible")]
    pub volume: f64,
    #[serde(deserialize_with = "de_flexible")]
    pub quote_volume: f64,
    #[serde(deserialize_with = "de_flexible")]
    pub weighted_average: f64,
}

impl PoloniexCandle {
    /// True for the "no data" row Poloniex returns for an empty window.
    pub fn is_placeholder(&self) -> bool {
        self.date == 0
    }

    pub fn into_candle(self, frequency: Frequency) -> Result<Candle, String> {
        let start_time = DateTime::from_timestamp(self.date, 0)
            .ok_or_else(|| format!("invalid date: {}", self.date))?;

        Ok(Candle {
            start_time,
            end_time: start_time + frequency.duration(),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            quote_volume: Some(self.quote_volume),
            weighted_average: Some(self.weighted_average),
        })
    }
}
