use crate::{candle::Candle, de::de_flexible_opt, frequency::Frequency};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// [`Bitmex`](super::Bitmex) `trade/bucketed` row.
///
/// The `timestamp` is the close of the bucket, so the candle starts one frequency earlier.
///
/// ### Raw Payload Examples
/// See docs: <https://www.bitmex.com/api/explorer/#!/Trade/Trade_getBucketed>
/// ```json
/// {
///     "timestamp": "2021-01-01T01:00:00.000Z",
///     "symbol": "XBTUSD",
///     "open": 28923.5,
///     "high": 29031.5,
///     "low": 28690,
///     "close": 29000,
///     "trades": 15734,
///     "volume": 153270000,
///     "vwap": 28871.2,
///     "lastSize": 100,
///     "turnover": 530880392800,
///     "homeNotional": 5308.80392800002,
///     "foreignNotional": 153270000
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitmexCandle {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: f64,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub vwap: Option<f64>,
    #[serde(default)]
    pub foreign_notional: Option<f64>,
}

impl BitmexCandle {
    pub fn into_candle(self, frequency: Frequency) -> Result<Candle, String> {
        let missing = |field: &str| format!("{} bucket {} has no {field}", self.symbol, self.timestamp);

        Ok(Candle {
            start_time: self.timestamp - frequency.duration(),
            end_time: self.timestamp,
            open: self.open.ok_or_else(|| missing("open"))?,
            high: self.high.ok_or_else(|| missing("high"))?,
            low: self.low.ok_or_else(|| missing("low"))?,
            close: self.close.ok_or_else(|| missing("close"))?,
            volume: self.volume,
            quote_volume: self.foreign_notional,
            weighted_average: self.vwap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_bitmex_candle() {
        let input = r#"
        {
            "timestamp": "2021-01-01T01:00:00.000Z",
            "symbol": "XBTUSD",
            "open": 28923.5,
            "high": 29031.5,
            "low": 28690,
            "close": 29000,
            "trades": 15734,
            "volume": 153270000,
            "vwap": 28871.2,
            "lastSize": 100,
            "turnover": 530880392800,
            "homeNotional": 5308.80392800002,
            "foreignNotional": 153270000
        }
        "#;

        let candle = serde_json::from_str::<BitmexCandle>(input)
            .unwrap()
            .into_candle(Frequency::H1)
            .unwrap();

        assert_eq!(
            candle.start_time,
            DateTime::<Utc>::from_timestamp(1_609_459_200, 0).unwrap()
        );
        assert_eq!(
            candle.end_time,
            DateTime::<Utc>::from_timestamp(1_609_462_800, 0).unwrap()
        );
        assert_eq!(candle.low, 28690.0);
        assert_eq!(candle.weighted_average, Some(28871.2));
        assert_eq!(candle.quote_volume, Some(153_270_000.0));
    }

    #[test]
    fn test_bitmex_candle_without_prices_is_rejected() {
        let input = r#"
        {
            "timestamp": "2021-01-01T01:00:00.000Z",
            "symbol": "XBTUSD",
            "open": null,
            "high": null,
            "low": null,
            "close": null,
            "volume": 0,
            "vwap": null
        }
        "#;

        let actual = serde_json::from_str::<BitmexCandle>(input)
            .unwrap()
            .into_candle(Frequency::H1);
        assert!(actual.is_err());
    }
}
