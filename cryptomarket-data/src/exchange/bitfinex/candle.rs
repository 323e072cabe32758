use crate::{candle::Candle, de::extract_next, frequency::Frequency};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// [`Bitfinex`](super::Bitfinex) candle row.
///
/// ### Raw Payload Examples
/// Format: \[MTS, OPEN, CLOSE, HIGH, LOW, VOLUME\]
///
/// Note: CLOSE comes before HIGH/LOW (different from standard OHLCV).
///
/// See docs: <https://docs.bitfinex.com/reference/rest-public-candles>
/// ```json
/// [1609459200000, 28923.63, 29000.01, 29031.34, 28690.17, 153.27]
/// ```
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Serialize)]
pub struct BitfinexCandle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

impl<'de> serde::Deserialize<'de> for BitfinexCandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct SeqVisitor;

        impl<'de> serde::de::Visitor<'de> for SeqVisitor {
            type Value = BitfinexCandle;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str(
                    "BitfinexCandle [MTS, OPEN, CLOSE, HIGH, LOW, VOLUME] from the Bitfinex REST API",
                )
            }

            fn visit_seq<SeqAccessor>(
                self,
                mut seq: SeqAccessor,
            ) -> Result<Self::Value, SeqAccessor::Error>
            where
                SeqAccessor: serde::de::SeqAccess<'de>,
            {
                let time_millis: i64 = extract_next(&mut seq, "mts")?;
                let open = extract_next(&mut seq, "open")?;
                let close = extract_next(&mut seq, "close")?;
                let high = extract_next(&mut seq, "high")?;
                let low = extract_next(&mut seq, "low")?;
                let volume = extract_next(&mut seq, "volume")?;

                // Ignore any additional elements or SerDe will fail
                //  '--> Bitfinex may add fields without warning
                while seq.next_element::<serde::de::IgnoredAny>()?.is_some() {}

                let time = DateTime::from_timestamp_millis(time_millis).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid mts: {time_millis}"))
                })?;

                Ok(BitfinexCandle {
                    time,
                    open,
                    close,
                    high,
                    low,
                    volume,
                })
            }
        }

        deserializer.deserialize_seq(SeqVisitor)
    }
}

impl BitfinexCandle {
    pub fn into_candle(self, frequency: Frequency) -> Candle {
        Candle {
            start_time: self.time,
            end_time: self.time + frequency.duration(),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            quote_volume: None,
            weighted_average: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_bitfinex_candle() {
        let input = r#"[1609459200000, 28923.63, 29000.01, 29031.34, 28690.17, 153.27]"#;

        let actual = serde_json::from_str::<BitfinexCandle>(input).unwrap();
        assert_eq!(
            actual,
            BitfinexCandle {
                time: DateTime::from_timestamp_millis(1_609_459_200_000).unwrap(),
                open: 28923.63,
                close: 29000.01,
                high: 29031.34,
                low: 28690.17,
                volume: 153.27,
            }
        );

        let candle = actual.into_candle(Frequency::D1);
        assert_eq!(candle.close, 29000.01);
        assert_eq!(candle.high, 29031.34);
        assert_eq!(
            candle.end_time,
            DateTime::from_timestamp(1_609_545_600, 0).unwrap()
        );
    }

    #[test]
    fn test_de_bitfinex_candle_missing_field() {
        assert!(serde_json::from_str::<BitfinexCandle>(r#"[1609459200000, 1.0, 2.0]"#).is_err());
    }
}
