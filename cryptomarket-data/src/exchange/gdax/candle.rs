use crate::{candle::Candle, de::extract_next, frequency::Frequency};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// [`Gdax`](super::Gdax) candle row, returned newest-first.
///
/// ### Raw Payload Examples
/// Format: \[TIME, LOW, HIGH, OPEN, CLOSE, VOLUME\], `TIME` in unix seconds.
///
/// See docs: <https://docs.cdp.coinbase.com/exchange/reference/exchangerestapi_getproductcandles>
/// ```json
/// [1609462800, 0.0245, 0.0251, 0.0247, 0.0249, 381.52]
/// ```
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Serialize)]
pub struct GdaxCandle {
    pub time: DateTime<Utc>,
    pub low: f64,
    pub high: f64,
    pub open: f64,
    pub close: f64,
    pub volume: f64,
}

impl<'de> serde::Deserialize<'de> for GdaxCandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct SeqVisitor;

        impl<'de> serde::de::Visitor<'de> for SeqVisitor {
            type Value = GdaxCandle;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("GdaxCandle [TIME, LOW, HIGH, OPEN, CLOSE, VOLUME]")
            }

            fn visit_seq<SeqAccessor>(
                self,
                mut seq: SeqAccessor,
            ) -> Result<Self::Value, SeqAccessor::Error>
            where
                SeqAccessor: serde::de::SeqAccess<'de>,
            {
                let time_secs: i64 = extract_next(&mut seq, "time")?;
                let low = extract_next(&mut seq, "low")?;
                let high = extract_next(&mut seq, "high")?;
                let open = extract_next(&mut seq, "open")?;
                let close = extract_next(&mut seq, "close")?;
                let volume = extract_next(&mut seq, "volume")?;

                while seq.next_element::<serde::de::IgnoredAny>()?.is_some() {}

                let time = DateTime::from_timestamp(time_secs, 0).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid time: {time_secs}"))
                })?;

                Ok(GdaxCandle {
                    time,
                    low,
                    high,
                    open,
                    close,
                    volume,
                })
            }
        }

        deserializer.deserialize_seq(SeqVisitor)
    }
}

impl GdaxCandle {
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
