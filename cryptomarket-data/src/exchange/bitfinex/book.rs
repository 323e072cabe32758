use crate::{book::Level, de::extract_next};
use serde::Serialize;

/// [`Bitfinex`](super::Bitfinex) order book entry (trading pairs, aggregated precision).
///
/// ### Raw Payload Examples
/// Format: \[PRICE, COUNT, AMOUNT\]. A positive amount is a bid, a negative amount an ask.
/// ```json
/// [29000.5, 3, 0.52]
/// ```
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Serialize)]
pub struct BitfinexBookEntry {
    pub price: f64,
    pub count: u64,
    pub amount: f64,
}

impl BitfinexBookEntry {
    pub fn is_bid(&self) -> bool {
        self.amount > 0.0
    }

    pub fn level(&self) -> Level {
        Level::new(self.price, self.amount.abs())
    }
}

impl<'de> serde::Deserialize<'de> for BitfinexBookEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct SeqVisitor;

        impl<'de> serde::de::Visitor<'de> for SeqVisitor {
            type Value = BitfinexBookEntry;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("BitfinexBookEntry [PRICE, COUNT, AMOUNT]")
            }

            fn visit_seq<SeqAccessor>(
                self,
                mut seq: SeqAccessor,
            ) -> Result<Self::Value, SeqAccessor::Error>
            where
                SeqAccessor: serde::de::SeqAccess<'de>,
            {
                let price = extract_next(&mut seq, "price")?;
                let count = extract_next(&mut seq, "count")?;
                let amount = extract_next(&mut seq, "amount")?;

                while seq.next_element::<serde::de::IgnoredAny>()?.is_some() {}

                Ok(BitfinexBookEntry {
                    price,
                    count,
                    amount,
                })
            }
        }

        deserializer.deserialize_seq(SeqVisitor)
    }
}

/// [`Bitfinex`](super::Bitfinex) trading pair ticker.
///
/// ### Raw Payload Examples
/// Format: \[BID, BID_SIZE, ASK, ASK_SIZE, DAILY_CHANGE, DAILY_CHANGE_RELATIVE, LAST_PRICE,
/// VOLUME, HIGH, LOW\]
/// ```json
/// [29000.1, 12.5, 29000.2, 9.1, 350.0, 0.0122, 29000.15, 5431.2, 29350.0, 28500.0]
/// ```
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Serialize)]
pub struct BitfinexTicker {
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: f64,
}

impl<'de> serde::Deserialize<'de> for BitfinexTicker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct SeqVisitor;

        impl<'de> serde::de::Visitor<'de> for SeqVisitor {
            type Value = BitfinexTicker;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("BitfinexTicker [BID, BID_SIZE, ASK, ASK_SIZE, ..]")
            }

            fn visit_seq<SeqAccessor>(
                self,
                mut seq: SeqAccessor,
            ) -> Result<Self::Value, SeqAccessor::Error>
            where
                SeqAccessor: serde::de::SeqAccess<'de>,
            {
                let bid = extract_next(&mut seq, "bid")?;
                let _bid_size: f64 = extract_next(&mut seq, "bid_size")?;
                let ask = extract_next(&mut seq, "ask")?;
                let _ask_size: f64 = extract_next(&mut seq, "ask_size")?;
                let _daily_change: f64 = extract_next(&mut seq, "daily_change")?;
                let _daily_change_relative: f64 = extract_next(&mut seq, "daily_change_relative")?;
                let last = extract_next(&mut seq, "last_price")?;
                let volume = extract_next(&mut seq, "volume")?;

                while seq.next_element::<serde::de::IgnoredAny>()?.is_some() {}

                Ok(BitfinexTicker {
                    bid,
                    ask,
                    last,
                    volume,
                })
            }
        }

        deserializer.deserialize_seq(SeqVisitor)
    }
}
