use crate::de::{FlexibleF64, extract_next};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Normalised order book snapshot.
///
/// Bids are sorted best-first (descending price), asks best-first (ascending price).
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct OrderBook {
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

impl OrderBook {
    /// Construct a sorted [`OrderBook`], truncating each side to `depth` levels if provided.
    pub fn new<Bids, Asks>(bids: Bids, asks: Asks, depth: Option<usize>) -> Self
    where
        Bids: IntoIterator<Item = Level>,
        Asks: IntoIterator<Item = Level>,
    {
        let mut bids = bids.into_iter().collect::<Vec<_>>();
        let mut asks = asks.into_iter().collect::<Vec<_>>();

        bids.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(Ordering::Equal));
        asks.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));

        if let Some(depth) = depth {
            bids.truncate(depth);
            asks.truncate(depth);
        }

        Self { bids, asks }
    }

    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }

    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }
}

/// Single price level of an [`OrderBook`] side.
///
/// Deserialises from a `[price, quantity]` array where either element may be a string or a
/// number, which is how Poloniex, GDAX and Bittrex-style payloads encode levels.
#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
pub struct Level {
    pub price: f64,
    pub quantity: f64,
}

impl Level {
    pub fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct SeqVisitor;

        impl<'de> serde::de::Visitor<'de> for SeqVisitor {
            type Value = Level;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("Level [price, quantity, ..]")
            }

            fn visit_seq<SeqAccessor>(
                self,
                mut seq: SeqAccessor,
            ) -> Result<Self::Value, SeqAccessor::Error>
            where
                SeqAccessor: serde::de::SeqAccess<'de>,
            {
                let FlexibleF64(price) = extract_next(&mut seq, "price")?;
                let FlexibleF64(quantity) = extract_next(&mut seq, "quantity")?;

                // GDAX level 2 appends the number of orders
                while seq.next_element::<serde::de::IgnoredAny>()?.is_some() {}

                Ok(Level { price, quantity })
            }
        }

        deserializer.deserialize_seq(SeqVisitor)
    }
}
