use crate::{book::Level, de::de_flexible_opt, ticker::Ticker};
use serde::Deserialize;

/// Poloniex `returnOrderBook` payload for a single market.
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "asks": [["0.03143500", 46.84591041], ["0.03144000", 100.086388]],
///     "bids": [["0.03141658", 4.75], ["0.03140001", 9.17435012]],
///     "isFrozen": "0",
///     "seq": 73952367
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct PoloniexOrderBook {
    pub asks: Vec<Level>,
    pub bids: Vec<Level>,
}

/// Entry of the Poloniex `returnTicker` payload, keyed by market.
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "BTC_ETH": {
///         "id": 148,
///         "last": "0.02457200",
///         "lowestAsk": "0.02458000",
///         "highestBid": "0.02457100",
///         "percentChange": "0.00874200",
///         "baseVolume": "234.98237612",
///         "quoteVolume": "9591.12813110"
///     }
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexTicker {
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub last: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub lowest_ask: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub highest_bid: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub quote_volume: Option<f64>,
}

impl PoloniexTicker {
    pub fn into_ticker(self, market: &str) -> Ticker {
        Ticker {
            symbol: market.to_owned(),
            last: self.last,
            bid: self.highest_bid,
            ask: self.lowest_ask,
            volume: self.quote_volume,
        }
    }
}
