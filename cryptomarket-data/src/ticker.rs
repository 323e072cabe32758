use serde::{Deserialize, Serialize};

/// Normalised ticker snapshot. Fields a vendor omits are `None`.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Ticker {
    pub symbol: String,
    pub last: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub volume: Option<f64>,
}

/// Listed asset as reported by a listing source (CoinMarketCap, CryptoCompare).
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Instrument {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub rank: Option<u32>,
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
}
