use crate::{
    de::de_flexible_opt,
    error::DataError,
    exchange::{CallParams, ExchangeAdapter, PublicCall, decode},
    http::{HttpParser, RestRequest},
    ticker::Instrument,
};
use cryptomarket_instrument::exchange::ExchangeId;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// CoinMarketCap v1 API base URL.
pub const BASE_URL_COINMARKETCAP: &str = "https://api.coinmarketcap.com/v1";

/// Interval between consecutive calls.
pub const RATE_LIMIT_COINMARKETCAP: Duration = Duration::from_millis(10_000);

static CALLS: [PublicCall; 2] = [
    PublicCall::get("ticker", trailing_slash_call),
    PublicCall::get("global", trailing_slash_call),
];

/// `ticker` with an `id` becomes `/ticker/{id}/`. Every path ends with a slash.
fn trailing_slash_call(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    let path = match (call.name, params.get("id")) {
        ("ticker", Some(id)) => format!("/ticker/{id}/"),
        (name, _) => format!("/{name}/"),
    };

    Ok(RestRequest::new(call.method, path).queries(params.without(&["id"])))
}

/// [`CoinMarketCap`] `ticker` row.
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "id": "bitcoin",
///     "name": "Bitcoin",
///     "symbol": "BTC",
///     "rank": "1",
///     "price_usd": "573.137",
///     "price_btc": "1.0",
///     "24h_volume_usd": "72855700.0",
///     "market_cap_usd": "9080883500.0"
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct CoinMarketCapTicker {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub rank: Option<u32>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub price_usd: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub market_cap_usd: Option<f64>,
}

impl From<CoinMarketCapTicker> for Instrument {
    fn from(ticker: CoinMarketCapTicker) -> Self {
        Self {
            id: ticker.id,
            name: ticker.name,
            symbol: ticker.symbol,
            rank: ticker.rank,
            price_usd: ticker.price_usd,
            market_cap_usd: ticker.market_cap_usd,
        }
    }
}

/// [`CoinMarketCap`] public API adapter. Only lists instruments, it is not an exchange.
#[derive(Debug, Copy, Clone, Default)]
pub struct CoinMarketCap;

impl HttpParser for CoinMarketCap {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::CoinMarketCap
    }
}

impl ExchangeAdapter for CoinMarketCap {
    fn base_url(&self) -> &'static str {
        BASE_URL_COINMARKETCAP
    }

    fn rate_limit(&self) -> Duration {
        RATE_LIMIT_COINMARKETCAP
    }

    fn calls(&self) -> &'static [PublicCall] {
        &CALLS
    }

    fn instruments_request(&self) -> Result<RestRequest, DataError> {
        self.build_request("ticker", &CallParams::new().with("limit", 0))
    }

    fn parse_instruments(&self, payload: Value) -> Result<Vec<Instrument>, DataError> {
        let rows = decode::<Vec<CoinMarketCapTicker>>(self.id(), payload)?;
        Ok(rows.into_iter().map(Instrument::from).collect())
    }
}
