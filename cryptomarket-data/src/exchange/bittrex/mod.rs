use crate::{
    book::{Level, OrderBook},
    de::de_flexible_opt,
    error::DataError,
    exchange::{CallParams, ExchangeAdapter, PublicCall, decode},
    http::{HttpParser, RestRequest, error_message},
    ticker::Ticker,
};
use cryptomarket_instrument::{exchange::ExchangeId, market::SymbolConvention};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::{borrow::Cow, time::Duration};

/// Bittrex REST API base URL, without version.
pub const BASE_URL_BITTREX: &str = "https://bittrex.com/api";

/// Interval between consecutive calls.
pub const RATE_LIMIT_BITTREX: Duration = Duration::from_millis(1500);

static CALLS: [PublicCall; 8] = [
    PublicCall::get("getmarkets", versioned_call),
    PublicCall::get("getcurrencies", versioned_call),
    PublicCall::get("getticker", versioned_call),
    PublicCall::get("getmarketsummaries", versioned_call),
    PublicCall::get("getmarketsummary", versioned_call),
    PublicCall::get("getorderbook", versioned_call),
    PublicCall::get("getmarkethistory", versioned_call),
    PublicCall::get("getticks", versioned_call),
];

/// `getticks` only exists on the v2 API, everything else is served by v1.1.
fn versioned_call(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    let version = match call.name {
        "getticks" => "v2",
        _ => "v1.1",
    };

    Ok(RestRequest::new(call.method, format!("/{version}/public/{}", call.name))
        .queries(params.without(&[])))
}

/// [`Bittrex`] response envelope.
///
/// ### Raw Payload Examples
/// ```json
/// {"success": false, "message": "INVALID_MARKET", "result": null}
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BittrexResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub result: Option<T>,
}

/// [`Bittrex`] `getorderbook?type=both` result.
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "buy": [{"Quantity": 12.37, "Rate": 0.02525}],
///     "sell": [{"Quantity": 32.55, "Rate": 0.02540}]
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BittrexOrderBook {
    #[serde(default)]
    pub buy: Vec<BittrexLevel>,
    #[serde(default)]
    pub sell: Vec<BittrexLevel>,
}

#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BittrexLevel {
    pub quantity: f64,
    pub rate: f64,
}

impl From<BittrexLevel> for Level {
    fn from(level: BittrexLevel) -> Self {
        Level::new(level.rate, level.quantity)
    }
}

/// [`Bittrex`] `getticker` result.
///
/// ### Raw Payload Examples
/// ```json
/// {"Bid": 2.05670368, "Ask": 3.35579531, "Last": 3.35579531}
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BittrexTicker {
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub bid: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub ask: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub last: Option<f64>,
}

/// [`Bittrex`] public API adapter.
///
/// Markets are quote first, eg/ `BTC-LTC` is LTC priced in BTC.
#[derive(Debug, Copy, Clone, Default)]
pub struct Bittrex;

impl Bittrex {
    fn unwrap_result<T>(self, payload: Value) -> Result<T, DataError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = decode::<BittrexResponse<T>>(self.id(), payload)?;
        response
            .result
            .ok_or_else(|| DataError::malformed(self.id(), "missing result"))
    }
}

impl HttpParser for Bittrex {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Bittrex
    }

    fn validate_payload(&self, payload: &Value) -> Result<(), DataError> {
        // Bittrex reports failures with HTTP 200 and "success": false
        match payload.get("success").and_then(Value::as_bool) {
            Some(false) => Err(DataError::Http {
                exchange: self.exchange(),
                status: StatusCode::OK.as_u16(),
                message: error_message(payload),
            }),
            _ => Ok(()),
        }
    }
}

impl ExchangeAdapter for Bittrex {
    fn base_url(&self) -> &'static str {
        BASE_URL_BITTREX
    }

    fn rate_limit(&self) -> Duration {
        RATE_LIMIT_BITTREX
    }

    fn calls(&self) -> &'static [PublicCall] {
        &CALLS
    }

    /// `get_order_book` -> `getorderbook`.
    fn translate_call_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match name.contains('_') {
            true => Cow::Owned(name.replace('_', "")),
            false => Cow::Borrowed(name),
        }
    }

    fn symbol_convention(&self) -> SymbolConvention {
        SymbolConvention::QUOTE_BASE_DASH
    }

    fn order_book_request(&self, market: &str, _depth: Option<usize>) -> Result<RestRequest, DataError> {
        let params = CallParams::new()
            .with("market", market)
            .with("type", "both");
        self.build_request("get_order_book", &params)
    }

    fn parse_order_book(&self, payload: Value, depth: Option<usize>) -> Result<OrderBook, DataError> {
        let book = self.unwrap_result::<BittrexOrderBook>(payload)?;
        Ok(OrderBook::new(
            book.buy.into_iter().map(Level::from),
            book.sell.into_iter().map(Level::from),
            depth,
        ))
    }

    fn ticker_request(&self, market: &str) -> Result<RestRequest, DataError> {
        self.build_request("get_ticker", &CallParams::new().with("market", market))
    }

    fn parse_ticker(&self, payload: Value, market: &str) -> Result<Ticker, DataError> {
        let ticker = self.unwrap_result::<BittrexTicker>(payload)?;
        Ok(Ticker {
            symbol: market.to_owned(),
            last: ticker.last,
            bid: ticker.bid,
            ask: ticker.ask,
            volume: None,
        })
    }
}
