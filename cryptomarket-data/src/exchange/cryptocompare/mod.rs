use crate::{
    de::de_available_opt,
    error::DataError,
    exchange::{CallParams, ExchangeAdapter, PublicCall, decode},
    http::{HttpParser, RestRequest, error_message},
    ticker::Instrument,
};
use cryptomarket_instrument::exchange::ExchangeId;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};

/// CryptoCompare data API base URL.
pub const BASE_URL_CRYPTOCOMPARE: &str = "https://www.cryptocompare.com/api/data";

/// Interval between consecutive calls.
pub const RATE_LIMIT_CRYPTOCOMPARE: Duration = Duration::from_millis(1000);

static CALLS: [PublicCall; 1] = [PublicCall::get("coinlist", coinlist_call)];

/// `coinlist` is served at `/coinlist/` and takes no parameters.
fn coinlist_call(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    Ok(RestRequest::new(call.method, format!("/{}/", call.name)).queries(params.without(&[])))
}

/// [`CryptoCompare`] response envelope.
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "Response": "Success",
///     "BaseImageUrl": "https://www.cryptocompare.com",
///     "Data": {"BCN": {...}, "STX": {...}}
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct CryptoCompareResponse<T> {
    #[serde(rename = "Data")]
    pub data: T,
}

/// [`CryptoCompare`] `coinlist` entry. Placeholder `"N/A"` fields deserialize to `None`.
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "Algorithm": "CryptoNight",
///     "CoinName": "ByteCoin",
///     "FullName": "ByteCoin (BCN)",
///     "FullyPremined": "0",
///     "Id": "5280",
///     "ImageUrl": "/media/12318404/bcn.png",
///     "Name": "BCN",
///     "PreMinedValue": "N/A",
///     "ProofType": "PoW",
///     "SortOrder": "249",
///     "Sponsored": false,
///     "Symbol": "BCN",
///     "Url": "/coins/bcn/overview"
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CryptoCompareCoin {
    pub id: String,
    pub coin_name: String,
    pub full_name: String,
    pub symbol: String,
    #[serde(default, deserialize_with = "de_available_opt")]
    pub algorithm: Option<String>,
    #[serde(default, deserialize_with = "de_available_opt")]
    pub proof_type: Option<String>,
    #[serde(default, deserialize_with = "de_available_opt")]
    pub sort_order: Option<u32>,
    #[serde(default, deserialize_with = "de_available_opt")]
    pub pre_mined_value: Option<f64>,
    #[serde(default)]
    pub sponsored: bool,
}

impl From<CryptoCompareCoin> for Instrument {
    fn from(coin: CryptoCompareCoin) -> Self {
        Self {
            id: coin.id,
            name: coin.coin_name,
            symbol: coin.symbol,
            rank: coin.sort_order,
            price_usd: None,
            market_cap_usd: None,
        }
    }
}

/// [`CryptoCompare`] public API adapter. Only lists coins, it is not an exchange.
#[derive(Debug, Copy, Clone, Default)]
pub struct CryptoCompare;

impl HttpParser for CryptoCompare {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::CryptoCompare
    }

    fn validate_payload(&self, payload: &Value) -> Result<(), DataError> {
        // CryptoCompare reports failures with HTTP 200 and "Response": "Error"
        match payload.get("Response").and_then(Value::as_str) {
            Some("Error") => Err(DataError::Http {
                exchange: self.exchange(),
                status: StatusCode::OK.as_u16(),
                message: payload
                    .get("Message")
                    .and_then(Value::as_str)
                    .map_or_else(|| error_message(payload), str::to_owned),
            }),
            _ => Ok(()),
        }
    }
}

impl ExchangeAdapter for CryptoCompare {
    fn base_url(&self) -> &'static str {
        BASE_URL_CRYPTOCOMPARE
    }

    fn rate_limit(&self) -> Duration {
        RATE_LIMIT_CRYPTOCOMPARE
    }

    fn calls(&self) -> &'static [PublicCall] {
        &CALLS
    }

    fn instruments_request(&self) -> Result<RestRequest, DataError> {
        self.build_request("coinlist", &CallParams::new())
    }

    /// Coins ordered by `SortOrder`, unranked coins last.
    fn parse_instruments(&self, payload: Value) -> Result<Vec<Instrument>, DataError> {
        let response =
            decode::<CryptoCompareResponse<BTreeMap<String, CryptoCompareCoin>>>(self.id(), payload)?;

        let mut instruments = response
            .data
            .into_values()
            .map(Instrument::from)
            .collect::<Vec<_>>();
        instruments.sort_by(|a, b| {
            (a.rank.is_none(), a.rank, &a.symbol).cmp(&(b.rank.is_none(), b.rank, &b.symbol))
        });

        Ok(instruments)
    }
}
