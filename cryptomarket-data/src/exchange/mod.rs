use crate::{
    book::OrderBook,
    candle::Candle,
    error::DataError,
    frequency::Frequency,
    http::{HttpMethod, HttpParser, RestRequest},
    ticker::{Instrument, Ticker},
};
use chrono::{DateTime, Utc};
use cryptomarket_instrument::{
    exchange::ExchangeId,
    market::{MarketPair, SymbolConvention},
};
use serde_json::Value;
use std::{borrow::Cow, collections::BTreeMap, fmt, sync::Arc, time::Duration};
use tracing::debug;

/// Candle endpoint conventions ([`Dialect`](dialect::Dialect)) shared by the adapters.
pub mod dialect;

/// Bitfinex (v2 public API) adapter.
pub mod bitfinex;

/// BitMEX adapter.
pub mod bitmex;

/// Bittrex (v1.1 public API) adapter.
pub mod bittrex;

/// CoinMarketCap (v1) adapter.
pub mod coinmarketcap;

/// CryptoCompare coin list adapter.
pub mod cryptocompare;

/// GDAX (Coinbase Exchange) adapter.
pub mod gdax;

/// Poloniex public API adapter.
pub mod poloniex;

use dialect::Dialect;

/// Resolve the [`ExchangeAdapter`] of an [`ExchangeId`].
pub fn adapter(exchange: ExchangeId) -> Arc<dyn ExchangeAdapter> {
    match exchange {
        ExchangeId::Bitfinex => Arc::new(bitfinex::Bitfinex),
        ExchangeId::Bitmex => Arc::new(bitmex::Bitmex),
        ExchangeId::Bittrex => Arc::new(bittrex::Bittrex),
        ExchangeId::CoinMarketCap => Arc::new(coinmarketcap::CoinMarketCap),
        ExchangeId::CryptoCompare => Arc::new(cryptocompare::CryptoCompare),
        ExchangeId::Gdax => Arc::new(gdax::Gdax),
        ExchangeId::Poloniex => Arc::new(poloniex::Poloniex),
    }
}

/// Vendor spelling of a [`Frequency`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VendorFrequency {
    /// eg/ Poloniex `period=1800`, GDAX `granularity=3600`.
    Seconds(i64),
    /// eg/ Bitfinex `1D`, BitMEX `binSize=1h`.
    Token(&'static str),
}

impl fmt::Display for VendorFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorFrequency::Seconds(seconds) => write!(f, "{seconds}"),
            VendorFrequency::Token(token) => f.write_str(token),
        }
    }
}

/// Named parameters of a vendor call, keyed by the vendor's own parameter names.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CallParams(BTreeMap<String, String>);

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Fetch a parameter a call cannot be built without.
    pub fn require(&self, key: &str) -> Result<&str, DataError> {
        self.get(key)
            .ok_or_else(|| DataError::InvalidArgument(format!("missing call parameter: {key}")))
    }

    /// Every parameter except those already consumed (eg/ into the URL path).
    pub fn without<'a>(
        &'a self,
        consumed: &'a [&'a str],
    ) -> impl Iterator<Item = (String, String)> + 'a {
        self.0
            .iter()
            .filter(|(key, _)| !consumed.iter().any(|consumed| consumed == key))
            .map(|(key, value)| (key.clone(), value.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CallParams
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<Iter: IntoIterator<Item = (K, V)>>(iter: Iter) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (key, value)| params.with(key, value))
    }
}

/// Entry of an exchange's public call table.
#[derive(Debug, Copy, Clone)]
pub struct PublicCall {
    /// Vendor call name, eg/ `returnChartData` or `products/candles`.
    pub name: &'static str,
    pub method: HttpMethod,
    pub build: fn(&PublicCall, &CallParams) -> Result<RestRequest, DataError>,
}

impl PublicCall {
    pub const fn get(
        name: &'static str,
        build: fn(&PublicCall, &CallParams) -> Result<RestRequest, DataError>,
    ) -> Self {
        Self {
            name,
            method: HttpMethod::Get,
            build,
        }
    }
}

/// Build a call whose path is its name and whose parameters all go in the query string.
pub fn path_call(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    Ok(RestRequest::new(call.method, format!("/{}", call.name)).queries(params.without(&[])))
}

/// Adapter translating the uniform operations of this crate into one vendor's REST API.
///
/// Capabilities a vendor does not offer keep the default implementations, which fail with
/// [`DataError::UnsupportedCall`].
pub trait ExchangeAdapter: HttpParser + Send + Sync + fmt::Debug {
    fn id(&self) -> ExchangeId {
        self.exchange()
    }

    fn base_url(&self) -> &'static str;

    /// Minimum interval the vendor expects between two consecutive calls.
    fn rate_limit(&self) -> Duration;

    /// Candle endpoint conventions, `None` if the vendor offers no candles.
    fn dialect(&self) -> Option<Dialect> {
        None
    }

    fn calls(&self) -> &'static [PublicCall];

    /// Vendor private calls. None are supported since requests are never signed.
    fn private_calls(&self) -> &'static [&'static str] {
        &[]
    }

    /// Translate an underscored call name (eg/ `return_chart_data`) to the vendor spelling.
    fn translate_call_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    /// Build the [`RestRequest`] of a call in the vendor's public call table.
    fn build_request(&self, call: &str, params: &CallParams) -> Result<RestRequest, DataError> {
        let name = self.translate_call_name(call);

        let Some(entry) = self
            .calls()
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(&name))
        else {
            if self
                .private_calls()
                .iter()
                .any(|private| private.eq_ignore_ascii_case(&name))
            {
                debug!(exchange = %self.id(), call = %name, "private calls are not supported");
            }
            return Err(self.unsupported(call));
        };

        (entry.build)(entry, params)
    }

    fn unsupported(&self, call: &str) -> DataError {
        DataError::UnsupportedCall {
            exchange: self.id(),
            call: call.to_owned(),
        }
    }

    fn symbol_convention(&self) -> SymbolConvention {
        SymbolConvention::BASE_QUOTE_UNDERSCORE
    }

    /// Native base & quote asset of a vendor symbol.
    fn market_pair(&self, symbol: &str) -> Option<MarketPair> {
        MarketPair::parse(symbol, self.symbol_convention()).ok()
    }

    fn vendor_frequency(&self, _frequency: Frequency) -> Result<VendorFrequency, DataError> {
        Err(self.unsupported("candles"))
    }

    /// Resolve a raw vendor period (eg/ Poloniex `1800`, Bitfinex `1h`) to its [`Frequency`].
    fn frequency_of_period(&self, period: &str) -> Result<Frequency, DataError> {
        if self.dialect().is_none() {
            return Err(self.unsupported("candles"));
        }

        let period = period.trim();
        Frequency::ALL
            .into_iter()
            .find(|frequency| {
                self.vendor_frequency(*frequency)
                    .is_ok_and(|vendor| vendor.to_string() == period)
            })
            .ok_or_else(|| {
                DataError::InvalidArgument(format!("{} does not support period {period}", self.id()))
            })
    }

    /// Build a request for the candles of `market` in the half-open window `[start, end)`.
    fn candle_request(
        &self,
        _market: &str,
        _frequency: Frequency,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<RestRequest, DataError> {
        Err(self.unsupported("candles"))
    }

    /// Parse a candle page payload, in the vendor's row order.
    fn parse_candles(&self, _payload: Value, _frequency: Frequency) -> Result<Vec<Candle>, DataError> {
        Err(self.unsupported("candles"))
    }

    fn order_book_request(&self, _market: &str, _depth: Option<usize>) -> Result<RestRequest, DataError> {
        Err(self.unsupported("order_book"))
    }

    fn parse_order_book(&self, _payload: Value, _depth: Option<usize>) -> Result<OrderBook, DataError> {
        Err(self.unsupported("order_book"))
    }

    fn ticker_request(&self, _market: &str) -> Result<RestRequest, DataError> {
        Err(self.unsupported("ticker"))
    }

    fn parse_ticker(&self, _payload: Value, _market: &str) -> Result<Ticker, DataError> {
        Err(self.unsupported("ticker"))
    }

    fn instruments_request(&self) -> Result<RestRequest, DataError> {
        Err(self.unsupported("instruments"))
    }

    fn parse_instruments(&self, _payload: Value) -> Result<Vec<Instrument>, DataError> {
        Err(self.unsupported("instruments"))
    }
}

/// Translate a supported [`Frequency`] via a vendor table, rejecting anything else.
pub(crate) fn lookup_frequency(
    exchange: ExchangeId,
    table: &[(Frequency, VendorFrequency)],
    frequency: Frequency,
) -> Result<VendorFrequency, DataError> {
    table
        .iter()
        .find(|(supported, _)| *supported == frequency)
        .map(|(_, vendor)| *vendor)
        .ok_or_else(|| {
            DataError::InvalidArgument(format!("{exchange} does not support frequency {frequency}"))
        })
}

/// Deserialize a vendor payload into a DTO, mapping failures to
/// [`DataError::MalformedResponse`].
pub(crate) fn decode<T>(exchange: ExchangeId, payload: Value) -> Result<T, DataError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(payload).map_err(|error| DataError::malformed(exchange, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_dispatch() {
        for exchange in ExchangeId::ALL {
            assert_eq!(adapter(exchange).id(), exchange);
        }
    }

    #[test]
    fn test_call_params() {
        let params = CallParams::from_iter([("product_id", "ETH-BTC"), ("granularity", "3600")]);

        assert_eq!(params.require("product_id").unwrap(), "ETH-BTC");
        assert!(matches!(
            params.require("start"),
            Err(DataError::InvalidArgument(_))
        ));
        assert_eq!(
            params.without(&["product_id"]).collect::<Vec<_>>(),
            vec![("granularity".to_owned(), "3600".to_owned())]
        );
    }

    #[test]
    fn test_build_request_unknown_call_is_unsupported() {
        for exchange in ExchangeId::ALL {
            let adapter = adapter(exchange);
            let actual = adapter.build_request("definitely_not_a_call", &CallParams::new());
            assert!(
                matches!(actual, Err(DataError::UnsupportedCall { exchange: id, .. }) if id == exchange),
                "{exchange} failed"
            );
        }
    }

    #[test]
    fn test_frequency_of_period() {
        struct TestCase {
            exchange: ExchangeId,
            period: &'static str,
            expected: Option<Frequency>,
        }

        let cases = vec![
            // TC0: Poloniex periods are seconds
            TestCase {
                exchange: ExchangeId::Poloniex,
                period: "1800",
                expected: Some(Frequency::M30),
            },
            // TC1: Bitfinex tokens are case sensitive, 1M is a month
            TestCase {
                exchange: ExchangeId::Bitfinex,
                period: "1M",
                expected: Some(Frequency::Month1),
            },
            // TC2
            TestCase {
                exchange: ExchangeId::Bitfinex,
                period: "1m",
                expected: Some(Frequency::M1),
            },
            // TC3: GDAX granularity
            TestCase {
                exchange: ExchangeId::Gdax,
                period: "86400",
                expected: Some(Frequency::D1),
            },
            // TC4: a valid frequency the vendor does not offer
            TestCase {
                exchange: ExchangeId::Poloniex,
                period: "60",
                expected: None,
            },
            // TC5
            TestCase {
                exchange: ExchangeId::Bitmex,
                period: "1 hour",
                expected: None,
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            let actual = adapter(test.exchange).frequency_of_period(test.period);
            match test.expected {
                Some(expected) => assert_eq!(actual.unwrap(), expected, "TC{index} failed"),
                None => assert!(
                    matches!(actual, Err(DataError::InvalidArgument(_))),
                    "TC{index} failed"
                ),
            }
        }

        assert!(matches!(
            adapter(ExchangeId::Bittrex).frequency_of_period("1800"),
            Err(DataError::UnsupportedCall { exchange: ExchangeId::Bittrex, .. })
        ));
    }

    #[test]
    fn test_lookup_frequency_rejects_unsupported() {
        let table = [(Frequency::H1, VendorFrequency::Seconds(3600))];
        assert_eq!(
            lookup_frequency(ExchangeId::Gdax, &table, Frequency::H1).unwrap(),
            VendorFrequency::Seconds(3600)
        );
        assert!(matches!(
            lookup_frequency(ExchangeId::Gdax, &table, Frequency::H3),
            Err(DataError::InvalidArgument(_))
        ));
    }
}
