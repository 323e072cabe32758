use self::{
    book::{BitfinexBookEntry, BitfinexTicker},
    candle::BitfinexCandle,
};
use crate::{
    book::OrderBook,
    candle::Candle,
    error::DataError,
    exchange::{
        CallParams, ExchangeAdapter, PublicCall, VendorFrequency, decode,
        dialect::{BucketStamp, Dialect, PageOrder, RangeEnd, TimestampUnit},
        lookup_frequency, path_call,
    },
    frequency::Frequency,
    http::{HttpParser, RestRequest},
    ticker::Ticker,
};
use chrono::{DateTime, Utc};
use cryptomarket_instrument::{exchange::ExchangeId, market::SymbolConvention};
use itertools::Itertools;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Order book entry & ticker DTOs.
pub mod book;

/// Candle DTO.
pub mod candle;

/// Bitfinex v2 public REST API base URL.
pub const BASE_URL_BITFINEX: &str = "https://api-pub.bitfinex.com/v2";

/// Interval between consecutive calls.
pub const RATE_LIMIT_BITFINEX: Duration = Duration::from_millis(1500);

/// Bitfinex error code returned when throttling.
const RATE_LIMIT_CODE: i64 = 11010;

/// Maximum number of candles returned by a single request.
const PAGE_LIMIT: u32 = 10_000;

const DIALECT: Dialect = Dialect {
    timestamp_unit: TimestampUnit::Milliseconds,
    range_end: RangeEnd::Inclusive,
    order: PageOrder::OldestFirst,
    bucket_stamp: BucketStamp::Open,
    page_limit: Some(PAGE_LIMIT),
};

const FREQUENCIES: [(Frequency, VendorFrequency); 12] = [
    (Frequency::M1, VendorFrequency::Token("1m")),
    (Frequency::M5, VendorFrequency::Token("5m")),
    (Frequency::M15, VendorFrequency::Token("15m")),
    (Frequency::M30, VendorFrequency::Token("30m")),
    (Frequency::H1, VendorFrequency::Token("1h")),
    (Frequency::H3, VendorFrequency::Token("3h")),
    (Frequency::H6, VendorFrequency::Token("6h")),
    (Frequency::H12, VendorFrequency::Token("12h")),
    (Frequency::D1, VendorFrequency::Token("1D")),
    (Frequency::W1, VendorFrequency::Token("7D")),
    (Frequency::W2, VendorFrequency::Token("14D")),
    (Frequency::Month1, VendorFrequency::Token("1M")),
];

static CALLS: [PublicCall; 6] = [
    PublicCall::get("tickers", path_call),
    PublicCall::get("ticker", ticker),
    PublicCall::get("trades", trades),
    PublicCall::get("book", book),
    PublicCall::get("stats1", stats1),
    PublicCall::get("candles", candles),
];

/// `ticker/{symbol}`
fn ticker(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    let symbol = params.require("symbol")?;
    Ok(RestRequest::new(call.method, format!("/{}/{symbol}", call.name))
        .queries(params.without(&["symbol"])))
}

/// `trades/{symbol}/hist`
fn trades(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    let symbol = params.require("symbol")?;
    Ok(
        RestRequest::new(call.method, format!("/{}/{symbol}/hist", call.name))
            .queries(params.without(&["symbol"])),
    )
}

/// `book/{symbol}/{precision}`
fn book(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    let symbol = params.require("symbol")?;
    let precision = params.require("precision")?;
    Ok(
        RestRequest::new(call.method, format!("/{}/{symbol}/{precision}", call.name))
            .queries(params.without(&["symbol", "precision"])),
    )
}

/// `stats1/{key}:{size}:{symbol}/{section}`
fn stats1(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    let key = params.require("key")?;
    let size = params.require("size")?;
    let symbol = params.require("symbol")?;
    let section = params.require("section")?;
    Ok(RestRequest::new(
        call.method,
        format!("/{}/{key}:{size}:{symbol}/{section}", call.name),
    )
    .queries(params.without(&["key", "size", "symbol", "section"])))
}

/// `candles/trade:{timeframe}:{symbol}/{section}`
fn candles(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    let timeframe = params.require("timeframe")?;
    let symbol = params.require("symbol")?;
    let section = params.require("section")?;
    Ok(RestRequest::new(
        call.method,
        format!("/{}/trade:{timeframe}:{symbol}/{section}", call.name),
    )
    .queries(params.without(&["timeframe", "symbol", "section"])))
}

/// [`Bitfinex`] v2 public API adapter.
///
/// Symbols are prefixed with `t` for trading pairs, eg/ `tETHBTC` or `tDOGE:USD`.
#[derive(Debug, Copy, Clone, Default)]
pub struct Bitfinex;

impl HttpParser for Bitfinex {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Bitfinex
    }

    /// Bitfinex errors are arrays: `["error", 10020, "limit: invalid"]`.
    fn parse_api_error(&self, status: StatusCode, payload: &Value) -> DataError {
        let code = payload.get(1).and_then(Value::as_i64);

        if status == StatusCode::TOO_MANY_REQUESTS || code == Some(RATE_LIMIT_CODE) {
            return DataError::RateLimit {
                exchange: self.exchange(),
                retry_after: None,
            };
        }

        let message = match payload.as_array() {
            Some(fields) => fields
                .iter()
                .skip(1)
                .map(|field| match field {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .join(" "),
            None => crate::http::error_message(payload),
        };

        DataError::Http {
            exchange: self.exchange(),
            status: status.as_u16(),
            message,
        }
    }
}

impl ExchangeAdapter for Bitfinex {
    fn base_url(&self) -> &'static str {
        BASE_URL_BITFINEX
    }

    fn rate_limit(&self) -> Duration {
        RATE_LIMIT_BITFINEX
    }

    fn dialect(&self) -> Option<Dialect> {
        Some(DIALECT)
    }

    fn calls(&self) -> &'static [PublicCall] {
        &CALLS
    }

    fn symbol_convention(&self) -> SymbolConvention {
        SymbolConvention::BITFINEX
    }

    fn vendor_frequency(&self, frequency: Frequency) -> Result<VendorFrequency, DataError> {
        lookup_frequency(self.id(), &FREQUENCIES, frequency)
    }

    fn candle_request(
        &self,
        market: &str,
        frequency: Frequency,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RestRequest, DataError> {
        let timeframe = self.vendor_frequency(frequency)?;
        let (start, end) = DIALECT.page_bounds(start, end, frequency);

        let params = CallParams::new()
            .with("timeframe", timeframe)
            .with("symbol", market)
            .with("section", "hist")
            .with("start", DIALECT.encode(start))
            .with("end", DIALECT.encode(end))
            .with("sort", 1)
            .with("limit", PAGE_LIMIT);

        self.build_request("candles", &params)
    }

    fn parse_candles(&self, payload: Value, frequency: Frequency) -> Result<Vec<Candle>, DataError> {
        let rows = decode::<Vec<BitfinexCandle>>(self.id(), payload)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_candle(frequency))
            .collect())
    }

    fn order_book_request(&self, market: &str, depth: Option<usize>) -> Result<RestRequest, DataError> {
        // Bitfinex only accepts lengths of 1, 25 or 100
        let len = match depth {
            Some(1) => 1,
            Some(depth) if depth <= 25 => 25,
            _ => 100,
        };

        let params = CallParams::new()
            .with("symbol", market)
            .with("precision", "P0")
            .with("len", len);

        self.build_request("book", &params)
    }

    fn parse_order_book(&self, payload: Value, depth: Option<usize>) -> Result<OrderBook, DataError> {
        let entries = decode::<Vec<BitfinexBookEntry>>(self.id(), payload)?;
        let (bids, asks): (Vec<_>, Vec<_>) = entries.into_iter().partition(BitfinexBookEntry::is_bid);

        Ok(OrderBook::new(
            bids.iter().map(BitfinexBookEntry::level),
            asks.iter().map(BitfinexBookEntry::level),
            depth,
        ))
    }

    fn ticker_request(&self, market: &str) -> Result<RestRequest, DataError> {
        self.build_request("ticker", &CallParams::new().with("symbol", market))
    }

    fn parse_ticker(&self, payload: Value, market: &str) -> Result<Ticker, DataError> {
        let ticker = decode::<BitfinexTicker>(self.id(), payload)?;
        Ok(Ticker {
            symbol: market.to_owned(),
            last: Some(ticker.last),
            bid: Some(ticker.bid),
            ask: Some(ticker.ask),
            volume: Some(ticker.volume),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn time(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_candle_request() {
        let request = Bitfinex
            .candle_request("tETHBTC", Frequency::D1, time(1_609_459_200), time(1_609_718_400))
            .unwrap();

        assert_eq!(request.path, "/candles/trade:1D:tETHBTC/hist");
        assert_eq!(request.query_value("start"), Some("1609459200000"));
        assert_eq!(request.query_value("end"), Some("1609632000000"));
        assert_eq!(request.query_value("sort"), Some("1"));
        assert_eq!(request.query_value("symbol"), None);
    }

    #[test]
    fn test_call_table_paths() {
        struct TestCase {
            call: &'static str,
            params: CallParams,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0
                call: "tickers",
                params: CallParams::new().with("symbols", "tBTCUSD"),
                expected: "/tickers",
            },
            TestCase {
                // TC1
                call: "trades",
                params: CallParams::new().with("symbol", "tBTCUSD"),
                expected: "/trades/tBTCUSD/hist",
            },
            TestCase {
                // TC2
                call: "stats1",
                params: CallParams::from_iter([
                    ("key", "pos.size"),
                    ("size", "1m"),
                    ("symbol", "tBTCUSD"),
                    ("section", "last"),
                ]),
                expected: "/stats1/pos.size:1m:tBTCUSD/last",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = Bitfinex.build_request(test.call, &test.params).unwrap();
            assert_eq!(actual.path, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_call_missing_param() {
        assert!(matches!(
            Bitfinex.build_request("ticker", &CallParams::new()),
            Err(DataError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_api_error() {
        assert!(matches!(
            Bitfinex.parse_api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!(["error", 11010, "ratelimit: error"])
            ),
            DataError::RateLimit { exchange: ExchangeId::Bitfinex, .. }
        ));

        let error = Bitfinex.parse_api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!(["error", 10020, "symbol: invalid"]),
        );
        assert!(
            matches!(error, DataError::Http { status: 500, ref message, .. } if message == "10020 symbol: invalid")
        );
    }

    #[test]
    fn test_parse_order_book_partitions_sides() {
        let payload = json!([[100.0, 1, 2.0], [99.0, 2, 1.0], [101.0, 1, -3.0], [102.0, 1, -0.5]]);
        let book = Bitfinex.parse_order_book(payload, Some(1)).unwrap();
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.bids[0].price, 100.0);
        assert_eq!(book.asks[0].price, 101.0);
        assert_eq!(book.asks[0].quantity, 3.0);
    }

    #[test]
    fn test_market_pair() {
        let pair = Bitfinex.market_pair("tETHBTC").unwrap();
        assert_eq!(pair.base, "ETH");
        assert_eq!(pair.quote, "BTC");
    }
}
