use self::candle::GdaxCandle;
use crate::{
    book::{Level, OrderBook},
    candle::Candle,
    de::de_flexible_opt,
    error::DataError,
    exchange::{
        CallParams, ExchangeAdapter, PublicCall, VendorFrequency, decode,
        dialect::{BucketStamp, Dialect, PageOrder, RangeEnd, TimestampUnit},
        lookup_frequency,
    },
    frequency::Frequency,
    http::{HttpParser, RestRequest},
    ticker::Ticker,
};
use chrono::{DateTime, Utc};
use cryptomarket_instrument::{exchange::ExchangeId, market::SymbolConvention};
use serde::Deserialize;
use serde_json::Value;
use std::{borrow::Cow, time::Duration};

/// Candle DTO.
pub mod candle;

/// Coinbase Exchange (formerly GDAX) REST API base URL.
pub const BASE_URL_GDAX: &str = "https://api.exchange.coinbase.com";

/// Interval between consecutive calls.
pub const RATE_LIMIT_GDAX: Duration = Duration::from_millis(1000);

/// Maximum number of candles returned by a single request.
const PAGE_LIMIT: u32 = 300;

const DIALECT: Dialect = Dialect {
    timestamp_unit: TimestampUnit::Iso8601,
    range_end: RangeEnd::Exclusive,
    order: PageOrder::NewestFirst,
    bucket_stamp: BucketStamp::Open,
    page_limit: Some(PAGE_LIMIT),
};

const FREQUENCIES: [(Frequency, VendorFrequency); 6] = [
    (Frequency::M1, VendorFrequency::Seconds(60)),
    (Frequency::M5, VendorFrequency::Seconds(300)),
    (Frequency::M15, VendorFrequency::Seconds(900)),
    (Frequency::H1, VendorFrequency::Seconds(3600)),
    (Frequency::H6, VendorFrequency::Seconds(21_600)),
    (Frequency::D1, VendorFrequency::Seconds(86_400)),
];

static CALLS: [PublicCall; 7] = [
    PublicCall::get("products", product_call),
    PublicCall::get("products/book", product_call),
    PublicCall::get("products/trades", product_call),
    PublicCall::get("products/candles", product_call),
    PublicCall::get("products/ticker", product_call),
    PublicCall::get("currencies", product_call),
    PublicCall::get("time", product_call),
];

/// `products/candles` with a `product_id` becomes `/products/{product_id}/candles`.
fn product_call(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    let path = match params.get("product_id") {
        Some(product_id) => {
            let mut segments = call.name.splitn(2, '/');
            let head = segments.next().unwrap_or_default();
            match segments.next() {
                Some(tail) => format!("/{head}/{product_id}/{tail}"),
                None => format!("/{head}/{product_id}"),
            }
        }
        None => format!("/{}", call.name),
    };

    Ok(RestRequest::new(call.method, path).queries(params.without(&["product_id"])))
}

/// [`Gdax`] order book payload (level 2 aggregated).
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "sequence": 3,
///     "bids": [["295.96", "4.39088265", 2]],
///     "asks": [["295.97", "25.23542881", 12]]
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct GdaxOrderBook {
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

/// [`Gdax`] product ticker payload.
///
/// ### Raw Payload Examples
/// ```json
/// {
///     "trade_id": 4729088,
///     "price": "333.99",
///     "size": "0.193",
///     "bid": "333.98",
///     "ask": "333.99",
///     "volume": "5957.11914015",
///     "time": "2015-11-14T20:46:03.511254Z"
/// }
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct GdaxTicker {
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub bid: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub ask: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_opt")]
    pub volume: Option<f64>,
}

/// [`Gdax`] (Coinbase Exchange) public API adapter.
///
/// Products are base first, eg/ `ETH-BTC` is ETH priced in BTC.
#[derive(Debug, Copy, Clone, Default)]
pub struct Gdax;

impl HttpParser for Gdax {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Gdax
    }
}

impl ExchangeAdapter for Gdax {
    fn base_url(&self) -> &'static str {
        BASE_URL_GDAX
    }

    fn rate_limit(&self) -> Duration {
        RATE_LIMIT_GDAX
    }

    fn dialect(&self) -> Option<Dialect> {
        Some(DIALECT)
    }

    fn calls(&self) -> &'static [PublicCall] {
        &CALLS
    }

    /// `products_candles` -> `products/candles`.
    fn translate_call_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match name.contains('_') {
            true => Cow::Owned(name.replace('_', "/")),
            false => Cow::Borrowed(name),
        }
    }

    fn symbol_convention(&self) -> SymbolConvention {
        SymbolConvention::BASE_QUOTE_DASH
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
        let granularity = self.vendor_frequency(frequency)?;
        let (start, end) = DIALECT.page_bounds(start, end, frequency);

        let params = CallParams::new()
            .with("product_id", market)
            .with("granularity", granularity)
            .with("start", DIALECT.encode(start))
            .with("end", DIALECT.encode(end));

        self.build_request("products_candles", &params)
    }

    fn parse_candles(&self, payload: Value, frequency: Frequency) -> Result<Vec<Candle>, DataError> {
        let rows = decode::<Vec<GdaxCandle>>(self.id(), payload)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_candle(frequency))
            .collect())
    }

    fn order_book_request(&self, market: &str, _depth: Option<usize>) -> Result<RestRequest, DataError> {
        let params = CallParams::new()
            .with("product_id", market)
            .with("level", 2);
        self.build_request("products_book", &params)
    }

    fn parse_order_book(&self, payload: Value, depth: Option<usize>) -> Result<OrderBook, DataError> {
        let book = decode::<GdaxOrderBook>(self.id(), payload)?;
        Ok(OrderBook::new(book.bids, book.asks, depth))
    }

    fn ticker_request(&self, market: &str) -> Result<RestRequest, DataError> {
        self.build_request("products_ticker", &CallParams::new().with("product_id", market))
    }

    fn parse_ticker(&self, payload: Value, market: &str) -> Result<Ticker, DataError> {
        let ticker = decode::<GdaxTicker>(self.id(), payload)?;
        Ok(Ticker {
            symbol: market.to_owned(),
            last: ticker.price,
            bid: ticker.bid,
            ask: ticker.ask,
            volume: ticker.volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn time(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_candle_request_clamped_to_page_limit() {
        let start = 1_609_459_200;
        let request = Gdax
            .candle_request("ETH-BTC", Frequency::H1, time(start), time(start + 1000 * 3600))
            .unwrap();

        assert_eq!(request.path, "/products/ETH-BTC/candles");
        assert_eq!(request.query_value("granularity"), Some("3600"));
        assert_eq!(request.query_value("start"), Some("2021-01-01T00:00:00Z"));
        assert_eq!(request.query_value("end"), Some("2021-01-13T12:00:00Z"));
        assert_eq!(request.query_value("product_id"), None);
    }

    #[test]
    fn test_product_call_paths() {
        struct TestCase {
            call: &'static str,
            params: CallParams,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: product listing
                call: "products",
                params: CallParams::new(),
                expected: "/products",
            },
            TestCase {
                // TC1: single product
                call: "products",
                params: CallParams::new().with("product_id", "BTC-USD"),
                expected: "/products/BTC-USD",
            },
            TestCase {
                // TC2: product sub resource
                call: "products_trades",
                params: CallParams::new().with("product_id", "BTC-USD"),
                expected: "/products/BTC-USD/trades",
            },
            TestCase {
                // TC3
                call: "time",
                params: CallParams::new(),
                expected: "/time",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = Gdax.build_request(test.call, &test.params).unwrap();
            assert_eq!(actual.path, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_parse_candles_vendor_order() {
        let payload = json!([
            [1609462800, 1.0, 2.0, 1.5, 1.6, 10.0],
            [1609459200, 1.0, 2.0, 1.5, 1.6, 10.0]
        ]);
        let candles = Gdax.parse_candles(payload, Frequency::H1).unwrap();
        let ordered = DIALECT.normalise(candles);
        assert_eq!(ordered[0].start_time, time(1_609_459_200));
        assert_eq!(ordered[1].start_time, time(1_609_462_800));
    }

    #[test]
    fn test_parse_api_error() {
        let error = Gdax.parse_api_error(StatusCode::NOT_FOUND, &json!({"message": "NotFound"}));
        assert!(
            matches!(error, DataError::Http { exchange: ExchangeId::Gdax, status: 404, ref message } if message == "NotFound")
        );
    }

    #[test]
    fn test_unsupported_frequency() {
        assert!(matches!(
            Gdax.vendor_frequency(Frequency::M30),
            Err(DataError::InvalidArgument(_))
        ));
    }
}
