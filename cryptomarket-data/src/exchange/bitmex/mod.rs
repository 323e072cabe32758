use self::candle::BitmexCandle;
use crate::{
    book::{Level, OrderBook},
    candle::Candle,
    error::DataError,
    exchange::{
        CallParams, ExchangeAdapter, PublicCall, VendorFrequency, decode,
        dialect::{BucketStamp, Dialect, PageOrder, RangeEnd, TimestampUnit},
        lookup_frequency, path_call,
    },
    frequency::Frequency,
    http::{HttpParser, RestRequest},
};
use chrono::{DateTime, Utc};
use cryptomarket_instrument::{exchange::ExchangeId, market::SymbolConvention};
use serde::Deserialize;
use serde_json::Value;
use std::{borrow::Cow, time::Duration};

/// `trade/bucketed` candle DTO.
pub mod candle;

/// BitMEX REST API base URL.
pub const BASE_URL_BITMEX: &str = "https://www.bitmex.com/api/v1";

/// Interval between consecutive calls.
pub const RATE_LIMIT_BITMEX: Duration = Duration::from_millis(2000);

/// Maximum number of buckets returned by a single request.
const PAGE_LIMIT: u32 = 750;

const DIALECT: Dialect = Dialect {
    timestamp_unit: TimestampUnit::Iso8601,
    range_end: RangeEnd::Inclusive,
    order: PageOrder::OldestFirst,
    bucket_stamp: BucketStamp::Close,
    page_limit: Some(PAGE_LIMIT),
};

const FREQUENCIES: [(Frequency, VendorFrequency); 4] = [
    (Frequency::M1, VendorFrequency::Token("1m")),
    (Frequency::M5, VendorFrequency::Token("5m")),
    (Frequency::H1, VendorFrequency::Token("1h")),
    (Frequency::D1, VendorFrequency::Token("1d")),
];

static CALLS: [PublicCall; 18] = [
    PublicCall::get("funding", path_call),
    PublicCall::get("instrument", path_call),
    PublicCall::get("instrument/active", path_call),
    PublicCall::get("instrument/activeAndIndices", path_call),
    PublicCall::get("instrument/activeIntervals", path_call),
    PublicCall::get("instrument/compositeIndex", path_call),
    PublicCall::get("instrument/indices", path_call),
    PublicCall::get("insurance", path_call),
    PublicCall::get("liquidation", path_call),
    PublicCall::get("orderBook/L2", path_call),
    PublicCall::get("quote", path_call),
    PublicCall::get("quote/bucketed", path_call),
    PublicCall::get("settlement", path_call),
    PublicCall::get("stats", path_call),
    PublicCall::get("stats/history", path_call),
    PublicCall::get("stats/historyUSD", path_call),
    PublicCall::get("trade", path_call),
    PublicCall::get("trade/bucketed", path_call),
];

/// [`Bitmex`] `orderBook/L2` entry.
///
/// ### Raw Payload Examples
/// ```json
/// {"symbol": "XBTUSD", "id": 8799000000, "side": "Sell", "size": 52000, "price": 10000}
/// ```
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BitmexBookEntry {
    pub side: BitmexSide,
    pub size: f64,
    pub price: f64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize)]
pub enum BitmexSide {
    Buy,
    Sell,
}

/// [`Bitmex`] public API adapter.
///
/// Contract symbols concatenate base and quote, eg/ `XBTUSD`.
#[derive(Debug, Copy, Clone, Default)]
pub struct Bitmex;

impl HttpParser for Bitmex {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Bitmex
    }
}

impl ExchangeAdapter for Bitmex {
    fn base_url(&self) -> &'static str {
        BASE_URL_BITMEX
    }

    fn rate_limit(&self) -> Duration {
        RATE_LIMIT_BITMEX
    }

    fn dialect(&self) -> Option<Dialect> {
        Some(DIALECT)
    }

    fn calls(&self) -> &'static [PublicCall] {
        &CALLS
    }

    /// `trade_bucketed` -> `trade/bucketed`.
    fn translate_call_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match name.contains('_') {
            true => Cow::Owned(name.replace('_', "/")),
            false => Cow::Borrowed(name),
        }
    }

    fn symbol_convention(&self) -> SymbolConvention {
        SymbolConvention::CONCATENATED
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
        let bin_size = self.vendor_frequency(frequency)?;
        let (start, end) = DIALECT.page_bounds(start, end, frequency);

        let params = CallParams::new()
            .with("symbol", market)
            .with("binSize", bin_size)
            .with("startTime", DIALECT.encode(start))
            .with("endTime", DIALECT.encode(end))
            .with("count", PAGE_LIMIT)
            .with("partial", false)
            .with("reverse", false);

        self.build_request("trade_bucketed", &params)
    }

    fn parse_candles(&self, payload: Value, frequency: Frequency) -> Result<Vec<Candle>, DataError> {
        let rows = decode::<Vec<BitmexCandle>>(self.id(), payload)?;

        rows.into_iter()
            .map(|row| row.into_candle(frequency))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| DataError::malformed(self.id(), reason))
    }

    fn order_book_request(&self, market: &str, depth: Option<usize>) -> Result<RestRequest, DataError> {
        let params = CallParams::new()
            .with("symbol", market)
            .with("depth", depth.unwrap_or(0));
        self.build_request("orderBook/L2", &params)
    }

    fn parse_order_book(&self, payload: Value, depth: Option<usize>) -> Result<OrderBook, DataError> {
        let entries = decode::<Vec<BitmexBookEntry>>(self.id(), payload)?;
        let (bids, asks): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.side == BitmexSide::Buy);

        let level = |entry: BitmexBookEntry| Level::new(entry.price, entry.size);

        Ok(OrderBook::new(
            bids.into_iter().map(level),
            asks.into_iter().map(level),
            depth,
        ))
    }
}
