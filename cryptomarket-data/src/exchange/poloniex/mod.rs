use self::{
    book::{PoloniexOrderBook, PoloniexTicker},
    candle::PoloniexCandle,
};
use crate::{
    book::OrderBook,
    candle::Candle,
    error::DataError,
    exchange::{
        CallParams, ExchangeAdapter, PublicCall, VendorFrequency, decode,
        dialect::{BucketStamp, Dialect, PageOrder, RangeEnd, TimestampUnit},
        lookup_frequency,
    },
    frequency::Frequency,
    http::{HttpParser, RestRequest, error_message},
    ticker::Ticker,
};
use chrono::{DateTime, Utc};
use cryptomarket_instrument::{exchange::ExchangeId, market::SymbolConvention};
use reqwest::StatusCode;
use serde_json::Value;
use std::{borrow::Cow, collections::HashMap, time::Duration};

/// Order book & ticker DTOs.
pub mod book;

/// `returnChartData` candle DTO.
pub mod candle;

/// Poloniex public API base URL. Every call hits this URL, dispatching on `command`.
pub const BASE_URL_POLONIEX: &str = "https://poloniex.com/public";

/// Interval between consecutive calls.
pub const RATE_LIMIT_POLONIEX: Duration = Duration::from_millis(1000);

/// Prefix of the Poloniex payload returned when throttling.
const RATE_LIMIT_MESSAGE: &str = "Please do not make more than";

const DIALECT: Dialect = Dialect {
    timestamp_unit: TimestampUnit::Seconds,
    range_end: RangeEnd::Inclusive,
    order: PageOrder::OldestFirst,
    bucket_stamp: BucketStamp::Open,
    page_limit: None,
};

const FREQUENCIES: [(Frequency, VendorFrequency); 4] = [
    (Frequency::M5, VendorFrequency::Seconds(300)),
    (Frequency::M15, VendorFrequency::Seconds(900)),
    (Frequency::M30, VendorFrequency::Seconds(1800)),
    (Frequency::D1, VendorFrequency::Seconds(86_400)),
];

static CALLS: [PublicCall; 7] = [
    PublicCall::get("returnTicker", command),
    PublicCall::get("return24Volume", command),
    PublicCall::get("returnOrderBook", command),
    PublicCall::get("returnTradeHistory", command),
    PublicCall::get("returnChartData", command),
    PublicCall::get("returnCurrencies", command),
    PublicCall::get("returnLoanOrders", command),
];

static PRIVATE_CALLS: [&str; 28] = [
    "returnBalances",
    "returnCompleteBalances",
    "returnDepositAddresses",
    "generateNewAddress",
    "returnDepositsWithdrawals",
    "returnOpenOrders",
    "returnTradeHistory",
    "returnOrderTrades",
    "buy",
    "sell",
    "cancelOrder",
    "moveOrder",
    "withdraw",
    "returnFeeInfo",
    "returnAvailableAccountBalances",
    "returnTradableBalances",
    "transferBalance",
    "returnMarginAccountSummary",
    "marginBuy",
    "marginSell",
    "getMarginPosition",
    "closeMarginPosition",
    "createLoanOffer",
    "cancelLoanOffer",
    "returnOpenLoanOffers",
    "returnActiveLoans",
    "returnLendingHistory",
    "toggleAutoRenew",
];

/// Every Poloniex public call is a GET on the base URL with the call name as `command`.
fn command(call: &PublicCall, params: &CallParams) -> Result<RestRequest, DataError> {
    Ok(RestRequest::new(call.method, "")
        .query("command", call.name)
        .queries(params.without(&["command"])))
}

/// [`Poloniex`] public API adapter.
///
/// Symbols are quote first, eg/ `BTC_ETH` is ETH priced in BTC.
#[derive(Debug, Copy, Clone, Default)]
pub struct Poloniex;

impl HttpParser for Poloniex {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Poloniex
    }

    fn parse_api_error(&self, status: StatusCode, payload: &Value) -> DataError {
        vendor_error(status, error_message(payload))
    }

    fn validate_payload(&self, payload: &Value) -> Result<(), DataError> {
        // Poloniex reports most failures with HTTP 200 and an "error" field
        match payload.get("error").and_then(Value::as_str) {
            Some(message) => Err(vendor_error(StatusCode::OK, message.to_owned())),
            None => Ok(()),
        }
    }
}

fn vendor_error(status: StatusCode, message: String) -> DataError {
    if message.starts_with(RATE_LIMIT_MESSAGE) {
        DataError::RateLimit {
            exchange: ExchangeId::Poloniex,
            retry_after: None,
        }
    } else {
        DataError::Http {
            exchange: ExchangeId::Poloniex,
            status: status.as_u16(),
            message,
        }
    }
}

impl ExchangeAdapter for Poloniex {
    fn base_url(&self) -> &'static str {
        BASE_URL_POLONIEX
    }

    fn rate_limit(&self) -> Duration {
        RATE_LIMIT_POLONIEX
    }

    fn dialect(&self) -> Option<Dialect> {
        Some(DIALECT)
    }

    fn calls(&self) -> &'static [PublicCall] {
        &CALLS
    }

    fn private_calls(&self) -> &'static [&'static str] {
        &PRIVATE_CALLS
    }

    /// `return_chart_data` -> `returnChartData`.
    fn translate_call_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if !name.contains('_') {
            return Cow::Borrowed(name);
        }

        let mut parts = name.split('_');
        let first = parts.next().unwrap_or_default();

        let camel = parts.fold(first.to_owned(), |mut camel, part| {
            let mut chars = part.chars();
            if let Some(head) = chars.next() {
                camel.extend(head.to_uppercase());
                camel.push_str(chars.as_str());
            }
            camel
        });

        Cow::Owned(camel)
    }

    fn symbol_convention(&self) -> SymbolConvention {
        SymbolConvention::QUOTE_BASE_UNDERSCORE
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
        let period = self.vendor_frequency(frequency)?;
        let (start, end) = DIALECT.page_bounds(start, end, frequency);

        let params = CallParams::new()
            .with("currencyPair", market)
            .with("start", DIALECT.encode(start))
            .with("end", DIALECT.encode(end))
            .with("period", period);

        self.build_request("return_chart_data", &params)
    }

    fn parse_candles(&self, payload: Value, frequency: Frequency) -> Result<Vec<Candle>, DataError> {
        let rows = decode::<Vec<PoloniexCandle>>(self.id(), payload)?;

        rows.into_iter()
            .filter(|row| !row.is_placeholder())
            .map(|row| row.into_candle(frequency))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| DataError::malformed(self.id(), reason))
    }

    fn order_book_request(&self, market: &str, depth: Option<usize>) -> Result<RestRequest, DataError> {
        let mut params = CallParams::new().with("currencyPair", market);
        if let Some(depth) = depth {
            params.insert("depth", depth);
        }
        self.build_request("return_order_book", &params)
    }

    fn parse_order_book(&self, payload: Value, depth: Option<usize>) -> Result<OrderBook, DataError> {
        let book = decode::<PoloniexOrderBook>(self.id(), payload)?;
        Ok(OrderBook::new(book.bids, book.asks, depth))
    }

    fn ticker_request(&self, _market: &str) -> Result<RestRequest, DataError> {
        self.build_request("return_ticker", &CallParams::new())
    }

    fn parse_ticker(&self, payload: Value, market: &str) -> Result<Ticker, DataError> {
        let mut tickers = decode::<HashMap<String, PoloniexTicker>>(self.id(), payload)?;
        tickers
            .remove(market)
            .map(|ticker| ticker.into_ticker(market))
            .ok_or_else(|| DataError::malformed(self.id(), format!("no ticker for {market}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use serde_json::json;

    fn time(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_translate_call_name() {
        assert_eq!(Poloniex.translate_call_name("return_chart_data"), "returnChartData");
        assert_eq!(Poloniex.translate_call_name("return_24_volume"), "return24Volume");
        assert_eq!(Poloniex.translate_call_name("returnTicker"), "returnTicker");
    }

    #[test]
    fn test_candle_request() {
        let request = Poloniex
            .candle_request("BTC_ETH", Frequency::M30, time(1_609_459_200), time(1_609_545_600))
            .unwrap();

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.path, "");
        assert_eq!(request.query_value("command"), Some("returnChartData"));
        assert_eq!(request.query_value("currencyPair"), Some("BTC_ETH"));
        assert_eq!(request.query_value("start"), Some("1609459200"));
        // inclusive end: the candle starting at `end` is excluded
        assert_eq!(request.query_value("end"), Some("1609543800"));
        assert_eq!(request.query_value("period"), Some("1800"));
    }

    #[test]
    fn test_candle_request_unsupported_frequency() {
        let actual = Poloniex.candle_request("BTC_ETH", Frequency::M1, time(0), time(60));
        assert!(matches!(actual, Err(DataError::InvalidArgument(_))));
    }

    #[test]
    fn test_private_call_unsupported() {
        let actual = Poloniex.build_request("return_balances", &CallParams::new());
        assert!(matches!(
            actual,
            Err(DataError::UnsupportedCall { exchange: ExchangeId::Poloniex, .. })
        ));
    }

    #[test]
    fn test_parse_candles_filters_placeholder() {
        let payload = json!([
            {"date": 0, "high": 0, "low": 0, "open": 0, "close": 0, "volume": 0, "quoteVolume": 0, "weightedAverage": 0}
        ]);
        assert!(Poloniex.parse_candles(payload, Frequency::M30).unwrap().is_empty());
    }

    #[test]
    fn test_validate_payload() {
        assert!(Poloniex.validate_payload(&json!([{"date": 1}])).is_ok());

        assert!(matches!(
            Poloniex.validate_payload(&json!({"error": "Invalid currency pair."})),
            Err(DataError::Http { status: 200, .. })
        ));

        assert!(matches!(
            Poloniex.validate_payload(
                &json!({"error": "Please do not make more than 6 API calls per second."})
            ),
            Err(DataError::RateLimit { exchange: ExchangeId::Poloniex, .. })
        ));
    }

    #[test]
    fn test_market_pair() {
        let pair = Poloniex.market_pair("BTC_ETH").unwrap();
        assert_eq!(pair.base, "ETH");
        assert_eq!(pair.quote, "BTC");
    }
}
