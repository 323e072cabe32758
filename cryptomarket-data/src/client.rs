use crate::{
    book::OrderBook,
    candle::Candle,
    error::DataError,
    exchange::{self, CallParams, ExchangeAdapter},
    http::{RestRequest, client::RestClient},
    rest::{CandleFetcher, Page, PageRequest},
    ticker::{Instrument, Ticker},
};
use cryptomarket_instrument::exchange::ExchangeId;
use governor::Quota;
use serde::Deserialize;
use serde_json::Value;
use std::{fmt, future::Future, sync::Arc, time::Duration};
use tracing::{Instrument as _, debug, info_span};

/// Direct (non-keyed) rate limiter held by a [`MarketClient`].
type ClientRateLimiter = governor::RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

/// [`MarketClient`] configuration. Unset fields fall back to the exchange defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Override of the exchange base URL (eg/ a mock server).
    pub base_url: Option<String>,
    /// Override of the exchange rate limit. Zero disables rate limiting.
    pub rate_limit: Option<Duration>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            rate_limit: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..self
        }
    }

    pub fn with_rate_limit(self, rate_limit: Duration) -> Self {
        Self {
            rate_limit: Some(rate_limit),
            ..self
        }
    }
}

/// REST client of a single exchange, fetching one page of data per call.
///
/// Cheap to clone: the [`ExchangeAdapter`], HTTP client and rate limiter are shared.
#[derive(Clone)]
pub struct MarketClient {
    adapter: Arc<dyn ExchangeAdapter>,
    rest: Arc<RestClient>,
    rate_limit: Duration,
    rate_limiter: Option<Arc<ClientRateLimiter>>,
}

impl fmt::Debug for MarketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketClient")
            .field("adapter", &self.adapter)
            .field("rest", &self.rest)
            .field("rate_limit", &self.rate_limit)
            .field(
                "rate_limiter",
                &self.rate_limiter.as_ref().map(|_| "ClientRateLimiter { .. }"),
            )
            .finish()
    }
}

impl MarketClient {
    /// Construct a [`MarketClient`] for an exchange with its default base URL & rate limit.
    pub fn new(exchange: ExchangeId) -> Result<Self, DataError> {
        Self::with_config(exchange, ClientConfig::default())
    }

    pub fn with_config(exchange: ExchangeId, config: ClientConfig) -> Result<Self, DataError> {
        Self::from_adapter(exchange::adapter(exchange), config)
    }

    /// Construct a [`MarketClient`] around any [`ExchangeAdapter`].
    pub fn from_adapter(
        adapter: Arc<dyn ExchangeAdapter>,
        config: ClientConfig,
    ) -> Result<Self, DataError> {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or_else(|| adapter.base_url());
        let rest = RestClient::new(base_url, config.timeout)?;

        let rate_limit = config.rate_limit.unwrap_or_else(|| adapter.rate_limit());
        let rate_limiter =
            Quota::with_period(rate_limit).map(|quota| Arc::new(governor::RateLimiter::direct(quota)));

        Ok(Self {
            adapter,
            rest: Arc::new(rest),
            rate_limit,
            rate_limiter,
        })
    }

    pub fn exchange(&self) -> ExchangeId {
        self.adapter.id()
    }

    pub fn adapter(&self) -> &dyn ExchangeAdapter {
        self.adapter.as_ref()
    }

    /// Wait until the rate limiter permits the next request.
    ///
    /// Call this before each REST API request to stay within the exchange rate limit.
    pub async fn wait_for_rate_limit(&self) {
        if let Some(rate_limiter) = &self.rate_limiter {
            debug!("waiting for rate limit permit");
            rate_limiter.until_ready().await;
        }
    }

    async fn execute(&self, request: &RestRequest) -> Result<Value, DataError> {
        self.wait_for_rate_limit().await;
        self.rest.execute(self.adapter.as_ref(), request).await
    }

    /// Call any entry of the exchange public call table, returning the raw JSON payload.
    ///
    /// Call names may be given underscored (eg/ `return_ticker`), they are translated to the
    /// vendor spelling.
    pub async fn request(&self, call: &str, params: &CallParams) -> Result<Value, DataError> {
        let request = self.adapter.build_request(call, params)?;
        self.execute(&request).await
    }

    /// Fetch an [`OrderBook`] snapshot, optionally truncated to `depth` levels per side.
    pub async fn order_book(&self, symbol: &str, depth: Option<usize>) -> Result<OrderBook, DataError> {
        let request = self.adapter.order_book_request(symbol, depth)?;
        let payload = self.execute(&request).await?;
        self.adapter.parse_order_book(payload, depth)
    }

    pub async fn ticker(&self, symbol: &str) -> Result<Ticker, DataError> {
        let request = self.adapter.ticker_request(symbol)?;
        let payload = self.execute(&request).await?;
        self.adapter.parse_ticker(payload, symbol)
    }

    pub async fn instruments(&self) -> Result<Vec<Instrument>, DataError> {
        let request = self.adapter.instruments_request()?;
        let payload = self.execute(&request).await?;
        self.adapter.parse_instruments(payload)
    }

    /// Re-quote candles in `quote_currency` if it is the market's native base.
    fn quote_candles(&self, symbol: &str, quote_currency: Option<&str>, candles: Vec<Candle>) -> Vec<Candle> {
        let Some(quote_currency) = quote_currency else {
            return candles;
        };

        match self.adapter.market_pair(symbol) {
            Some(pair) if pair.is_inverted_by(quote_currency) => {
                debug!(%pair, quote_currency, "inverting candle prices");
                candles.iter().map(Candle::inverted).collect()
            }
            Some(_) => candles,
            None => {
                debug!(symbol, "unknown symbol convention, candles left as quoted");
                candles
            }
        }
    }
}

impl CandleFetcher for MarketClient {
    fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    /// Fetch a single page of candles.
    ///
    /// Builds the vendor request via the [`ExchangeAdapter`], waits for the rate limiter,
    /// executes the request and normalises the rows oldest first.
    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page, DataError>> + Send {
        let this = self.clone();
        let span = info_span!(
            "fetch_page",
            exchange = %self.exchange(),
            market = %request.symbol,
            frequency = %request.frequency,
        );

        async move {
            let dialect = this
                .adapter
                .dialect()
                .ok_or_else(|| this.adapter.unsupported("candles"))?;
            let vendor_frequency = this.adapter.vendor_frequency(request.frequency)?;

            let rest_request = this.adapter.candle_request(
                &request.symbol,
                request.frequency,
                request.start,
                request.end,
            )?;

            let payload = this.execute(&rest_request).await?;
            let candles = dialect.normalise(this.adapter.parse_candles(payload, request.frequency)?);
            let candles =
                this.quote_candles(&request.symbol, request.quote_currency.as_deref(), candles);

            debug!(count = candles.len(), "fetched candle page");

            Ok(Page {
                candles,
                rate_limit: this.rate_limit,
                vendor_frequency: Some(vendor_frequency),
            })
        }
        .instrument(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults_to_adapter_rate_limit() {
        let client = MarketClient::new(ExchangeId::Gdax).unwrap();
        assert_eq!(client.rate_limit(), Duration::from_millis(1000));
        assert!(client.rate_limiter.is_some());
        assert_eq!(client.rest.base_url().as_str(), "https://api.exchange.coinbase.com/");
    }

    #[test]
    fn test_client_zero_rate_limit_disables_limiter() {
        let config = ClientConfig::default()
            .with_base_url("http://localhost:8080/public")
            .with_rate_limit(Duration::ZERO);
        let client = MarketClient::with_config(ExchangeId::Poloniex, config).unwrap();

        assert_eq!(client.rate_limit(), Duration::ZERO);
        assert!(client.rate_limiter.is_none());
        assert_eq!(client.rest.base_url().path(), "/public");
    }

    #[test]
    fn test_client_invalid_base_url() {
        let config = ClientConfig::default().with_base_url("not a url");
        assert!(matches!(
            MarketClient::with_config(ExchangeId::Poloniex, config),
            Err(DataError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_client_config_deserialize_defaults() {
        let config = serde_json::from_str::<ClientConfig>(r#"{"base_url": "http://localhost"}"#).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost"));
        assert_eq!(config.rate_limit, None);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_quote_candles_inverts_native_base() {
        let client = MarketClient::new(ExchangeId::Poloniex).unwrap();
        let candle = crate::test_utils::candle(0, 3600, 0.5);

        let inverted = client.quote_candles("BTC_ETH", Some("ETH"), vec![candle]);
        assert_eq!(inverted[0].close, 2.0);

        let untouched = client.quote_candles("BTC_ETH", Some("BTC"), vec![candle]);
        assert_eq!(untouched[0].close, 0.5);
    }
}
