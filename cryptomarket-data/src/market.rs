use crate::{
    book::OrderBook,
    client::{ClientConfig, MarketClient},
    error::DataError,
    frequency::Frequency,
    rest::{
        RequestWindow,
        backfill::{Backfill, BackfillConfig},
        latest::{LatestCandles, latest_candles_with},
    },
    series::Series,
    ticker::{Instrument, Ticker},
};
use chrono::{DateTime, Utc};
use cryptomarket_instrument::exchange::ExchangeId;
use std::collections::HashMap;

/// Entry point fetching normalised market data from any supported source.
///
/// Every call builds a fresh [`MarketClient`] for its source, so no state is shared between
/// calls. Use [`MarketData::client`] to keep one (and its rate limiter) across calls.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    configs: HashMap<ExchangeId, ClientConfig>,
    backfill: BackfillConfig,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the [`ClientConfig`] of one source (eg/ point it at a mock server).
    pub fn with_client_config(mut self, source: ExchangeId, config: ClientConfig) -> Self {
        self.configs.insert(source, config);
        self
    }

    pub fn with_backfill_config(self, backfill: BackfillConfig) -> Self {
        Self { backfill, ..self }
    }

    pub fn client(&self, source: ExchangeId) -> Result<MarketClient, DataError> {
        let config = self.configs.get(&source).cloned().unwrap_or_default();
        MarketClient::with_config(source, config)
    }

    fn backfill_of(&self, source: ExchangeId) -> Result<Backfill<MarketClient>, DataError> {
        Ok(Backfill::with_config(self.client(source)?, self.backfill))
    }

    /// Back-fill the candles of `symbol` in `[start, end)`.
    pub async fn candles(
        &self,
        source: ExchangeId,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        frequency: Frequency,
    ) -> Result<Series, DataError> {
        let window = RequestWindow::new(symbol, frequency, start, end)?;
        self.candles_in(source, &window).await
    }

    /// Back-fill an explicit [`RequestWindow`], eg/ one carrying a quote currency.
    pub async fn candles_in(&self, source: ExchangeId, window: &RequestWindow) -> Result<Series, DataError> {
        self.backfill_of(source)?.candles(window).await
    }

    /// Back-fill the candles of `symbol` in `[start, end)` at a raw vendor `period`, eg/
    /// Poloniex `"1800"` or Bitfinex `"1h"`.
    pub async fn historical_ticker(
        &self,
        source: ExchangeId,
        symbol: &str,
        period: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Series, DataError> {
        let client = self.client(source)?;
        let frequency = client.adapter().frequency_of_period(period)?;
        let window = RequestWindow::new(symbol, frequency, start, end)?;
        Backfill::with_config(client, self.backfill).candles(&window).await
    }

    /// Latest `count` complete candles of each symbol, optionally priced in `quote_currency`,
    /// see [`latest_candles`](crate::rest::latest::latest_candles).
    pub async fn latest_candles<Symbol>(
        &self,
        source: ExchangeId,
        symbols: &[Symbol],
        frequency: Frequency,
        count: u32,
        end: Option<DateTime<Utc>>,
        quote_currency: Option<&str>,
    ) -> Result<LatestCandles, DataError>
    where
        Symbol: AsRef<str>,
    {
        latest_candles_with(
            &self.backfill_of(source)?,
            symbols,
            frequency,
            count,
            end,
            quote_currency,
        )
        .await
    }

    pub async fn order_book(
        &self,
        source: ExchangeId,
        symbol: &str,
        depth: Option<usize>,
    ) -> Result<OrderBook, DataError> {
        self.client(source)?.order_book(symbol, depth).await
    }

    pub async fn ticker(&self, source: ExchangeId, symbol: &str) -> Result<Ticker, DataError> {
        self.client(source)?.ticker(symbol).await
    }

    pub async fn instruments(&self, source: ExchangeId) -> Result<Vec<Instrument>, DataError> {
        self.client(source)?.instruments().await
    }
}
