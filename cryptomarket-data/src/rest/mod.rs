use crate::{
    candle::Candle, error::DataError, exchange::VendorFrequency, frequency::Frequency,
};
use chrono::{DateTime, Utc};
use std::{future::Future, time::Duration};

/// Candle back-fill engine, paginating a [`RequestWindow`] over as many
/// [`CandleFetcher::fetch_page`] calls as it needs.
pub mod backfill;

/// Latest `count` complete candles of one or several markets.
pub mod latest;

/// Exponential backoff retry of whole requests.
pub mod retry;

/// Candles of one market over the half-open window `[start, end)`.
#[derive(Clone, PartialEq, Debug)]
pub struct RequestWindow {
    /// Exchange specific market symbol (eg/ "BTC_ETH").
    pub symbol: String,
    pub frequency: Frequency,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Quote the prices in this currency, inverting them if it is the market's native base.
    pub quote_currency: Option<String>,
}

impl RequestWindow {
    /// Construct a [`RequestWindow`], rejecting `start >= end`.
    pub fn new(
        symbol: impl Into<String>,
        frequency: Frequency,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, DataError> {
        let window = Self {
            symbol: symbol.into(),
            frequency,
            start,
            end,
            quote_currency: None,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn with_quote_currency(self, quote_currency: impl Into<String>) -> Self {
        Self {
            quote_currency: Some(quote_currency.into()),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.start >= self.end {
            return Err(DataError::InvalidArgument(format!(
                "window start {} must precede end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Whether the window is narrower than two buckets, so one page covers it.
    pub fn is_single_page(&self) -> bool {
        self.start >= self.end - self.frequency.duration()
    }

    /// [`PageRequest`] for the remainder of the window from `start`.
    pub fn page(&self, start: DateTime<Utc>) -> PageRequest {
        PageRequest {
            symbol: self.symbol.clone(),
            frequency: self.frequency,
            start,
            end: self.end,
            quote_currency: self.quote_currency.clone(),
        }
    }
}

/// Parameters of a single candle page request.
#[derive(Clone, PartialEq, Debug)]
pub struct PageRequest {
    pub symbol: String,
    pub frequency: Frequency,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub quote_currency: Option<String>,
}

/// Candles returned by one [`CandleFetcher::fetch_page`] call, oldest first.
#[derive(Clone, PartialEq, Debug)]
pub struct Page {
    pub candles: Vec<Candle>,
    /// Interval the exchange expects between two consecutive calls.
    pub rate_limit: Duration,
    pub vendor_frequency: Option<VendorFrequency>,
}

impl Page {
    pub fn first_start(&self) -> Option<DateTime<Utc>> {
        self.candles.first().map(|candle| candle.start_time)
    }

    pub fn last_end(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|candle| candle.end_time)
    }
}

/// Fetches one page of candles per call.
pub trait CandleFetcher {
    /// Interval to wait between two consecutive [`fetch_page`](Self::fetch_page) calls.
    fn rate_limit(&self) -> Duration;

    /// Fetch a single page of candles, issuing exactly one network call.
    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page, DataError>> + Send;
}

impl<Fetcher> CandleFetcher for &Fetcher
where
    Fetcher: CandleFetcher + ?Sized,
{
    fn rate_limit(&self) -> Duration {
        (**self).rate_limit()
    }

    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page, DataError>> + Send {
        (**self).fetch_page(request)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::test_utils::candle;
    use std::sync::{Arc, Mutex};

    /// Deterministic [`CandleFetcher`] replaying scripted pages and recording every request.
    #[derive(Debug, Clone, Default)]
    pub struct MockFetcher {
        pub pages: Arc<Mutex<Vec<Result<Vec<Candle>, DataError>>>>,
        pub requests: Arc<Mutex<Vec<PageRequest>>>,
        pub rate_limit: Duration,
    }

    impl MockFetcher {
        pub fn new(pages: Vec<Result<Vec<Candle>, DataError>>) -> Self {
            Self {
                pages: Arc::new(Mutex::new(pages.into_iter().rev().collect())),
                requests: Arc::default(),
                rate_limit: Duration::from_secs(1),
            }
        }

        pub fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl CandleFetcher for MockFetcher {
        fn rate_limit(&self) -> Duration {
            self.rate_limit
        }

        fn fetch_page(
            &self,
            request: PageRequest,
        ) -> impl Future<Output = Result<Page, DataError>> + Send {
            self.requests.lock().unwrap().push(request);
            let next = self.pages.lock().unwrap().pop().unwrap_or(Ok(Vec::new()));
            let rate_limit = self.rate_limit;
            async move {
                next.map(|candles| Page {
                    candles,
                    rate_limit,
                    vendor_frequency: None,
                })
            }
        }
    }

    /// Hourly candles starting every hour in `[start_secs, end_secs)`.
    pub fn hourly(start_secs: i64, end_secs: i64) -> Vec<Candle> {
        (start_secs..end_secs)
            .step_by(3600)
            .map(|start| candle(start, 3600, 1.0))
            .collect()
    }
}
