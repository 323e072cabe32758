use crate::{
    error::DataError,
    frequency::Frequency,
    rest::{CandleFetcher, Page, RequestWindow},
    series::Series,
};
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt, stream};
use serde::Deserialize;
use tracing::{Instrument, debug, info, info_span};

/// Outcome of a back-fill that collected no candles at all.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRangePolicy {
    /// Fail with [`DataError::EmptyRange`].
    #[default]
    Error,
    /// Return an empty [`Series`].
    EmptySeries,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    pub empty_range: EmptyRangePolicy,
}

/// Back-fills a [`RequestWindow`] wider than one vendor page.
///
/// Pages are fetched strictly sequentially, sleeping [`CandleFetcher::rate_limit`] between
/// consecutive calls. Pagination stops on:
/// * an empty page.
/// * a stalled page, whose first candle does not start after the previous page's first candle
///   (the stalled page is discarded).
/// * a page making no forward progress past the cursor.
/// * the cursor reaching the last bucket of the window.
#[derive(Debug, Clone)]
pub struct Backfill<Fetcher> {
    fetcher: Fetcher,
    config: BackfillConfig,
}

/// Cursor of the page stream driven by [`Backfill::pages`].
struct PaginationState<'a, Fetcher> {
    fetcher: &'a Fetcher,
    window: RequestWindow,
    cursor: DateTime<Utc>,
    previous_first: Option<DateTime<Utc>>,
    calls: usize,
    done: bool,
}

impl<Fetcher> Backfill<Fetcher>
where
    Fetcher: CandleFetcher + Sync,
{
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_config(fetcher, BackfillConfig::default())
    }

    pub fn with_config(fetcher: Fetcher, config: BackfillConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Stream the accepted pages of a [`RequestWindow`] in call order.
    ///
    /// An error is yielded once and ends the stream.
    pub fn pages<'a>(
        &'a self,
        window: &RequestWindow,
    ) -> impl Stream<Item = Result<Page, DataError>> + Send + 'a {
        let state = PaginationState {
            fetcher: &self.fetcher,
            cursor: window.start,
            window: window.clone(),
            previous_first: None,
            calls: 0,
            done: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }

            if state.calls > 0 {
                tokio::time::sleep(state.fetcher.rate_limit()).await;
            }

            let single_page = state.calls == 0 && state.window.is_single_page();
            state.calls += 1;

            debug!(
                market = %state.window.symbol,
                cursor = %state.cursor,
                call = state.calls,
                "fetching candle page"
            );

            let page = match state.fetcher.fetch_page(state.window.page(state.cursor)).await {
                Ok(page) => page,
                Err(error) => {
                    state.done = true;
                    return Some((Err(error), state));
                }
            };

            if single_page {
                state.done = true;
                return Some((Ok(page), state));
            }

            let (Some(first_start), Some(last_end)) = (page.first_start(), page.last_end()) else {
                debug!("empty page, pagination complete");
                return None;
            };

            if state
                .previous_first
                .is_some_and(|previous_first| first_start <= previous_first)
            {
                debug!(%first_start, "stalled page discarded, pagination complete");
                return None;
            }
            state.previous_first = Some(first_start);

            if last_end > state.cursor {
                state.cursor = last_end;
            } else {
                debug!(%last_end, "no forward progress, pagination complete");
                state.done = true;
            }

            if state.cursor >= state.window.end - state.window.frequency.duration() {
                state.done = true;
            }

            debug!(
                page_size = page.candles.len(),
                cursor = %state.cursor,
                "advancing candle pagination"
            );

            Some((Ok(page), state))
        })
    }

    /// Back-fill a [`RequestWindow`] into a deduplicated, chronologically ordered [`Series`].
    ///
    /// Candles are not trimmed against the window end.
    pub async fn candles(&self, window: &RequestWindow) -> Result<Series, DataError> {
        window.validate()?;

        let span = info_span!(
            "backfill",
            market = %window.symbol,
            frequency = %window.frequency,
            start = %window.start,
            end = %window.end,
        );

        async move {
            info!("starting candle back-fill");

            let pages = self
                .pages(window)
                .map_ok(|page| page.candles)
                .try_collect::<Vec<_>>()
                .await?;

            let calls = pages.len();
            let series = Series::from_pages(pages);

            if series.is_empty() && self.config.empty_range == EmptyRangePolicy::Error {
                return Err(DataError::EmptyRange {
                    market: window.symbol.clone(),
                    start: window.start,
                    end: window.end,
                });
            }

            info!(pages = calls, candles = series.len(), "candle back-fill complete");
            Ok(series)
        }
        .instrument(span)
        .await
    }

    /// Back-fill the same window for several markets, one after the other.
    pub async fn candles_for<Symbol>(
        &self,
        symbols: &[Symbol],
        frequency: Frequency,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        quote_currency: Option<&str>,
    ) -> Result<Vec<(String, Series)>, DataError>
    where
        Symbol: AsRef<str>,
    {
        let mut series = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let mut window = RequestWindow::new(symbol.as_ref(), frequency, start, end)?;
            if let Some(quote_currency) = quote_currency {
                window = window.with_quote_currency(quote_currency);
            }

            series.push((window.symbol.clone(), self.candles(&window).await?));
        }

        Ok(series)
    }
}
