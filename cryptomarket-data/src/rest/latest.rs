use crate::{
    error::DataError,
    frequency::Frequency,
    rest::{CandleFetcher, backfill::Backfill},
    series::{JoinedSeries, Series},
};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

/// Window covering the latest `count` complete buckets before `end` (default now).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LatestWindow {
    pub frequency: Frequency,
    pub count: u32,
    /// `end` floored to the frequency, epoch aligned.
    pub closest_end: DateTime<Utc>,
    /// `closest_end - frequency * count`, minus one second so the first bucket is included by
    /// vendors that filter on strictly later timestamps.
    pub start: DateTime<Utc>,
}

impl LatestWindow {
    pub fn new(
        frequency: Frequency,
        count: u32,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, DataError> {
        if count == 0 {
            return Err(DataError::InvalidArgument(
                "latest candle count must be positive".to_owned(),
            ));
        }

        let closest_end = floor_to(end.unwrap_or_else(Utc::now), frequency);
        let start = frequency
            .seconds()
            .checked_mul(i64::from(count))
            .and_then(|seconds| seconds.checked_add(1))
            .and_then(TimeDelta::try_seconds)
            .and_then(|span| closest_end.checked_sub_signed(span))
            .ok_or_else(|| {
                DataError::InvalidArgument(format!(
                    "{count} {frequency} candles before {closest_end} is out of range"
                ))
            })?;

        Ok(Self {
            frequency,
            count,
            closest_end,
            start,
        })
    }
}

/// Floor an instant to a multiple of the frequency since the unix epoch.
pub fn floor_to(instant: DateTime<Utc>, frequency: Frequency) -> DateTime<Utc> {
    let seconds = instant.timestamp();
    let floored = seconds - seconds.rem_euclid(frequency.seconds());
    DateTime::<Utc>::from_timestamp(floored, 0).unwrap_or(instant)
}

/// Result of [`latest_candles`]: a plain [`Series`] for a single market, else an outer join.
#[derive(Clone, PartialEq, Debug)]
pub enum LatestCandles {
    Single(Series),
    Joined(JoinedSeries),
}

impl LatestCandles {
    pub fn len(&self) -> usize {
        match self {
            LatestCandles::Single(series) => series.len(),
            LatestCandles::Joined(joined) => joined.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetch the latest `count` complete candles of each market.
///
/// Every market is back-filled over the same [`LatestWindow`], keeping only candles fully
/// closed by its `closest_end`. Prices are expressed in `quote_currency` when provided.
pub async fn latest_candles<Fetcher, Symbol>(
    fetcher: &Fetcher,
    symbols: &[Symbol],
    frequency: Frequency,
    count: u32,
    end: Option<DateTime<Utc>>,
    quote_currency: Option<&str>,
) -> Result<LatestCandles, DataError>
where
    Fetcher: CandleFetcher + Sync,
    Symbol: AsRef<str>,
{
    latest_candles_with(
        &Backfill::new(fetcher),
        symbols,
        frequency,
        count,
        end,
        quote_currency,
    )
    .await
}

/// [`latest_candles`] through a configured [`Backfill`].
pub async fn latest_candles_with<Fetcher, Symbol>(
    backfill: &Backfill<Fetcher>,
    symbols: &[Symbol],
    frequency: Frequency,
    count: u32,
    end: Option<DateTime<Utc>>,
    quote_currency: Option<&str>,
) -> Result<LatestCandles, DataError>
where
    Fetcher: CandleFetcher + Sync,
    Symbol: AsRef<str>,
{
    if symbols.is_empty() {
        return Err(DataError::InvalidArgument(
            "latest candles need at least one symbol".to_owned(),
        ));
    }

    let window = LatestWindow::new(frequency, count, end)?;

    debug!(
        start = %window.start,
        closest_end = %window.closest_end,
        markets = symbols.len(),
        "fetching latest candles"
    );

    let mut series = backfill
        .candles_for(
            symbols,
            frequency,
            window.start,
            window.closest_end,
            quote_currency,
        )
        .await?
        .into_iter()
        .map(|(market, series)| (market, series.complete_by(window.closest_end)))
        .collect::<Vec<_>>();

    match series.len() {
        1 => Ok(LatestCandles::Single(series.remove(0).1)),
        _ => Ok(LatestCandles::Joined(JoinedSeries::outer_join(series))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::mock::{MockFetcher, hourly};

    fn time(input: &str) -> DateTime<Utc> {
        input.parse().unwrap()
    }

    #[test]
    fn test_latest_window_alignment() {
        let window = LatestWindow::new(Frequency::H1, 3, Some(time("2021-01-01T10:17:00Z"))).unwrap();

        assert_eq!(window.closest_end, time("2021-01-01T10:00:00Z"));
        assert_eq!(window.start, time("2021-01-01T06:59:59Z"));
    }

    #[test]
    fn test_latest_window_zero_count() {
        assert!(matches!(
            LatestWindow::new(Frequency::H1, 0, None),
            Err(DataError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_latest_window_out_of_range() {
        struct TestCase {
            frequency: Frequency,
            count: u32,
        }

        let tests = vec![
            TestCase {
                // TC0: span beyond TimeDelta range
                frequency: Frequency::Month1,
                count: u32::MAX,
            },
            TestCase {
                // TC1: span within TimeDelta range, start before DateTime range
                frequency: Frequency::H1,
                count: 3_000_000_000,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = LatestWindow::new(
                test.frequency,
                test.count,
                Some(time("2021-01-01T10:17:00Z")),
            );
            assert!(
                matches!(actual, Err(DataError::InvalidArgument(_))),
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_floor_to() {
        struct TestCase {
            input: &'static str,
            frequency: Frequency,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: already aligned
                input: "2021-01-01T10:00:00Z",
                frequency: Frequency::H1,
                expected: "2021-01-01T10:00:00Z",
            },
            TestCase {
                // TC1
                input: "2021-01-01T10:29:59Z",
                frequency: Frequency::M30,
                expected: "2021-01-01T10:00:00Z",
            },
            TestCase {
                // TC2: daily buckets align to midnight UTC
                input: "2021-01-01T23:59:59Z",
                frequency: Frequency::D1,
                expected: "2021-01-01T00:00:00Z",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = floor_to(time(test.input), test.frequency);
            assert_eq!(actual, time(test.expected), "TC{index} failed");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_candles_single_market() {
        let start = time("2021-01-01T07:00:00Z").timestamp();
        // Vendor includes the still open 10:00 bucket
        let fetcher = MockFetcher::new(vec![Ok(hourly(start, start + 4 * 3600))]);

        let latest = latest_candles(
            &fetcher,
            &["BTC_ETH"],
            Frequency::H1,
            3,
            Some(time("2021-01-01T10:17:00Z")),
            None,
        )
        .await
        .unwrap();

        let series = match latest {
            LatestCandles::Single(series) => series,
            other => panic!("expected a single series, got {other:?}"),
        };

        let starts = series.iter().map(|candle| candle.start_time).collect::<Vec<_>>();
        assert_eq!(
            starts,
            vec![
                time("2021-01-01T07:00:00Z"),
                time("2021-01-01T08:00:00Z"),
                time("2021-01-01T09:00:00Z"),
            ]
        );

        let requests = fetcher.requests();
        assert_eq!(requests[0].start, time("2021-01-01T06:59:59Z"));
        assert_eq!(requests[0].end, time("2021-01-01T10:00:00Z"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_candles_joined_markets() {
        let start = time("2021-01-01T07:00:00Z").timestamp();
        let fetcher = MockFetcher::new(vec![
            Ok(hourly(start, start + 3 * 3600)),
            Ok(hourly(start + 3600, start + 3 * 3600)),
        ]);

        let latest = latest_candles(
            &fetcher,
            &["BTC_ETH", "BTC_LTC"],
            Frequency::H1,
            3,
            Some(time("2021-01-01T10:00:00Z")),
            None,
        )
        .await
        .unwrap();

        let joined = match latest {
            LatestCandles::Joined(joined) => joined,
            other => panic!("expected a joined series, got {other:?}"),
        };

        assert_eq!(joined.len(), 3);
        let ltc = joined.column("BTC_LTC").unwrap();
        assert!(ltc[0].is_none());
        assert!(ltc[1].is_some());
    }

    #[tokio::test]
    async fn test_latest_candles_no_symbols() {
        let fetcher = MockFetcher::default();
        let actual = latest_candles::<_, &str>(&fetcher, &[], Frequency::H1, 3, None, None).await;

        assert!(matches!(actual, Err(DataError::InvalidArgument(_))));
        assert!(fetcher.requests().is_empty());
    }
}
