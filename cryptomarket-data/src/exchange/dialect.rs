use crate::{candle::Candle, frequency::Frequency};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// How a vendor encodes instants in request parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TimestampUnit {
    Seconds,
    Milliseconds,
    Iso8601,
}

/// Whether the vendor's range end parameter is inclusive of a candle starting exactly at it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RangeEnd {
    Inclusive,
    Exclusive,
}

/// Order of the rows in a vendor candle page.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PageOrder {
    OldestFirst,
    NewestFirst,
}

/// Which edge of a candle the vendor timestamp denotes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BucketStamp {
    /// Timestamp is the candle start (most vendors).
    Open,
    /// Timestamp is the candle close (BitMEX `trade/bucketed`).
    Close,
}

/// Capabilities and conventions of a vendor's candle endpoint.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Dialect {
    pub timestamp_unit: TimestampUnit,
    pub range_end: RangeEnd,
    pub order: PageOrder,
    pub bucket_stamp: BucketStamp,
    /// Maximum number of rows in one page, if the vendor enforces one.
    pub page_limit: Option<u32>,
}

impl Dialect {
    /// Translate the half-open `[start, end)` window into the vendor's `(start, end)` request
    /// parameters, as instants in the vendor's timestamp convention.
    ///
    /// Page limited vendors get `end` clamped to `start + page_limit * frequency`, so every
    /// page request is satisfiable and the engine advances page by page.
    pub fn page_bounds(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        frequency: Frequency,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let step = frequency.duration();

        let end = match self.page_limit {
            Some(limit) => end.min(start + step * i32::try_from(limit).unwrap_or(i32::MAX)),
            None => end,
        };

        let offset = match self.bucket_stamp {
            BucketStamp::Open => TimeDelta::zero(),
            BucketStamp::Close => step,
        };

        let end_adjust = match self.range_end {
            RangeEnd::Inclusive => step,
            RangeEnd::Exclusive => TimeDelta::zero(),
        };

        let start = start + offset;
        (start, (end + offset - end_adjust).max(start))
    }

    /// Render an instant in the vendor's [`TimestampUnit`].
    pub fn encode(&self, instant: DateTime<Utc>) -> String {
        match self.timestamp_unit {
            TimestampUnit::Seconds => instant.timestamp().to_string(),
            TimestampUnit::Milliseconds => instant.timestamp_millis().to_string(),
            TimestampUnit::Iso8601 => instant.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Re-order a parsed page oldest-first.
    pub fn normalise(&self, mut candles: Vec<Candle>) -> Vec<Candle> {
        if self.order == PageOrder::NewestFirst {
            candles.reverse();
        }
        candles
    }
}
