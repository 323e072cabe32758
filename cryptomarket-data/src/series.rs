use crate::candle::Candle;
use chrono::{DateTime, Utc};
use itertools::{EitherOrBoth, Itertools};
use serde::{Deserialize, Serialize};

/// Deduplicated sequence of [`Candle`]s with strictly increasing `start_time`.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct Series {
    candles: Vec<Candle>,
}

impl Series {
    /// Merge pages of candles, in call order, into a [`Series`].
    ///
    /// Candles are stably sorted by `start_time`, so when several pages contain the same
    /// `start_time` the candle from the earliest page is kept.
    pub fn from_pages<Pages>(pages: Pages) -> Self
    where
        Pages: IntoIterator<Item = Vec<Candle>>,
    {
        let mut candles = pages.into_iter().flatten().collect::<Vec<_>>();
        candles.sort_by_key(|candle| candle.start_time);
        candles.dedup_by_key(|candle| candle.start_time);
        Self { candles }
    }

    /// Keep only candles fully closed by `end`, ie/ `end_time <= end`.
    pub fn complete_by(mut self, end: DateTime<Utc>) -> Self {
        self.candles.retain(|candle| candle.end_time <= end);
        self
    }

    /// Keep only candles starting before `end`.
    pub fn trim_to(mut self, end: DateTime<Utc>) -> Self {
        self.candles.retain(|candle| candle.start_time < end);
        self
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn into_vec(self) -> Vec<Candle> {
        self.candles
    }
}

impl IntoIterator for Series {
    type Item = Candle;
    type IntoIter = std::vec::IntoIter<Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.into_iter()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

/// Several markets' [`Series`] outer joined on a shared `(start_time, end_time)` index.
///
/// Each column holds one entry per index key, `None` where that market has no candle.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct JoinedSeries {
    pub index: Vec<(DateTime<Utc>, DateTime<Utc>)>,
    pub columns: Vec<(String, Vec<Option<Candle>>)>,
}

impl JoinedSeries {
    /// Outer join every `(market, Series)`, preserving the provided market order.
    pub fn outer_join(series: Vec<(String, Series)>) -> Self {
        let index = series
            .iter()
            .flat_map(|(_, series)| series.iter())
            .map(|candle| (candle.start_time, candle.end_time))
            .sorted()
            .dedup()
            .collect::<Vec<_>>();

        let columns = series
            .into_iter()
            .map(|(market, series)| {
                let column = index
                    .iter()
                    .merge_join_by(series, |(start_time, _), candle| {
                        start_time.cmp(&candle.start_time)
                    })
                    .filter_map(|joined| match joined {
                        EitherOrBoth::Left(_) => Some(None),
                        EitherOrBoth::Both(_, candle) => Some(Some(candle)),
                        EitherOrBoth::Right(_) => None,
                    })
                    .collect();

                (market, column)
            })
            .collect();

        Self { index, columns }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Column of the provided market, if it was part of the join.
    pub fn column(&self, market: &str) -> Option<&[Option<Candle>]> {
        self.columns
            .iter()
            .find(|(name, _)| name == market)
            .map(|(_, column)| column.as_slice())
    }
}
