use chrono::{DateTime, Utc};
use cryptomarket_instrument::{error::InstrumentError, exchange::ExchangeId};
use std::time::Duration;
use thiserror::Error;

/// All errors generated in `cryptomarket-data`.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{exchange} does not support call: {call}")]
    UnsupportedCall { exchange: ExchangeId, call: String },

    #[error("{exchange} HTTP {status}: {message}")]
    Http {
        exchange: ExchangeId,
        status: u16,
        message: String,
    },

    #[error("{exchange} rate limit exceeded (retry after: {retry_after:?})")]
    RateLimit {
        exchange: ExchangeId,
        retry_after: Option<Duration>,
    },

    #[error("no candles returned for {market} in [{start}, {end})")]
    EmptyRange {
        market: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("{exchange} malformed response: {reason}")]
    MalformedResponse { exchange: ExchangeId, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl DataError {
    /// Determine if an error is transient and the whole request may be attempted again.
    ///
    /// Server side [`DataError::Http`] failures are retryable, client side (4xx) failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::RateLimit { .. } | DataError::Transport(_) => true,
            DataError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn malformed(exchange: ExchangeId, reason: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            exchange,
            reason: reason.to_string(),
        }
    }
}

impl From<InstrumentError> for DataError {
    fn from(error: InstrumentError) -> Self {
        Self::InvalidArgument(error.to_string())
    }
}
