#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cast_possible_truncation,
    clippy::unused_self,
    clippy::match_wildcard_for_single_variants,
    rust_2018_idioms,
    missing_debug_implementations
)]

//! # Cryptomarket-Data
//! A uniform REST client over several cryptocurrency exchanges. Heterogeneous vendor
//! responses are normalised into a common set of typed shapes:
//! * [`Candle`](candle::Candle) series, back-filled across as many paginated requests as the
//!   requested window needs.
//! * [`OrderBook`](book::OrderBook) snapshots.
//! * [`Ticker`](ticker::Ticker)s and CoinMarketCap / CryptoCompare [`Instrument`](ticker::Instrument) listings.
//!
//! ## Getting Started
//! ```rust,no_run
//! use cryptomarket_data::{MarketData, frequency::Frequency};
//! use cryptomarket_instrument::exchange::ExchangeId;
//!
//! #[tokio::main]
//! async fn main() {
//!     let market_data = MarketData::new();
//!
//!     let latest = market_data
//!         .latest_candles(ExchangeId::Poloniex, &["BTC_ETH"], Frequency::M30, 48, None, None)
//!         .await
//!         .unwrap();
//!
//!     println!("{latest:?}");
//! }
//! ```

/// All [`Error`](std::error::Error)s generated in Cryptomarket-Data.
pub mod error;

/// Normalised OHLCV [`Candle`](candle::Candle) model.
pub mod candle;

/// Supported candle [`Frequency`](frequency::Frequency) table.
pub mod frequency;

/// Deduplicated, chronologically ordered [`Series`](series::Series) of candles and the
/// multi-market [`JoinedSeries`](series::JoinedSeries).
pub mod series;

/// Normalised [`OrderBook`](book::OrderBook) snapshot.
pub mod book;

/// Normalised [`Ticker`](ticker::Ticker) and [`Instrument`](ticker::Instrument) listing.
pub mod ticker;

/// Serde helpers shared by the exchange DTOs.
pub mod de;

/// HTTP plumbing: [`RestRequest`](http::RestRequest), the vendor
/// [`HttpParser`](http::HttpParser) seam and the [`RestClient`](http::client::RestClient).
pub mod http;

/// Per-exchange [`ExchangeAdapter`](exchange::ExchangeAdapter) implementations.
pub mod exchange;

/// Single-page [`MarketClient`](client::MarketClient) bound to one exchange.
pub mod client;

/// Candle fetching: the [`CandleFetcher`](rest::CandleFetcher) seam, the back-fill engine and the
/// latest-window helper.
pub mod rest;

/// High level [`MarketData`](market::MarketData) facade keyed by [`ExchangeId`].
pub mod market;

pub use market::MarketData;
