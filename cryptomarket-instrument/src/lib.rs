#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cast_possible_truncation,
    unused_crate_dependencies,
    clippy::unused_self,
    clippy::match_wildcard_for_single_variants,
    rust_2018_idioms,
    missing_debug_implementations
)]

//! # Cryptomarket-Instrument
//! Identifiers for the exchange REST sources supported by `cryptomarket-data`, and the
//! per-exchange conventions used to spell a market symbol (`BTC_ETH`, `tBTCUSD`, `BTC-USD`).

/// [`ExchangeId`](exchange::ExchangeId) enumerating every supported REST source.
pub mod exchange;

/// [`MarketPair`](market::MarketPair) and the [`SymbolConvention`](market::SymbolConvention)s
/// used to parse vendor symbols into base and quote assets.
pub mod market;

/// Errors generated when resolving exchanges and symbols.
pub mod error;

pub use error::InstrumentError;
pub use exchange::ExchangeId;
pub use market::{MarketPair, PairOrder, SymbolConvention};
