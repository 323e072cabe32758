use thiserror::Error;

/// All errors generated when resolving exchanges and market symbols.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum InstrumentError {
    #[error("unrecognised exchange: {0}")]
    UnknownExchange(String),

    #[error("invalid market symbol '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: &'static str },
}
