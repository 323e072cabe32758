use crate::error::InstrumentError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Order in which an exchange writes the two assets of a market symbol.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum PairOrder {
    /// eg/ GDAX `ETH-BTC`: ETH priced in BTC.
    BaseQuote,
    /// eg/ Poloniex `BTC_ETH`: ETH priced in BTC.
    QuoteBase,
}

/// How an exchange spells a market symbol.
///
/// A symbol is parsed by stripping the optional `prefix`, then splitting on the `separator`
/// when present. Symbols without a separator are only understood when they are exactly six
/// characters long (eg/ `XBTUSD`), which is how every supported exchange spells a pair of
/// three-letter assets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SymbolConvention {
    pub prefix: Option<&'static str>,
    pub separator: Option<char>,
    pub order: PairOrder,
}

impl SymbolConvention {
    /// `ETH_BTC`: base first, underscore separated.
    pub const BASE_QUOTE_UNDERSCORE: Self = Self::new(None, Some('_'), PairOrder::BaseQuote);

    /// `BTC_ETH`: quote first, underscore separated (Poloniex).
    pub const QUOTE_BASE_UNDERSCORE: Self = Self::new(None, Some('_'), PairOrder::QuoteBase);

    /// `ETH-BTC`: base first, dash separated (GDAX).
    pub const BASE_QUOTE_DASH: Self = Self::new(None, Some('-'), PairOrder::BaseQuote);

    /// `BTC-ETH`: quote first, dash separated (Bittrex).
    pub const QUOTE_BASE_DASH: Self = Self::new(None, Some('-'), PairOrder::QuoteBase);

    /// `tETHBTC` or `tDOGE:USD` (Bitfinex).
    pub const BITFINEX: Self = Self::new(Some("t"), Some(':'), PairOrder::BaseQuote);

    /// `XBTUSD` (BitMEX).
    pub const CONCATENATED: Self = Self::new(None, None, PairOrder::BaseQuote);

    pub const fn new(prefix: Option<&'static str>, separator: Option<char>, order: PairOrder) -> Self {
        Self {
            prefix,
            separator,
            order,
        }
    }
}

/// Base and quote asset of a market, independent of how an exchange spells it.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct MarketPair {
    pub base: SmolStr,
    pub quote: SmolStr,
}

impl MarketPair {
    pub fn new<S>(base: S, quote: S) -> Self
    where
        S: Into<SmolStr>,
    {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Parse an exchange symbol using the provided [`SymbolConvention`].
    pub fn parse(symbol: &str, convention: SymbolConvention) -> Result<Self, InstrumentError> {
        let invalid = |reason| InstrumentError::InvalidSymbol {
            symbol: symbol.to_owned(),
            reason,
        };

        let stripped = match convention.prefix {
            Some(prefix) => symbol.strip_prefix(prefix).unwrap_or(symbol),
            None => symbol,
        };

        let (first, second) = match convention.separator.and_then(|sep| stripped.split_once(sep)) {
            Some(parts) => parts,
            None if stripped.len() == 6 && stripped.is_ascii() => stripped.split_at(3),
            None => return Err(invalid("cannot split symbol into two assets")),
        };

        if first.is_empty() || second.is_empty() {
            return Err(invalid("empty asset"));
        }

        Ok(match convention.order {
            PairOrder::BaseQuote => Self::new(first, second),
            PairOrder::QuoteBase => Self::new(second, first),
        })
    }

    /// Spell this pair using the provided [`SymbolConvention`].
    pub fn to_symbol(&self, convention: SymbolConvention) -> String {
        let (first, second) = match convention.order {
            PairOrder::BaseQuote => (&self.base, &self.quote),
            PairOrder::QuoteBase => (&self.quote, &self.base),
        };

        let prefix = convention.prefix.unwrap_or_default();
        match convention.separator {
            Some(separator) if first.len() != 3 || second.len() != 3 || prefix.is_empty() => {
                format!("{prefix}{first}{separator}{second}")
            }
            _ => format!("{prefix}{first}{second}"),
        }
    }

    /// True if pricing this market in `quote_currency` means inverting the native prices, ie/
    /// the requested quote is actually this market's base asset.
    pub fn is_inverted_by(&self, quote_currency: &str) -> bool {
        self.base.eq_ignore_ascii_case(quote_currency)
            && !self.quote.eq_ignore_ascii_case(quote_currency)
    }

    /// The same market priced the other way around.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }
}

impl std::fmt::Display for MarketPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
