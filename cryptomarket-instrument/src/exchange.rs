use crate::error::InstrumentError;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Unique identifier of a REST market data source (an exchange or a listing service).
///
/// ### Notes
/// GDAX is the legacy name of the Coinbase Exchange REST API, so `"coinbase"` parses to
/// [`ExchangeId::Gdax`]. Bitfinex always refers to the v2 API (`"bitfinex2"` is accepted as an
/// alias).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename = "exchange", rename_all = "snake_case")]
pub enum ExchangeId {
    #[serde(alias = "bitfinex2")]
    #[display("bitfinex")]
    Bitfinex,
    #[display("bitmex")]
    Bitmex,
    #[display("bittrex")]
    Bittrex,
    #[serde(rename = "coinmarketcap")]
    #[display("coinmarketcap")]
    CoinMarketCap,
    #[serde(rename = "cryptocompare")]
    #[display("cryptocompare")]
    CryptoCompare,
    #[serde(alias = "coinbase")]
    #[display("gdax")]
    Gdax,
    #[display("poloniex")]
    Poloniex,
}

impl ExchangeId {
    /// Every supported [`ExchangeId`], in alphabetical order.
    pub const ALL: [ExchangeId; 7] = [
        ExchangeId::Bitfinex,
        ExchangeId::Bitmex,
        ExchangeId::Bittrex,
        ExchangeId::CoinMarketCap,
        ExchangeId::CryptoCompare,
        ExchangeId::Gdax,
        ExchangeId::Poloniex,
    ];

    /// Return the &str representation of this [`ExchangeId`]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Bitfinex => "bitfinex",
            ExchangeId::Bitmex => "bitmex",
            ExchangeId::Bittrex => "bittrex",
            ExchangeId::CoinMarketCap => "coinmarketcap",
            ExchangeId::CryptoCompare => "cryptocompare",
            ExchangeId::Gdax => "gdax",
            ExchangeId::Poloniex => "poloniex",
        }
    }
}

impl std::str::FromStr for ExchangeId {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "bitfinex" | "bitfinex2" => Ok(ExchangeId::Bitfinex),
            "bitmex" => Ok(ExchangeId::Bitmex),
            "bittrex" => Ok(ExchangeId::Bittrex),
            "coinmarketcap" | "coin_market_cap" => Ok(ExchangeId::CoinMarketCap),
            "cryptocompare" | "crypto_compare" => Ok(ExchangeId::CryptoCompare),
            "gdax" | "coinbase" => Ok(ExchangeId::Gdax),
            "poloniex" => Ok(ExchangeId::Poloniex),
            _ => Err(InstrumentError::UnknownExchange(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_exchange_id() {
        assert_eq!(
            serde_json::from_str::<ExchangeId>(r#""gdax""#).unwrap(),
            ExchangeId::Gdax
        );
        assert_eq!(
            serde_json::from_str::<ExchangeId>(r#""coinbase""#).unwrap(),
            ExchangeId::Gdax
        );
        assert_eq!(
            serde_json::from_str::<ExchangeId>(r#""coinmarketcap""#).unwrap(),
            ExchangeId::CoinMarketCap
        );
    }

    #[test]
    fn test_from_str_roundtrip() {
        for variant in ExchangeId::ALL {
            let parsed: ExchangeId = variant.as_str().parse().unwrap_or_else(|e| {
                panic!("failed to parse {:?} from {:?}: {e}", variant, variant.as_str())
            });
            assert_eq!(parsed, variant, "roundtrip failed for {:?}", variant);
        }
    }

    #[test]
    fn test_display_matches_serde_name() {
        for variant in ExchangeId::ALL {
            let serialized = serde_json::to_string(&variant).unwrap();
            assert_eq!(variant.to_string(), variant.as_str());
            assert_eq!(serialized, format!("\"{variant}\""));
        }
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("Bitfinex2".parse::<ExchangeId>().unwrap(), ExchangeId::Bitfinex);
        assert_eq!("COINBASE".parse::<ExchangeId>().unwrap(), ExchangeId::Gdax);
        assert_eq!(" poloniex ".parse::<ExchangeId>().unwrap(), ExchangeId::Poloniex);
    }

    #[test]
    fn test_from_str_invalid() {
        let result = "not_a_real_exchange".parse::<ExchangeId>();
        assert_eq!(
            result.unwrap_err(),
            InstrumentError::UnknownExchange("not_a_real_exchange".to_owned())
        );
    }
}
