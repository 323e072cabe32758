use crate::error::DataError;
use chrono::TimeDelta;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Normalised candle frequency.
///
/// Every frequency has a canonical length in seconds. A month is always 30 days.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Frequency {
    M1,
    M5,
    M15,
    M30,
    H1,
    H3,
    H6,
    H12,
    D1,
    W1,
    W2,
    Month1,
}

impl Frequency {
    pub const ALL: [Frequency; 12] = [
        Frequency::M1,
        Frequency::M5,
        Frequency::M15,
        Frequency::M30,
        Frequency::H1,
        Frequency::H3,
        Frequency::H6,
        Frequency::H12,
        Frequency::D1,
        Frequency::W1,
        Frequency::W2,
        Frequency::Month1,
    ];

    /// Canonical length of one candle in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Frequency::M1 => 60,
            Frequency::M5 => 300,
            Frequency::M15 => 900,
            Frequency::M30 => 1800,
            Frequency::H1 => 3600,
            Frequency::H3 => 10_800,
            Frequency::H6 => 21_600,
            Frequency::H12 => 43_200,
            Frequency::D1 => 86_400,
            Frequency::W1 => 604_800,
            Frequency::W2 => 1_209_600,
            Frequency::Month1 => 2_592_000,
        }
    }

    /// Canonical length of one candle.
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::seconds(self.seconds())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::M1 => "1m",
            Frequency::M5 => "5m",
            Frequency::M15 => "15m",
            Frequency::M30 => "30m",
            Frequency::H1 => "1h",
            Frequency::H3 => "3h",
            Frequency::H6 => "6h",
            Frequency::H12 => "12h",
            Frequency::D1 => "1d",
            Frequency::W1 => "1w",
            Frequency::W2 => "2w",
            Frequency::Month1 => "1M",
        }
    }

    /// Reverse lookup of [`Frequency::seconds`].
    pub fn from_seconds(seconds: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|frequency| frequency.seconds() == seconds)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = DataError;

    /// Parse either a frequency token (eg/ "1h") or its length in seconds (eg/ "3600").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(frequency) = Self::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == trimmed)
        {
            return Ok(frequency);
        }

        trimmed
            .parse::<i64>()
            .ok()
            .and_then(Self::from_seconds)
            .ok_or_else(|| DataError::InvalidArgument(format!("unknown frequency: {s}")))
    }
}

impl Serialize for Frequency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let input = String::deserialize(deserializer)?;
        input.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_table() {
        let expected = [
            60, 300, 900, 1800, 3600, 10_800, 21_600, 43_200, 86_400, 604_800, 1_209_600,
            2_592_000,
        ];

        for (frequency, seconds) in Frequency::ALL.into_iter().zip(expected) {
            assert_eq!(frequency.seconds(), seconds, "{frequency} failed");
            assert_eq!(Frequency::from_seconds(seconds), Some(frequency));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("1h".parse::<Frequency>().unwrap(), Frequency::H1);
        assert_eq!("3600".parse::<Frequency>().unwrap(), Frequency::H1);
        assert_eq!("1M".parse::<Frequency>().unwrap(), Frequency::Month1);
        assert_eq!("1m".parse::<Frequency>().unwrap(), Frequency::M1);
        assert_eq!(" 30m ".parse::<Frequency>().unwrap(), Frequency::M30);
    }

    #[test]
    fn test_from_str_unknown() {
        assert!(matches!(
            "2h".parse::<Frequency>(),
            Err(DataError::InvalidArgument(_))
        ));
        assert!(matches!(
            "7200".parse::<Frequency>(),
            Err(DataError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_de_frequency() {
        assert_eq!(
            serde_json::from_str::<Frequency>(r#""15m""#).unwrap(),
            Frequency::M15
        );
        assert_eq!(
            serde_json::to_string(&Frequency::W2).unwrap(),
            r#""2w""#
        );
    }
}
