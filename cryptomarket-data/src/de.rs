use serde::{Deserialize, Deserializer, de::SeqAccess};
use std::{fmt::Display, str::FromStr};

/// Extract the next element from a [`SeqAccess`], failing with a descriptive error if the
/// sequence ends early.
pub fn extract_next<'de, SeqAccessor, Target>(
    sequence: &mut SeqAccessor,
    name: &'static str,
) -> Result<Target, SeqAccessor::Error>
where
    SeqAccessor: SeqAccess<'de>,
    Target: Deserialize<'de>,
{
    sequence
        .next_element::<Target>()?
        .ok_or_else(|| serde::de::Error::missing_field(name))
}

/// Vendors are inconsistent about quoting numbers: `"0.0123"` and `0.0123` must both parse.
#[derive(Deserialize)]
#[serde(untagged)]
enum StrOr<T> {
    Str(String),
    Value(T),
}

impl<T> StrOr<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn into_value<E: serde::de::Error>(self) -> Result<T, E> {
        match self {
            StrOr::Value(value) => Ok(value),
            StrOr::Str(value) => value.trim().parse().map_err(E::custom),
        }
    }
}

/// Deserialize a number that may be encoded as a JSON string or a JSON number.
pub fn de_flexible<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    StrOr::<T>::deserialize(deserializer)?.into_value()
}

/// Deserialize an optional number that may be encoded as a JSON string, a JSON number or
/// `null`.
pub fn de_flexible_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    Option::<StrOr<T>>::deserialize(deserializer)?
        .map(StrOr::into_value)
        .transpose()
}

/// [`de_flexible_opt`] that also reads the vendor placeholders `"N/A"` and `""` as `None`.
pub fn de_available_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<StrOr<T>>::deserialize(deserializer)? {
        Some(StrOr::Str(value)) if matches!(value.trim(), "" | "N/A") => Ok(None),
        other => other.map(StrOr::into_value).transpose(),
    }
}

/// [`de_flexible`] `f64` for use inside a sequence visitor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlexibleF64(pub f64);

impl<'de> Deserialize<'de> for FlexibleF64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        de_flexible(deserializer).map(FlexibleF64)
    }
}
