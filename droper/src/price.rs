use crate::{Error, Result};
use derive_more::{Deref, Display, From, Into};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Marketplace identifier of a product offer. Our own offer and competing
/// offers share the same id space.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    From,
    Into,
    Deref,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ProductId(u64);

/// An amount of money held as whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn from_decimal(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidPrice(value.to_string()));
        }
        Ok(Self((value * 100.0).round() as i64))
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// What the seller receives after the marketplace takes `fee_rate`.
    pub fn net_of_fee(self, fee_rate: f64) -> Self {
        Self((self.0 as f64 * (1.0 - fee_rate)).round() as i64)
    }
}

impl FromStr for Price {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidPrice(s.to_string()))?;
        Self::from_decimal(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Price::from_decimal(f64::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_textual_decimals() {
        assert_eq!("12.34".parse::<Price>().unwrap(), Price::from_cents(1234));
        assert_eq!(" 1200.00 ".parse::<Price>().unwrap(), Price::from_cents(120_000));
        assert_eq!("9.5".parse::<Price>().unwrap(), Price::from_cents(950));
        assert_eq!("0.1".parse::<Price>().unwrap(), Price::from_cents(10));
    }

    #[test]
    fn rejects_garbage_and_negative_prices() {
        assert!("abc".parse::<Price>().is_err());
        assert!("".parse::<Price>().is_err());
        assert!("-1.00".parse::<Price>().is_err());
        assert!("NaN".parse::<Price>().is_err());
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Price::from_cents(949).to_string(), "9.49");
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
        assert_eq!(Price::from_cents(120_000).to_string(), "1200.00");
        assert_eq!(Price::from_cents(-11).to_string(), "-0.11");
    }

    #[test]
    fn net_of_fee_rounds_to_cents() {
        assert_eq!(Price::from_cents(1000).net_of_fee(0.13), Price::from_cents(870));
        assert_eq!(Price::from_cents(999).net_of_fee(0.13), Price::from_cents(869));
    }

    #[test]
    fn serializes_as_json_number() {
        let json = serde_json::to_string(&Price::from_cents(989)).unwrap();
        assert_eq!(json, "9.89");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Price::from_cents(989));
    }
}
