//! Unsigned token amounts and signed day-over-day deltas.
//!
//! Token amounts are arbitrary-precision integers in the token's 18-decimal
//! base unit. Subtraction is checked: underflow surfaces as `None` and is
//! rejected by callers rather than wrapped.

use crate::domain::Decimal;
use num_bigint::{BigInt, BigUint};
use num_traits::{CheckedSub, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimals in the token's base unit.
pub const TOKEN_DECIMALS: u32 = 18;

/// Error parsing a token amount string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid token amount {0:?}: expected an unsigned decimal integer")]
pub struct AmountParseError(pub String);

/// Error converting an amount into the exact-decimal range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("amount {0} exceeds the exact-decimal range")]
pub struct AmountRangeError(pub String);

/// An unsigned token amount in base units.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(BigUint);

impl TokenAmount {
    /// The additive identity (0).
    pub fn zero() -> Self {
        TokenAmount(BigUint::zero())
    }

    /// Returns true if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Create an amount from raw base units.
    pub fn from_base_units(units: u128) -> Self {
        TokenAmount(BigUint::from(units))
    }

    /// Create an amount from a big-endian byte word (e.g. an ABI word).
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        TokenAmount(BigUint::from_bytes_be(bytes))
    }

    /// Sum of this amount and another.
    pub fn plus(&self, other: &TokenAmount) -> TokenAmount {
        TokenAmount(&self.0 + &other.0)
    }

    /// Difference of this amount and another, or `None` on underflow.
    pub fn checked_sub(&self, other: &TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(&other.0).map(TokenAmount)
    }

    /// Signed difference `self - previous`.
    pub fn delta_from(&self, previous: &TokenAmount) -> AmountDelta {
        AmountDelta(BigInt::from(self.0.clone()) - BigInt::from(previous.0.clone()))
    }

    /// This amount as an exact decimal of base units.
    ///
    /// # Errors
    /// Returns an error if the amount exceeds the decimal mantissa range.
    pub fn to_decimal(&self) -> Result<Decimal, AmountRangeError> {
        Decimal::from_str_canonical(&self.0.to_string())
            .map_err(|_| AmountRangeError(self.0.to_string()))
    }

    /// USD value of this amount at `price` (USD per whole token).
    ///
    /// Computed as `amount * price / 10^18` in exact decimals.
    ///
    /// # Errors
    /// Returns an error if the amount exceeds the decimal mantissa range.
    pub fn usd_value(&self, price: &Decimal) -> Result<Decimal, AmountRangeError> {
        let base_unit_scale: Decimal =
            rust_decimal::Decimal::from_i128_with_scale(10i128.pow(TOKEN_DECIMALS), 0).into();
        Ok(self.to_decimal()? * *price / base_unit_scale)
    }
}

impl std::ops::AddAssign<&TokenAmount> for TokenAmount {
    fn add_assign(&mut self, rhs: &TokenAmount) {
        self.0 += &rhs.0;
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.starts_with('-') || trimmed.starts_with('+') {
            return Err(AmountParseError(s.to_string()));
        }
        BigUint::from_str(trimmed)
            .map(TokenAmount)
            .map_err(|_| AmountParseError(s.to_string()))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A signed difference between two token amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountDelta(BigInt);

impl AmountDelta {
    /// The zero delta.
    pub fn zero() -> Self {
        AmountDelta(BigInt::zero())
    }

    /// Returns true if the delta is negative.
    pub fn is_negative(&self) -> bool {
        self.0.sign() == num_bigint::Sign::Minus
    }
}

impl fmt::Display for AmountDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AmountDelta {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigInt::from_str(s.trim())
            .map(AmountDelta)
            .map_err(|_| AmountParseError(s.to_string()))
    }
}

impl Serialize for AmountDelta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AmountDelta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> TokenAmount {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let a = amt("10000000000000000000");
        assert_eq!(a.to_string(), "10000000000000000000");
    }

    #[test]
    fn test_parse_rejects_signs_and_garbage() {
        assert!("-5".parse::<TokenAmount>().is_err());
        assert!("+5".parse::<TokenAmount>().is_err());
        assert!("1.5".parse::<TokenAmount>().is_err());
        assert!("".parse::<TokenAmount>().is_err());
    }

    #[test]
    fn test_plus_and_add_assign() {
        let mut a = amt("10");
        a += &amt("5");
        assert_eq!(a, amt("15"));
        assert_eq!(a.plus(&amt("5")), amt("20"));
    }

    #[test]
    fn test_checked_sub_underflow() {
        assert_eq!(amt("10").checked_sub(&amt("4")), Some(amt("6")));
        assert_eq!(amt("4").checked_sub(&amt("10")), None);
    }

    #[test]
    fn test_delta_can_go_negative() {
        let delta = amt("4").delta_from(&amt("10"));
        assert_eq!(delta.to_string(), "-6");
        assert!(delta.is_negative());

        let delta = amt("10").delta_from(&amt("4"));
        assert_eq!(delta.to_string(), "6");
        assert!(!delta.is_negative());
    }

    #[test]
    fn test_delta_roundtrip() {
        let delta: AmountDelta = "-6000000000000000000".parse().unwrap();
        assert_eq!(delta.to_string(), "-6000000000000000000");
    }

    #[test]
    fn test_usd_value_scales_by_token_decimals() {
        // 10 tokens at 0.5 USD -> 5 USD.
        let a = amt("10000000000000000000");
        let price = Decimal::from_str_canonical("0.5").unwrap();
        let usd = a.usd_value(&price).unwrap();
        assert_eq!(usd.to_canonical_string(), "5");
    }

    #[test]
    fn test_usd_value_out_of_range() {
        // More digits than the decimal mantissa can hold.
        let a = amt(&"9".repeat(40));
        let price = Decimal::from_str_canonical("1").unwrap();
        assert!(a.usd_value(&price).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let a = amt("10000000000000000000");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"10000000000000000000\"");
        let back: TokenAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
