//! Value Objects for the cart

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog product identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(IdError::Empty); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Line-item key: the product id alone, or `product_variant` for weight tiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(String);

impl CartId {
    pub fn for_item(product_id: &ProductId, variant_id: Option<&str>) -> Self {
        match variant_id {
            Some(variant) => Self(format!("{}_{}", product_id.as_str(), variant)),
            None => Self(product_id.as_str().to_string()),
        }
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for CartId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum IdError { Empty }
impl std::error::Error for IdError {}
impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Identifier empty") }
}

/// Money value object. Single currency; amounts are never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(MoneyError::Negative); }
        Ok(Self(amount))
    }
    /// Builds an amount from minor units, e.g. `from_cents(750)` is 7.50.
    pub fn from_cents(cents: u32) -> Self { Self(Decimal::new(i64::from(cents), 2)) }
    pub fn zero() -> Self { Self::ZERO }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }
    /// Sum capped at the largest representable amount.
    pub fn add(&self, other: &Money) -> Money { Money(self.0.saturating_add(other.0)) }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0.saturating_mul(Decimal::from(qty))) }
    pub fn checked_add(&self, other: &Money) -> Option<Money> { self.0.checked_add(other.0).map(Money) }
    pub fn checked_multiply(&self, qty: u32) -> Option<Money> { self.0.checked_mul(Decimal::from(qty)).map(Money) }
    /// Difference floored at zero.
    pub fn saturating_sub(&self, other: &Money) -> Money {
        if other.0 >= self.0 { Money::ZERO } else { Money(self.0 - other.0) }
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> { Money::new(value) }
}

/// Always two decimal places on the wire, so `0` goes out as `"0.00"`.
impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        let mut amount = value.0;
        amount.rescale(2);
        amount
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { Negative }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Amount cannot be negative") }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_cart_id_identity() {
        let p = ProductId::new(" truffle-1 ").unwrap();
        assert_eq!(CartId::for_item(&p, None).as_str(), "truffle-1");
        assert_eq!(CartId::for_item(&p, Some("50g")).as_str(), "truffle-1_50g");
    }
    #[test]
    fn test_empty_product_id() { assert_eq!(ProductId::new("  "), Err(IdError::Empty)); }
    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(2000);
        assert_eq!(a.multiply(2).add(&Money::from_cents(1000)).amount(), Decimal::new(5000, 2));
        assert_eq!(Money::from_cents(500).saturating_sub(&a), Money::ZERO);
    }
    #[test]
    fn test_money_rejects_negative() {
        assert_eq!(Money::new(Decimal::new(-1, 2)), Err(MoneyError::Negative));
        assert!(serde_json::from_str::<Money>("\"-3.00\"").is_err());
    }
    #[test]
    fn test_money_serde() {
        let m: Money = serde_json::from_str("\"74.99\"").unwrap();
        assert_eq!(m, Money::from_cents(7499));
        let n: Money = serde_json::from_str("12.5").unwrap();
        assert_eq!(n.to_string(), "12.50");
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"74.99\"");
    }
    #[test]
    fn test_money_serializes_two_places() {
        assert_eq!(serde_json::to_string(&Money::ZERO).unwrap(), "\"0.00\"");
        assert_eq!(serde_json::to_string(&Money::new(Decimal::new(125, 1)).unwrap()).unwrap(), "\"12.50\"");
        assert_eq!(serde_json::to_string(&Money::new(Decimal::new(12346, 3)).unwrap()).unwrap(), "\"12.35\"");
    }
    #[test]
    fn test_money_overflow() {
        let max = Money::new(Decimal::MAX).unwrap();
        assert_eq!(max.checked_multiply(2), None);
        assert_eq!(max.checked_add(&Money::from_cents(1)), None);
        assert_eq!(max.checked_multiply(1), Some(max));
        assert_eq!(max.multiply(2), max);
        assert_eq!(max.add(&max), max);
    }
}
