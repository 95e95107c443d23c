// Copyright 2026 AutoHub Garage.

//! Monetary value objects
//!
//! Value Objects are immutable, compared by value, and updated by replacement.
//! `Money` keeps amounts in integer minor units so cart totals and order
//! amounts never accumulate floating-point drift.

use crate::errors::{DomainError, DomainResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency definition: ISO-4217 code with exponent for minor units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Currency {
    /// ISO-4217 code (e.g., "UGX", "USD")
    pub code: String,
    /// Minor unit exponent (e.g., 2 for cents, 0 for shillings)
    pub exponent: u8,
}

impl Currency {
    /// Create a Currency definition
    pub fn new(code: impl Into<String>, exponent: u8) -> Self {
        Self {
            code: code.into(),
            exponent,
        }
    }

    /// Ugandan shilling, the merchant's currency (no minor units)
    pub fn ugx() -> Self {
        Self::new("UGX", 0)
    }
}

/// Money as an immutable value object: amount in minor units + currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Money {
    /// Amount in minor units (e.g., cents)
    amount_minor: i128,
    currency: Currency,
}

impl Money {
    /// Create Money from a major unit amount using the currency exponent.
    pub fn from_major(major: i128, currency: Currency) -> Self {
        let factor = 10i128.pow(currency.exponent as u32);
        Self {
            amount_minor: major * factor,
            currency,
        }
    }

    /// Create Money from minor units directly.
    pub fn from_minor(minor: i128, currency: Currency) -> Self {
        Self {
            amount_minor: minor,
            currency,
        }
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount_minor: 0,
            currency,
        }
    }

    /// Get currency
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Amount in minor units
    pub fn amount_minor(&self) -> i128 {
        self.amount_minor
    }

    /// Whether the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Add amounts if same currency.
    pub fn checked_add(&self, other: &Money) -> DomainResult<Money> {
        self.require_same_currency(other)?;
        let amount = self
            .amount_minor
            .checked_add(other.amount_minor)
            .ok_or_else(|| DomainError::InvariantViolation("Amount overflow".to_string()))?;
        Ok(Money {
            amount_minor: amount,
            currency: self.currency.clone(),
        })
    }

    /// Subtract amounts if same currency.
    pub fn checked_sub(&self, other: &Money) -> DomainResult<Money> {
        self.require_same_currency(other)?;
        let amount = self
            .amount_minor
            .checked_sub(other.amount_minor)
            .ok_or_else(|| DomainError::InvariantViolation("Amount overflow".to_string()))?;
        Ok(Money {
            amount_minor: amount,
            currency: self.currency.clone(),
        })
    }

    /// Multiply by a quantity (a cart or order line's contribution).
    pub fn checked_mul(&self, quantity: u32) -> DomainResult<Money> {
        let amount = self
            .amount_minor
            .checked_mul(quantity as i128)
            .ok_or_else(|| DomainError::InvariantViolation("Amount overflow".to_string()))?;
        Ok(Money {
            amount_minor: amount,
            currency: self.currency.clone(),
        })
    }

    fn require_same_currency(&self, other: &Money) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::InvariantViolation(format!(
                "Currency mismatch: {} vs {}",
                self.currency.code, other.currency.code
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.currency.exponent == 0 {
            return write!(f, "{} {}", self.currency.code, self.amount_minor);
        }
        let factor = 10i128.pow(self.currency.exponent as u32);
        let major = self.amount_minor / factor;
        let minor = (self.amount_minor % factor).unsigned_abs();
        write!(
            f,
            "{} {}.{:0width$}",
            self.currency.code,
            major,
            minor,
            width = self.currency.exponent as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_uses_exponent() {
        let usd = Currency::new("USD", 2);
        let m = Money::from_major(12, usd);
        assert_eq!(m.amount_minor(), 1200);

        let ugx = Currency::ugx();
        let m = Money::from_major(1200, ugx);
        assert_eq!(m.amount_minor(), 1200);
    }

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::from_minor(1200, Currency::ugx());
        let b = Money::from_minor(2400, Currency::ugx());
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.amount_minor(), 3600);
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let a = Money::from_minor(100, Currency::ugx());
        let b = Money::from_minor(100, Currency::new("USD", 2));
        let err = a.checked_add(&b).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_checked_mul_quantity() {
        let price = Money::from_minor(1200, Currency::ugx());
        let line = price.checked_mul(2).unwrap();
        assert_eq!(line.amount_minor(), 2400);
    }

    #[test]
    fn test_checked_mul_overflow() {
        let price = Money::from_minor(i128::MAX, Currency::ugx());
        assert!(price.checked_mul(2).is_err());
    }

    #[test]
    fn test_zero() {
        let zero = Money::zero(Currency::ugx());
        assert!(zero.is_zero());
        assert_eq!(zero.amount_minor(), 0);
    }

    #[test]
    fn test_display() {
        let ugx = Money::from_minor(2400, Currency::ugx());
        assert_eq!(ugx.to_string(), "UGX 2400");

        let usd = Money::from_minor(1205, Currency::new("USD", 2));
        assert_eq!(usd.to_string(), "USD 12.05");
    }

    #[test]
    fn test_serde_round_trip() {
        let original = Money::from_minor(1200, Currency::ugx());
        let json = serde_json::to_string(&original).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
