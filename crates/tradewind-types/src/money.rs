//! Currency and fixed-point money types
//!
//! All monetary amounts in Tradewind are `rust_decimal::Decimal` values
//! scaled to the currency's minor unit. Amounts cross the wire as
//! decimal strings ("1000.00"), never as floats.

use crate::{DomainError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies supported by the trade desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    CNY,
    AED,
    SGD,
}

impl Currency {
    /// ISO-4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CNY => "CNY",
            Self::AED => "AED",
            Self::SGD => "SGD",
        }
    }

    /// Minor-unit scale (all supported currencies use 2)
    pub fn decimals(&self) -> u32 {
        2
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CNY" => Ok(Self::CNY),
            "AED" => Ok(Self::AED),
            "SGD" => Ok(Self::SGD),
            other => Err(DomainError::validation(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

/// A currency-tagged fixed-point amount
///
/// Construction normalizes the scale to the currency's minor unit, so
/// a `Money` always displays with the full fraction ("1000.00", not
/// "1000"). Arithmetic is checked and currency-aware; mixing
/// currencies yields `CurrencyMismatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    /// Create a money value, rescaled to the currency's minor unit
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        let mut amount = amount
            .round_dp_with_strategy(currency.decimals(), RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(currency.decimals());
        Self { amount, currency }
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Parse a decimal string ("1000.00") in the given currency
    pub fn parse(s: &str, currency: Currency) -> Result<Self> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| DomainError::InvalidAmount {
            message: format!("not a decimal amount: {s:?}"),
        })?;
        Ok(Self::new(amount, currency))
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Negate (used for debit postings)
    pub fn negated(&self) -> Self {
        Self {
            amount: -self.amount,
            currency: self.currency,
        }
    }

    /// Checked, currency-aware addition
    pub fn checked_add(&self, other: Money) -> Result<Money> {
        self.require_currency(other.currency)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::InvalidAmount {
                message: "amount overflow".into(),
            })?;
        Ok(Self::new(amount, self.currency))
    }

    /// Checked, currency-aware subtraction (may go negative; the
    /// ledger store is what enforces non-negative balances)
    pub fn checked_sub(&self, other: Money) -> Result<Money> {
        self.checked_add(other.negated())
    }

    /// Fail with `CurrencyMismatch` unless `other` matches
    pub fn require_currency(&self, other: Currency) -> Result<()> {
        if self.currency != other {
            return Err(DomainError::CurrencyMismatch {
                expected: self.currency.code().into(),
                actual: other.code().into(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
