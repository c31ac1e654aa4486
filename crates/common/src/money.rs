//! Monetary amounts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An amount fell outside the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Amount out of range")]
pub struct AmountOverflow;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = 10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiplies by a quantity, failing instead of wrapping.
    pub fn times(&self, quantity: u32) -> Result<Money, AmountOverflow> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
            .ok_or(AmountOverflow)
    }

    /// Adds two amounts, failing instead of wrapping.
    pub fn checked_add(&self, other: Money) -> Result<Money, AmountOverflow> {
        self.cents
            .checked_add(other.cents)
            .map(Money::from_cents)
            .ok_or(AmountOverflow)
    }

    /// Sums a sequence of amounts, failing on the first overflow.
    pub fn sum<I>(amounts: I) -> Result<Money, AmountOverflow>
    where
        I: IntoIterator<Item = Result<Money, AmountOverflow>>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m?))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(2500).to_string(), "25.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_times_and_sum() {
        let total = Money::sum([
            Money::from_cents(1000).times(2),
            Money::from_cents(500).times(1),
        ])
        .unwrap();
        assert_eq!(total, Money::from_cents(2500));
        assert_eq!(
            Money::sum(Vec::<Result<Money, AmountOverflow>>::new()),
            Ok(Money::zero())
        );
    }

    #[test]
    fn test_money_overflow_is_an_error() {
        let huge = Money::from_cents(5_000_000_000_000_000_000);
        assert_eq!(huge.times(2), Err(AmountOverflow));
        assert_eq!(huge.checked_add(huge), Err(AmountOverflow));
        assert_eq!(
            Money::sum([Ok(huge), huge.times(1), Ok(Money::from_cents(1))]),
            Err(AmountOverflow)
        );
    }

    #[test]
    fn test_money_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(999)).unwrap();
        assert_eq!(json, "999");
    }
}
