//! Money type
//!
//! Domain primitive for monetary values with currency-checked arithmetic.
//! Amounts are validated and rounded at construction time, ensuring invalid
//! values cannot exist in the system. Every operation is pure and returns a
//! new value; two amounts in different currencies never combine.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors from constructing or combining monetary values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Amount must not be negative (got {0})")]
    InvalidAmount(Decimal),

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Currency mismatch: expected {expected}, got {found}")]
    CurrencyMismatch { expected: String, found: String },

    #[error("Subtraction would produce a negative amount")]
    NegativeResult,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// ISO 4217 currency code.
///
/// Validated at construction: exactly three ASCII letters, stored uppercase.
/// The currency determines the minor unit every [`Money`] value is rounded to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parse and normalize a currency code.
    ///
    /// # Errors
    /// `MoneyError::InvalidCurrency` unless the code is three ASCII letters.
    pub fn new(code: &str) -> Result<Self, MoneyError> {
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MoneyError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// The ISO code, uppercase.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of decimal places of the currency's minor unit.
    pub fn minor_units(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" | "CLP" => 0,
            "BHD" | "KWD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Money represents a validated, non-negative amount in a single currency.
///
/// # Invariants
/// - Amount is never negative
/// - Amount is rounded to the currency's minor unit (2 places for EUR)
/// - Arithmetic across currencies is rejected with `CurrencyMismatch`
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use bank_ledger::domain::{Currency, Money};
///
/// let eur = Currency::new("EUR").unwrap();
/// let m = Money::new(Decimal::new(1050, 2), eur).unwrap();
/// assert_eq!(m.amount(), Decimal::new(1050, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Create a new Money value, rounding to the currency's minor unit.
    ///
    /// # Errors
    /// `MoneyError::InvalidAmount` if the amount is negative.
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if amount < Decimal::ZERO {
            return Err(MoneyError::InvalidAmount(amount));
        }
        let rounded = amount.round_dp_with_strategy(
            currency.minor_units(),
            RoundingStrategy::MidpointAwayFromZero,
        );
        Ok(Self {
            amount: rounded,
            currency,
        })
    }

    /// A zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Add another amount of the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Money::new(self.amount + other.amount, self.currency.clone())
    }

    /// Subtract another amount of the same currency.
    ///
    /// # Errors
    /// `MoneyError::NegativeResult` if the result would drop below zero.
    /// Callers checking sufficiency should treat this as an insufficiency
    /// failure.
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        if other.amount > self.amount {
            return Err(MoneyError::NegativeResult);
        }
        Money::new(self.amount - other.amount, self.currency.clone())
    }

    /// Scale by a non-negative factor.
    pub fn multiply(&self, factor: Decimal) -> Result<Money, MoneyError> {
        if factor < Decimal::ZERO {
            return Err(MoneyError::InvalidArgument(format!(
                "multiplication factor must not be negative (got {factor})"
            )));
        }
        Money::new(self.amount * factor, self.currency.clone())
    }

    /// Divide by a strictly positive divisor.
    pub fn divide(&self, divisor: Decimal) -> Result<Money, MoneyError> {
        if divisor <= Decimal::ZERO {
            return Err(MoneyError::InvalidArgument(format!(
                "divisor must be positive (got {divisor})"
            )));
        }
        Money::new(self.amount / divisor, self.currency.clone())
    }

    pub fn greater_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount > other.amount)
    }

    pub fn greater_or_equal(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount >= other.amount)
    }

    pub fn less_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount < other.amount)
    }

    pub fn less_or_equal(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount <= other.amount)
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                found: other.currency.code().to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eur() -> Currency {
        Currency::new("EUR").unwrap()
    }

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    #[test]
    fn test_currency_normalized() {
        let c = Currency::new("eur").unwrap();
        assert_eq!(c.code(), "EUR");
        assert_eq!(c.minor_units(), 2);
    }

    #[test]
    fn test_currency_invalid() {
        assert!(matches!(
            Currency::new("EURO"),
            Err(MoneyError::InvalidCurrency(_))
        ));
        assert!(matches!(
            Currency::new("E1R"),
            Err(MoneyError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_zero_decimal_currency() {
        let jpy = Currency::new("JPY").unwrap();
        let m = Money::new(dec!(100.6), jpy).unwrap();
        assert_eq!(m.amount(), dec!(101));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result = Money::new(dec!(-0.01), eur());
        assert!(matches!(result, Err(MoneyError::InvalidAmount(_))));
    }

    #[test]
    fn test_rounds_to_minor_unit() {
        let m = Money::new(dec!(10.005), eur()).unwrap();
        assert_eq!(m.amount(), dec!(10.01));

        let m = Money::new(dec!(10.004), eur()).unwrap();
        assert_eq!(m.amount(), dec!(10.00));
    }

    #[test]
    fn test_add_same_currency() {
        let a = Money::new(dec!(10.10), eur()).unwrap();
        let b = Money::new(dec!(0.90), eur()).unwrap();
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.amount(), dec!(11.00));
        // operands untouched
        assert_eq!(a.amount(), dec!(10.10));
    }

    #[test]
    fn test_add_currency_mismatch() {
        let a = Money::new(dec!(10), eur()).unwrap();
        let b = Money::new(dec!(10), usd()).unwrap();
        assert!(matches!(
            a.add(&b),
            Err(MoneyError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_subtract() {
        let a = Money::new(dec!(10.00), eur()).unwrap();
        let b = Money::new(dec!(4.25), eur()).unwrap();
        assert_eq!(a.subtract(&b).unwrap().amount(), dec!(5.75));
    }

    #[test]
    fn test_subtract_negative_result() {
        let a = Money::new(dec!(1.00), eur()).unwrap();
        let b = Money::new(dec!(1.01), eur()).unwrap();
        assert!(matches!(a.subtract(&b), Err(MoneyError::NegativeResult)));
    }

    #[test]
    fn test_multiply_divide() {
        let m = Money::new(dec!(10.00), eur()).unwrap();
        assert_eq!(m.multiply(dec!(1.5)).unwrap().amount(), dec!(15.00));
        assert_eq!(m.divide(dec!(3)).unwrap().amount(), dec!(3.33));

        assert!(matches!(
            m.multiply(dec!(-1)),
            Err(MoneyError::InvalidArgument(_))
        ));
        assert!(matches!(
            m.divide(Decimal::ZERO),
            Err(MoneyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_comparisons() {
        let a = Money::new(dec!(10), eur()).unwrap();
        let b = Money::new(dec!(5), eur()).unwrap();
        assert!(a.greater_than(&b).unwrap());
        assert!(a.greater_or_equal(&a).unwrap());
        assert!(b.less_than(&a).unwrap());
        assert!(b.less_or_equal(&b).unwrap());

        let c = Money::new(dec!(10), usd()).unwrap();
        assert!(matches!(
            a.greater_than(&c),
            Err(MoneyError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_zero() {
        let z = Money::zero(eur());
        assert!(z.is_zero());
        assert!(!z.is_positive());
    }
}
