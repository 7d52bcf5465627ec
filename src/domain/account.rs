//! Account entity
//!
//! An account holds a balance in a single currency. Balances are mutated
//! exclusively through `credit` and `debit`, which are the enforcement
//! points for the active-account and non-negative-balance invariants.
//! Persistence is the store's concern, never the account's.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::DomainError;
use super::iban::Iban;
use super::money::{Money, MoneyError};

/// Opaque account identifier.
///
/// Two identifiers are equal iff their underlying values are equal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AccountId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Supported account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Investment,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Investment => "investment",
        }
    }

    /// Default interest rate for the type (savings only)
    pub fn default_interest_rate(&self) -> Option<Decimal> {
        match self {
            // 1.5% p.a.
            Self::Savings => Some(Decimal::new(150, 4)),
            _ => None,
        }
    }
}

impl FromStr for AccountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "investment" => Ok(Self::Investment),
            other => Err(DomainError::InvalidAccountType(other.to_string())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account entity.
///
/// # Invariants
/// - balance is never negative (enforced by `debit`)
/// - the balance currency never changes after creation
/// - the IBAN is immutable once assigned
/// - an inactive account rejects both credit and debit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    user_id: Uuid,
    iban: Iban,
    name: String,
    account_type: AccountType,
    balance: Money,
    interest_rate: Option<Decimal>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Open a new account with a zero balance in the given currency.
    pub fn open(
        user_id: Uuid,
        iban: Iban,
        name: String,
        account_type: AccountType,
        currency: super::money::Currency,
    ) -> Self {
        Self {
            id: AccountId::new(),
            user_id,
            iban,
            name,
            account_type,
            interest_rate: account_type.default_interest_rate(),
            balance: Money::zero(currency),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Rehydrate an account from persisted state. Used only by stores.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: AccountId,
        user_id: Uuid,
        iban: Iban,
        name: String,
        account_type: AccountType,
        balance: Money,
        interest_rate: Option<Decimal>,
        is_active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            iban,
            name,
            account_type,
            balance,
            interest_rate,
            is_active,
            created_at,
        }
    }

    /// Add an amount to the balance.
    ///
    /// # Errors
    /// - `DomainError::AccountInactive` if the account is not active
    /// - `MoneyError::CurrencyMismatch` if the currencies differ
    pub fn credit(&mut self, amount: &Money) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::AccountInactive);
        }
        self.balance = self.balance.add(amount)?;
        Ok(())
    }

    /// Subtract an amount from the balance. This is the authoritative
    /// enforcement point for the no-overdraft invariant.
    ///
    /// # Errors
    /// - `DomainError::AccountInactive` if the account is not active
    /// - `MoneyError::CurrencyMismatch` if the currencies differ
    /// - `DomainError::InsufficientFunds` if the balance does not cover it
    pub fn debit(&mut self, amount: &Money) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::AccountInactive);
        }
        match self.balance.subtract(amount) {
            Ok(balance) => {
                self.balance = balance;
                Ok(())
            }
            Err(MoneyError::NegativeResult) => Err(DomainError::InsufficientFunds {
                required: amount.amount(),
                available: self.balance.amount(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Advisory sufficiency check. May be stale under concurrency; `debit`
    /// remains the authoritative check.
    pub fn has_enough_balance(&self, amount: &Money) -> bool {
        self.balance.greater_or_equal(amount).unwrap_or(false)
    }

    /// Mark the account inactive. Only allowed once the balance is zero;
    /// a hard delete, if any, is the collaborating application's concern.
    pub fn deactivate(&mut self) -> Result<(), DomainError> {
        if !self.balance.is_zero() {
            return Err(DomainError::BalanceNotCleared {
                remaining: self.balance.amount(),
            });
        }
        self.is_active = false;
        Ok(())
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn iban(&self) -> &Iban {
        &self.iban
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balance(&self) -> &Money {
        &self.balance
    }

    pub fn interest_rate(&self) -> Option<Decimal> {
        self.interest_rate
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Account equality is identifier equality, not attribute equality.
impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Account {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;
    use rust_decimal_macros::dec;

    fn eur() -> Currency {
        Currency::new("EUR").unwrap()
    }

    fn test_account() -> Account {
        Account::open(
            Uuid::new_v4(),
            Iban::parse("DE89370400440532013000").unwrap(),
            "Main".to_string(),
            AccountType::Checking,
            eur(),
        )
    }

    #[test]
    fn test_open_starts_at_zero_and_active() {
        let account = test_account();
        assert!(account.is_active());
        assert!(account.balance().is_zero());
        assert_eq!(account.balance().currency().code(), "EUR");
        assert_eq!(account.interest_rate(), None);
    }

    #[test]
    fn test_savings_gets_default_interest_rate() {
        let account = Account::open(
            Uuid::new_v4(),
            Iban::parse("DE89370400440532013000").unwrap(),
            "Rainy day".to_string(),
            AccountType::Savings,
            eur(),
        );
        assert_eq!(account.interest_rate(), Some(dec!(0.0150)));
    }

    #[test]
    fn test_credit_then_debit() {
        let mut account = test_account();
        account.credit(&Money::new(dec!(100), eur()).unwrap()).unwrap();
        assert_eq!(account.balance().amount(), dec!(100.00));

        account.debit(&Money::new(dec!(30), eur()).unwrap()).unwrap();
        assert_eq!(account.balance().amount(), dec!(70.00));
    }

    #[test]
    fn test_debit_insufficient_funds() {
        let mut account = test_account();
        account.credit(&Money::new(dec!(10), eur()).unwrap()).unwrap();

        let result = account.debit(&Money::new(dec!(50), eur()).unwrap());
        assert!(matches!(
            result,
            Err(DomainError::InsufficientFunds { required, available })
                if required == dec!(50.00) && available == dec!(10.00)
        ));
        // balance untouched after the failed debit
        assert_eq!(account.balance().amount(), dec!(10.00));
    }

    #[test]
    fn test_currency_mismatch() {
        let mut account = test_account();
        let usd = Money::new(dec!(10), Currency::new("USD").unwrap()).unwrap();
        assert!(matches!(
            account.credit(&usd),
            Err(DomainError::Money(MoneyError::CurrencyMismatch { .. }))
        ));
        assert!(matches!(
            account.debit(&usd),
            Err(DomainError::Money(MoneyError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn test_inactive_account_rejects_operations() {
        let mut account = test_account();
        account.deactivate().unwrap();

        let amount = Money::new(dec!(1), eur()).unwrap();
        assert!(matches!(
            account.credit(&amount),
            Err(DomainError::AccountInactive)
        ));
        assert!(matches!(
            account.debit(&amount),
            Err(DomainError::AccountInactive)
        ));
    }

    #[test]
    fn test_deactivate_requires_zero_balance() {
        let mut account = test_account();
        account.credit(&Money::new(dec!(5), eur()).unwrap()).unwrap();

        assert!(matches!(
            account.deactivate(),
            Err(DomainError::BalanceNotCleared { remaining }) if remaining == dec!(5.00)
        ));
        assert!(account.is_active());
    }

    #[test]
    fn test_has_enough_balance_is_advisory() {
        let mut account = test_account();
        account.credit(&Money::new(dec!(10), eur()).unwrap()).unwrap();

        assert!(account.has_enough_balance(&Money::new(dec!(10), eur()).unwrap()));
        assert!(!account.has_enough_balance(&Money::new(dec!(10.01), eur()).unwrap()));
        // mismatched currency is never sufficient
        let usd = Money::new(dec!(1), Currency::new("USD").unwrap()).unwrap();
        assert!(!account.has_enough_balance(&usd));
    }

    #[test]
    fn test_equality_is_identifier_equality() {
        let a = test_account();
        let mut b = a.clone();
        b.credit(&Money::new(dec!(100), eur()).unwrap()).unwrap();
        assert_eq!(a, b);

        let c = test_account();
        assert_ne!(a, c);
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!("checking".parse::<AccountType>().unwrap(), AccountType::Checking);
        assert_eq!("Savings".parse::<AccountType>().unwrap(), AccountType::Savings);
        assert!(matches!(
            "premium".parse::<AccountType>(),
            Err(DomainError::InvalidAccountType(_))
        ));
    }
}
