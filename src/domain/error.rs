//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::money::MoneyError;

/// Business rule violations raised by account operations.
///
/// These are independent of the storage layer; the engine wraps them into
/// its own error type before returning to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Credit/debit attempted on an inactive account
    #[error("Account is not active")]
    AccountInactive,

    /// Debit exceeds the available balance
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Deactivation attempted while funds remain
    #[error("Account balance must be zero before closing (remaining {remaining})")]
    BalanceNotCleared { remaining: Decimal },

    /// Unknown account type label
    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    /// Money-level failure (currency mismatch, invalid amount)
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl DomainError {
    /// Check if this is a client error (caller's fault, recoverable)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::AccountInactive
                | Self::InsufficientFunds { .. }
                | Self::BalanceNotCleared { .. }
                | Self::InvalidAccountType(_)
                | Self::Money(_)
        )
    }
}
