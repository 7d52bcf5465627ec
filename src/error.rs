//! Error handling module
//!
//! Top-level error type returned by the engine's public operations.
//! Collaborators translate these kinds into user-facing messages; this
//! crate never formats presentation text.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::domain::{AccountId, DomainError, IbanError};
use crate::store::StoreError;

/// Ledger-wide Result type
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors returned to the engine's callers
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    // Validation failures
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid IBAN: {0}")]
    InvalidIban(#[from] IbanError),

    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    // Lookup failures
    #[error("Source account not found: {0}")]
    SourceAccountNotFound(AccountId),

    #[error("Destination account not found for IBAN {0}")]
    DestinationAccountNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    // Transfer protocol failures
    #[error("Source account is not active")]
    SourceAccountInactive,

    #[error("Destination account is not active")]
    DestinationAccountInactive,

    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Could not allocate a unique IBAN")]
    IbanAllocationFailed,

    // Domain rule violations not covered above
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Store-layer faults; always preceded by a rollback of the unit of work
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LedgerError {
    /// Expected, recoverable conditions the caller reports back to the end
    /// user, as opposed to faults worth logging and escalating.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidAmount(_)
            | Self::InvalidIban(_)
            | Self::InvalidAccountType(_)
            | Self::SourceAccountNotFound(_)
            | Self::DestinationAccountNotFound(_)
            | Self::AccountNotFound(_)
            | Self::UserNotFound(_)
            | Self::SourceAccountInactive
            | Self::DestinationAccountInactive
            | Self::SameAccountTransfer
            | Self::InsufficientFunds { .. } => true,
            Self::Domain(e) => e.is_client_error(),
            Self::IbanAllocationFailed | Self::Store(_) | Self::Config(_) => false,
        }
    }
}
