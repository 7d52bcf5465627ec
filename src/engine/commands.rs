//! Command definitions
//!
//! Commands represent intentions to change the ledger, plus the results
//! handed back to callers on success.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AccountId, Iban};

/// Command to move money from an account to a destination IBAN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    /// Source account identifier
    pub source_account_id: AccountId,
    /// Destination IBAN (resolved to an account internally)
    pub destination_iban: String,
    /// Amount to transfer; must be strictly positive
    pub amount: Decimal,
    /// ISO currency code; must match both accounts' currency
    pub currency: String,
    /// Optional free-text description for the ledger entry
    pub description: Option<String>,
}

impl TransferCommand {
    pub fn new(
        source_account_id: AccountId,
        destination_iban: String,
        amount: Decimal,
        currency: String,
    ) -> Self {
        Self {
            source_account_id,
            destination_iban,
            amount,
            currency,
            description: None,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }
}

/// Command to open a new account for an existing user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAccountCommand {
    /// Owning user
    pub user_id: Uuid,
    /// Human-readable account name
    pub name: String,
    /// Account type label ("checking", "savings", "investment")
    pub account_type: String,
    /// ISO currency code; the factory default applies when absent
    pub currency: Option<String>,
    /// Optional initial deposit, credited before first persistence
    pub initial_deposit: Option<Decimal>,
}

impl OpenAccountCommand {
    pub fn new(user_id: Uuid, name: String, account_type: String) -> Self {
        Self {
            user_id,
            name,
            account_type,
            currency: None,
            initial_deposit: None,
        }
    }

    pub fn with_currency(mut self, currency: String) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn with_initial_deposit(mut self, amount: Decimal) -> Self {
        self.initial_deposit = Some(amount);
        self
    }
}

/// Result of a successful transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transaction_id: Uuid,
}

/// Result of a successful account opening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAccountResult {
    pub account_id: AccountId,
    pub iban: Iban,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_command_builder() {
        let cmd = TransferCommand::new(
            AccountId::new(),
            "DE89370400440532013000".to_string(),
            dec!(100.00),
            "EUR".to_string(),
        )
        .with_description("Rent".to_string());

        assert_eq!(cmd.amount, dec!(100.00));
        assert_eq!(cmd.description, Some("Rent".to_string()));
    }

    #[test]
    fn test_open_account_command_builder() {
        let cmd = OpenAccountCommand::new(Uuid::new_v4(), "Main".to_string(), "savings".to_string())
            .with_currency("CHF".to_string())
            .with_initial_deposit(dec!(50));

        assert_eq!(cmd.currency, Some("CHF".to_string()));
        assert_eq!(cmd.initial_deposit, Some(dec!(50)));
    }
}
