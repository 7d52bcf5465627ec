//! Ledger entries
//!
//! A transaction record is written exactly once per money movement that
//! reaches the commit point and is immutable afterwards. Status changes
//! (e.g. an approval workflow) belong to the surrounding application.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::account::AccountId;
use super::money::{Currency, Money};

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown transaction status '{other}'")),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single ledger entry.
///
/// A completed transfer always carries both a source and a destination.
/// Deposits have no source; withdrawals have no destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub source_account_id: Option<AccountId>,
    pub destination_account_id: Option<AccountId>,
    pub amount: Decimal,
    pub currency: Currency,
    pub description: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Record a completed transfer between two accounts.
    pub fn transfer(
        source: AccountId,
        destination: AccountId,
        amount: &Money,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_account_id: Some(source),
            destination_account_id: Some(destination),
            amount: amount.amount(),
            currency: amount.currency().clone(),
            description,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Record a completed deposit into an account (no source).
    pub fn deposit(destination: AccountId, amount: &Money, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_account_id: None,
            destination_account_id: Some(destination),
            amount: amount.amount(),
            currency: amount.currency().clone(),
            description,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Record a completed withdrawal from an account (no destination).
    pub fn withdrawal(source: AccountId, amount: &Money, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_account_id: Some(source),
            destination_account_id: None,
            amount: amount.amount(),
            currency: amount.currency().clone(),
            description,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }
}
