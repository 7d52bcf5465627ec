//! Store module
//!
//! Persistence boundary for the ledger. The engine talks to storage only
//! through the [`UnitOfWork`]/[`LedgerSession`] traits so that the transfer
//! protocol is expressed independently of the storage technology. All
//! reads and writes between `begin` and `commit` form one atomic unit;
//! anything not committed is discarded.

mod memory;
mod postgres;

pub use memory::{MemoryLedgerStore, MemorySession};
pub use postgres::{PgLedgerStore, PgSession};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, AccountId, Iban, TransactionRecord};

/// Store-layer faults.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored state is corrupt: {0}")]
    Corrupt(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Factory for atomic ledger sessions.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Session: LedgerSession;

    /// Open a new unit of work.
    async fn begin(&self) -> Result<Self::Session, StoreError>;
}

/// One atomic unit of work over accounts and the transaction log.
///
/// Implementations must guarantee that a session's writes become visible
/// only on `commit`, and that accounts read during the session cannot have
/// their balances concurrently driven negative by another session (row
/// locking or serializable isolation).
#[async_trait]
pub trait LedgerSession: Send {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_iban(&mut self, iban: &Iban) -> Result<Option<Account>, StoreError>;

    /// Persist the account's current state (insert or update).
    async fn save_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Append a ledger entry.
    async fn insert_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError>;

    /// Make all writes of this session visible atomically.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discard all writes of this session. Dropping a session without
    /// committing has the same effect.
    async fn rollback(self) -> Result<(), StoreError>;
}

/// User-existence lookup, consumed during account creation.
///
/// Users live in the collaborating application; the ledger only checks
/// that the owner of a new account exists.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError>;
}
