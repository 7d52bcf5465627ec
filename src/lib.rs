//! bank_ledger
//!
//! Account ledger and money-transfer engine. Represents monetary balances,
//! enforces their invariants and executes transfers between accounts as
//! atomic units of work. The surrounding application (HTTP controllers,
//! authentication, UI) calls in through [`engine::AccountFactory`] and
//! [`engine::TransferEngine`]; nothing here depends on those layers.

pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod store;

mod error;

pub use config::Config;
pub use error::{LedgerError, LedgerResult};

pub use domain::{Account, AccountId, AccountType, Currency, DomainError, Iban, Money, MoneyError};
pub use domain::{TransactionRecord, TransactionStatus};
pub use engine::{
    AccountFactory, OpenAccountCommand, OpenAccountResult, TransferCommand, TransferEngine,
    TransferReceipt,
};
pub use store::{
    LedgerSession, MemoryLedgerStore, PgLedgerStore, StoreError, UnitOfWork, UserDirectory,
};

/// Initialize tracing/logging for embedding binaries and tests.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bank_ledger=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
