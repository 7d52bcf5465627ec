//! Domain module
//!
//! Core domain types and business logic.

pub mod account;
pub mod error;
pub mod iban;
pub mod money;
pub mod transaction;

pub use account::{Account, AccountId, AccountType};
pub use error::DomainError;
pub use iban::{Iban, IbanError};
pub use money::{Currency, Money, MoneyError};
pub use transaction::{TransactionRecord, TransactionStatus};
