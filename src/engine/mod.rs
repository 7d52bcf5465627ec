//! Engine module
//!
//! The two public operations of the ledger core: account creation
//! (AccountFactory) and atomic money movement (TransferEngine).

mod commands;
mod factory;
mod transfer;

pub use commands::{OpenAccountCommand, OpenAccountResult, TransferCommand, TransferReceipt};
pub use factory::AccountFactory;
pub use transfer::TransferEngine;
