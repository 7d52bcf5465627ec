//! Transfer Engine
//!
//! Orchestrates money movements as single atomic units of work. The
//! protocol is strict and sequential: validate, load source, load
//! destination, check sufficiency, debit then credit, persist both
//! accounts, append the ledger entry, commit. Any failure before commit
//! rolls the unit of work back; no partial state is ever persisted and
//! nothing is retried here (retry policy belongs to the caller).

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    AccountId, Currency, DomainError, Iban, Money, TransactionRecord,
};
use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerSession, UnitOfWork};

use super::{TransferCommand, TransferReceipt};

/// Engine executing atomic transfers, deposits and withdrawals.
pub struct TransferEngine<U: UnitOfWork> {
    store: U,
}

impl<U: UnitOfWork> TransferEngine<U> {
    pub fn new(store: U) -> Self {
        Self { store }
    }

    /// Transfer money from a source account to a destination IBAN.
    ///
    /// Runs entirely inside one unit of work; on success returns the
    /// identifier of the recorded `completed` transaction.
    pub async fn transfer(&self, command: TransferCommand) -> LedgerResult<TransferReceipt> {
        let amount = parse_amount(command.amount, &command.currency)?;
        let destination_iban = Iban::parse(&command.destination_iban)?;
        let description = command
            .description
            .unwrap_or_else(|| "Transfer".to_string());

        let mut session = self.store.begin().await?;
        let outcome = execute_transfer(
            &mut session,
            command.source_account_id,
            &destination_iban,
            &amount,
            description,
        )
        .await;

        match outcome {
            Ok(transaction_id) => {
                session.commit().await?;
                tracing::info!(
                    %transaction_id,
                    source = %command.source_account_id,
                    destination = %destination_iban,
                    %amount,
                    "transfer committed"
                );
                Ok(TransferReceipt { transaction_id })
            }
            Err(e) => {
                rollback_session(session).await;
                tracing::debug!(source = %command.source_account_id, error = %e, "transfer rolled back");
                Err(e)
            }
        }
    }

    /// Credit an account from outside the ledger (cash deposit, incoming
    /// external payment). Recorded as a transaction without a source.
    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        currency: &str,
        description: Option<String>,
    ) -> LedgerResult<TransferReceipt> {
        let amount = parse_amount(amount, currency)?;
        let description = description.unwrap_or_else(|| "Deposit".to_string());

        let mut session = self.store.begin().await?;
        let outcome = async {
            let mut account = session
                .find_account(account_id)
                .await?
                .ok_or(LedgerError::AccountNotFound(account_id))?;
            if !account.is_active() {
                return Err(LedgerError::DestinationAccountInactive);
            }
            account.credit(&amount)?;
            session.save_account(&account).await?;

            let record = TransactionRecord::deposit(account_id, &amount, description);
            session.insert_transaction(&record).await?;
            Ok(record.id)
        }
        .await;

        match outcome {
            Ok(transaction_id) => {
                session.commit().await?;
                tracing::info!(%transaction_id, account = %account_id, %amount, "deposit committed");
                Ok(TransferReceipt { transaction_id })
            }
            Err(e) => {
                rollback_session(session).await;
                Err(e)
            }
        }
    }

    /// Debit an account towards outside the ledger (cash withdrawal,
    /// outgoing external payment). Recorded as a transaction without a
    /// destination.
    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount: Decimal,
        currency: &str,
        description: Option<String>,
    ) -> LedgerResult<TransferReceipt> {
        let amount = parse_amount(amount, currency)?;
        let description = description.unwrap_or_else(|| "Withdrawal".to_string());

        let mut session = self.store.begin().await?;
        let outcome = async {
            let mut account = session
                .find_account(account_id)
                .await?
                .ok_or(LedgerError::AccountNotFound(account_id))?;
            if !account.is_active() {
                return Err(LedgerError::SourceAccountInactive);
            }
            account.debit(&amount).map_err(map_debit_error)?;
            session.save_account(&account).await?;

            let record = TransactionRecord::withdrawal(account_id, &amount, description);
            session.insert_transaction(&record).await?;
            Ok(record.id)
        }
        .await;

        match outcome {
            Ok(transaction_id) => {
                session.commit().await?;
                tracing::info!(%transaction_id, account = %account_id, %amount, "withdrawal committed");
                Ok(TransferReceipt { transaction_id })
            }
            Err(e) => {
                rollback_session(session).await;
                Err(e)
            }
        }
    }

    /// Deactivate an account once its balance is zero. The row stays in
    /// the store; removal, if any, is the collaborating application's call.
    pub async fn close_account(&self, account_id: AccountId) -> LedgerResult<()> {
        let mut session = self.store.begin().await?;
        let outcome = async {
            let mut account = session
                .find_account(account_id)
                .await?
                .ok_or(LedgerError::AccountNotFound(account_id))?;
            account.deactivate()?;
            session.save_account(&account).await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                session.commit().await?;
                tracing::info!(account = %account_id, "account closed");
                Ok(())
            }
            Err(e) => {
                rollback_session(session).await;
                Err(e)
            }
        }
    }
}

/// Roll back a failed unit of work. A failing rollback is logged but never
/// replaces the error that doomed the session; the store discards the
/// session's writes either way.
pub(super) async fn rollback_session<S: LedgerSession>(session: S) {
    if let Err(e) = session.rollback().await {
        tracing::warn!(error = %e, "rollback failed");
    }
}

/// Steps 2-9 of the transfer protocol, inside an open unit of work.
async fn execute_transfer<S: LedgerSession>(
    session: &mut S,
    source_id: AccountId,
    destination_iban: &Iban,
    amount: &Money,
    description: String,
) -> LedgerResult<Uuid> {
    let mut source = session
        .find_account(source_id)
        .await?
        .ok_or(LedgerError::SourceAccountNotFound(source_id))?;
    if !source.is_active() {
        return Err(LedgerError::SourceAccountInactive);
    }

    let mut destination = session
        .find_account_by_iban(destination_iban)
        .await?
        .ok_or_else(|| LedgerError::DestinationAccountNotFound(destination_iban.to_string()))?;
    if !destination.is_active() {
        return Err(LedgerError::DestinationAccountInactive);
    }

    if source.id() == destination.id() {
        return Err(LedgerError::SameAccountTransfer);
    }

    // Advisory check; `debit` below remains the authoritative one. A
    // currency mismatch falls through so the debit reports it as such
    // instead of masking it as insufficiency.
    if let Ok(false) = source.balance().greater_or_equal(amount) {
        return Err(LedgerError::InsufficientFunds {
            required: amount.amount(),
            available: source.balance().amount(),
        });
    }

    // Debit before credit: a failed debit must never leave an orphaned
    // credit, and the error surface of a doomed transfer stays stable.
    source.debit(amount).map_err(map_debit_error)?;
    destination.credit(amount)?;

    session.save_account(&source).await?;
    session.save_account(&destination).await?;

    let record = TransactionRecord::transfer(source.id(), destination.id(), amount, description);
    session.insert_transaction(&record).await?;

    Ok(record.id)
}

/// Validate amount and currency inputs (step 1 of the protocol).
fn parse_amount(amount: Decimal, currency: &str) -> LedgerResult<Money> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be strictly positive (got {amount})"
        )));
    }
    let currency = Currency::new(currency).map_err(DomainError::from)?;
    Money::new(amount, currency)
        .map_err(|e| LedgerError::InvalidAmount(e.to_string()))
}

/// The insufficiency raised by `Account::debit` is surfaced to callers as
/// the single user-facing `InsufficientFunds` kind.
fn map_debit_error(e: DomainError) -> LedgerError {
    match e {
        DomainError::InsufficientFunds {
            required,
            available,
        } => LedgerError::InsufficientFunds {
            required,
            available,
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedgerStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_transfer_rejects_non_positive_amount() {
        let engine = TransferEngine::new(MemoryLedgerStore::new());
        for amount in [dec!(0), dec!(-5)] {
            let cmd = TransferCommand::new(
                AccountId::new(),
                "DE89370400440532013000".to_string(),
                amount,
                "EUR".to_string(),
            );
            assert!(matches!(
                engine.transfer(cmd).await,
                Err(LedgerError::InvalidAmount(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_transfer_rejects_malformed_iban() {
        let engine = TransferEngine::new(MemoryLedgerStore::new());
        let cmd = TransferCommand::new(
            AccountId::new(),
            "not-an-iban".to_string(),
            dec!(10),
            "EUR".to_string(),
        );
        assert!(matches!(
            engine.transfer(cmd).await,
            Err(LedgerError::InvalidIban(_))
        ));
    }

    #[tokio::test]
    async fn test_transfer_rejects_unknown_currency_code() {
        let engine = TransferEngine::new(MemoryLedgerStore::new());
        let cmd = TransferCommand::new(
            AccountId::new(),
            "DE89370400440532013000".to_string(),
            dec!(10),
            "EURO".to_string(),
        );
        assert!(matches!(
            engine.transfer(cmd).await,
            Err(LedgerError::Domain(_))
        ));
    }
}
