//! Account Factory
//!
//! Creation flow for new accounts: validate the owning user, pick the
//! account type, allocate a fresh unique IBAN and persist the account,
//! optionally crediting an initial deposit before first persistence. The
//! initial deposit is the single place a credit runs outside the transfer
//! engine, since there is no source account to debit.

use rust_decimal::Decimal;

use crate::domain::{Account, AccountType, Currency, Iban, Money, TransactionRecord};
use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerSession, UnitOfWork, UserDirectory};

use super::{OpenAccountCommand, OpenAccountResult};

const DEFAULT_COUNTRY: &str = "DE";
const DEFAULT_BANK_CODE: &str = "37040044";
const DEFAULT_CURRENCY: &str = "EUR";

/// Collisions are astronomically unlikely with a 10-digit random account
/// number, but allocation is still bounded.
const MAX_IBAN_ATTEMPTS: u32 = 5;

/// Builds and persists new accounts.
pub struct AccountFactory<U: UnitOfWork, D: UserDirectory> {
    store: U,
    users: D,
    country: String,
    bank_code: String,
    default_currency: Currency,
}

impl<U: UnitOfWork, D: UserDirectory> AccountFactory<U, D> {
    pub fn new(store: U, users: D) -> Self {
        Self {
            store,
            users,
            country: DEFAULT_COUNTRY.to_string(),
            bank_code: DEFAULT_BANK_CODE.to_string(),
            default_currency: Currency::new(DEFAULT_CURRENCY)
                .expect("Invalid DEFAULT_CURRENCY constant"),
        }
    }

    /// Override the IBAN country and bank code prefix.
    pub fn with_bank(mut self, country: String, bank_code: String) -> Self {
        self.country = country;
        self.bank_code = bank_code;
        self
    }

    /// Override the currency used when a command doesn't name one.
    pub fn with_default_currency(mut self, currency: Currency) -> Self {
        self.default_currency = currency;
        self
    }

    /// Open a new account and return its identifier and IBAN.
    pub async fn open(&self, command: OpenAccountCommand) -> LedgerResult<OpenAccountResult> {
        if !self.users.user_exists(command.user_id).await? {
            return Err(LedgerError::UserNotFound(command.user_id));
        }

        let account_type: AccountType = command
            .account_type
            .parse()
            .map_err(|_| LedgerError::InvalidAccountType(command.account_type.clone()))?;

        let currency = match &command.currency {
            Some(code) => Currency::new(code).map_err(crate::domain::DomainError::from)?,
            None => self.default_currency.clone(),
        };

        let initial_deposit = match command.initial_deposit {
            Some(amount) if !amount.is_zero() => {
                if amount < Decimal::ZERO {
                    return Err(LedgerError::InvalidAmount(format!(
                        "initial deposit must not be negative (got {amount})"
                    )));
                }
                Some(
                    Money::new(amount, currency.clone())
                        .map_err(|e| LedgerError::InvalidAmount(e.to_string()))?,
                )
            }
            _ => None,
        };

        let mut session = self.store.begin().await?;
        let outcome = self
            .build_account(&mut session, &command, account_type, currency, initial_deposit)
            .await;

        match outcome {
            Ok(result) => {
                session.commit().await?;
                tracing::info!(
                    account = %result.account_id,
                    iban = %result.iban,
                    account_type = %account_type,
                    "account opened"
                );
                Ok(result)
            }
            Err(e) => {
                super::transfer::rollback_session(session).await;
                Err(e)
            }
        }
    }

    async fn build_account<S: LedgerSession>(
        &self,
        session: &mut S,
        command: &OpenAccountCommand,
        account_type: AccountType,
        currency: Currency,
        initial_deposit: Option<Money>,
    ) -> LedgerResult<OpenAccountResult> {
        let iban = self.allocate_iban(session).await?;

        let mut account = Account::open(
            command.user_id,
            iban.clone(),
            command.name.clone(),
            account_type,
            currency,
        );

        if let Some(deposit) = &initial_deposit {
            account.credit(deposit)?;
        }

        // The account row must exist before any ledger entry references it.
        session.save_account(&account).await?;

        if let Some(deposit) = initial_deposit {
            let record = TransactionRecord::deposit(
                account.id(),
                &deposit,
                "Initial deposit".to_string(),
            );
            session.insert_transaction(&record).await?;
        }

        Ok(OpenAccountResult {
            account_id: account.id(),
            iban,
        })
    }

    /// Generate an IBAN no other account holds yet.
    async fn allocate_iban<S: LedgerSession>(&self, session: &mut S) -> LedgerResult<Iban> {
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_IBAN_ATTEMPTS {
            let candidate = Iban::generate(&self.country, &self.bank_code, &mut rng)?;
            if session.find_account_by_iban(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            tracing::warn!(iban = %candidate, "generated IBAN already taken, retrying");
        }
        Err(LedgerError::IbanAllocationFailed)
    }
}
