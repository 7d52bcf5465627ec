//! PostgreSQL store
//!
//! sqlx-backed implementation of the unit-of-work boundary. Each session
//! wraps one database transaction; account loads take row locks
//! (`FOR UPDATE`) so concurrent transfers over the same accounts serialize
//! and the non-negative-balance invariant holds under concurrency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::{Account, AccountId, AccountType, Currency, Iban, Money, TransactionRecord};

use super::{LedgerSession, StoreError, UnitOfWork, UserDirectory};

const SELECT_ACCOUNT: &str = r#"
    SELECT id, user_id, iban, name, account_type, balance, currency,
           interest_rate, is_active, created_at
    FROM accounts
"#;

/// Ledger store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UnitOfWork for PgLedgerStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgSession { tx })
    }
}

#[async_trait]
impl UserDirectory for PgLedgerStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

/// One database transaction's worth of ledger work.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerSession for PgSession {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let query = format!("{SELECT_ACCOUNT} WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(account_from_row).transpose()
    }

    async fn find_account_by_iban(&mut self, iban: &Iban) -> Result<Option<Account>, StoreError> {
        let query = format!("{SELECT_ACCOUNT} WHERE iban = $1 FOR UPDATE");
        let row = sqlx::query(&query)
            .bind(iban.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(account_from_row).transpose()
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), StoreError> {
        // IBAN, type and currency are immutable after creation, so the
        // update arm only touches mutable columns.
        sqlx::query(
            r#"
            INSERT INTO accounts
                (id, user_id, iban, name, account_type, balance, currency,
                 interest_rate, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                balance = EXCLUDED.balance,
                interest_rate = EXCLUDED.interest_rate,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(account.id().as_uuid())
        .bind(account.user_id())
        .bind(account.iban().as_str())
        .bind(account.name())
        .bind(account.account_type().as_str())
        .bind(account.balance().amount())
        .bind(account.balance().currency().code())
        .bind(account.interest_rate())
        .bind(account.is_active())
        .bind(account.created_at())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, source_account_id, destination_account_id, amount,
                 currency, description, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.source_account_id.map(|id| id.as_uuid()))
        .bind(record.destination_account_id.map(|id| id.as_uuid()))
        .bind(record.amount)
        .bind(record.currency.code())
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Decode an account row, mapping invalid stored labels to `Corrupt`.
fn account_from_row(row: PgRow) -> Result<Account, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let user_id: Uuid = row.try_get("user_id")?;
    let iban: String = row.try_get("iban")?;
    let name: String = row.try_get("name")?;
    let account_type: String = row.try_get("account_type")?;
    let balance: Decimal = row.try_get("balance")?;
    let currency: String = row.try_get("currency")?;
    let interest_rate: Option<Decimal> = row.try_get("interest_rate")?;
    let is_active: bool = row.try_get("is_active")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    let iban = Iban::parse(&iban)
        .map_err(|e| StoreError::Corrupt(format!("account {id} iban: {e}")))?;
    let account_type: AccountType = account_type
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("account {id} type: {e}")))?;
    let currency = Currency::new(&currency)
        .map_err(|e| StoreError::Corrupt(format!("account {id} currency: {e}")))?;
    let balance = Money::new(balance, currency)
        .map_err(|e| StoreError::Corrupt(format!("account {id} balance: {e}")))?;

    Ok(Account::from_parts(
        AccountId::from(id),
        user_id,
        iban,
        name,
        account_type,
        balance,
        interest_rate,
        is_active,
        created_at,
    ))
}
