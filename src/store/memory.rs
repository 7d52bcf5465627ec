//! In-memory store
//!
//! A unit-of-work implementation backed by a shared map, with real
//! commit/rollback semantics: sessions stage their writes and publish them
//! atomically on commit. Used by the engine's integration tests and useful
//! for embedding the ledger without a database. A fault-injection hook
//! lets tests exercise the rollback path of persistence failures.

use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::domain::{Account, AccountId, Iban, TransactionRecord};

use super::{LedgerSession, StoreError, UnitOfWork, UserDirectory};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    transactions: Vec<TransactionRecord>,
    users: HashSet<Uuid>,
    fail_next_save: bool,
    fail_next_rollback: bool,
}

/// Shared in-memory ledger store.
///
/// Units of work are fully serialized through an async lock, matching the
/// isolation the Postgres store gets from row locking: a session only ever
/// observes committed state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
    session_lock: Arc<tokio::sync::Mutex<()>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user for `UserDirectory` lookups.
    pub fn add_user(&self, user_id: Uuid) {
        self.lock().users.insert(user_id);
    }

    /// Seed an account directly, bypassing the factory.
    pub fn seed_account(&self, account: Account) {
        self.lock().accounts.insert(account.id(), account);
    }

    /// Snapshot of a persisted account, if any.
    pub fn account(&self, id: AccountId) -> Option<Account> {
        self.lock().accounts.get(&id).cloned()
    }

    /// Snapshot of the whole transaction log.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.lock().transactions.clone()
    }

    /// Make the next `save_account` in any session fail, simulating a
    /// storage fault at the persistence step.
    pub fn fail_next_save(&self) {
        self.lock().fail_next_save = true;
    }

    /// Make the next `rollback` fail, simulating a storage fault while
    /// abandoning a session.
    pub fn fail_next_rollback(&self) {
        self.lock().fail_next_rollback = true;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl UnitOfWork for MemoryLedgerStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession, StoreError> {
        let guard = Arc::clone(&self.session_lock).lock_owned().await;
        Ok(MemorySession {
            state: Arc::clone(&self.state),
            staged_accounts: HashMap::new(),
            staged_transactions: Vec::new(),
            _guard: guard,
        })
    }
}

#[async_trait]
impl UserDirectory for MemoryLedgerStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock().users.contains(&user_id))
    }
}

/// Staged-write session; nothing is visible to other sessions until commit.
/// Holds the store-wide session lock for its whole lifetime.
pub struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
    staged_accounts: HashMap<AccountId, Account>,
    staged_transactions: Vec<TransactionRecord>,
    _guard: OwnedMutexGuard<()>,
}

impl MemorySession {
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl LedgerSession for MemorySession {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        if let Some(staged) = self.staged_accounts.get(&id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    async fn find_account_by_iban(&mut self, iban: &Iban) -> Result<Option<Account>, StoreError> {
        if let Some(staged) = self
            .staged_accounts
            .values()
            .find(|account| account.iban() == iban)
        {
            return Ok(Some(staged.clone()));
        }
        Ok(self
            .lock()?
            .accounts
            .values()
            .find(|account| account.iban() == iban)
            .cloned())
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), StoreError> {
        {
            let mut state = self.lock()?;
            if state.fail_next_save {
                state.fail_next_save = false;
                return Err(StoreError::Unavailable("injected save failure".into()));
            }
        }
        self.staged_accounts.insert(account.id(), account.clone());
        Ok(())
    }

    /// Rejects entries referencing accounts the session cannot see,
    /// matching the foreign keys of the SQL schema.
    async fn insert_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        for endpoint in [record.source_account_id, record.destination_account_id]
            .into_iter()
            .flatten()
        {
            if !self.staged_accounts.contains_key(&endpoint)
                && !self.lock()?.accounts.contains_key(&endpoint)
            {
                return Err(StoreError::Corrupt(format!(
                    "transaction references unknown account {endpoint}"
                )));
            }
        }
        self.staged_transactions.push(record.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        for (id, account) in self.staged_accounts {
            state.accounts.insert(id, account);
        }
        state.transactions.extend(self.staged_transactions);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        if state.fail_next_rollback {
            state.fail_next_rollback = false;
            return Err(StoreError::Unavailable("injected rollback failure".into()));
        }
        // staged writes are simply dropped
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountType, Currency, Money};
    use rust_decimal_macros::dec;

    fn account() -> Account {
        Account::open(
            Uuid::new_v4(),
            Iban::parse("DE89370400440532013000").unwrap(),
            "Test".to_string(),
            AccountType::Checking,
            Currency::new("EUR").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_uncommitted_session_leaves_store_unchanged() {
        let store = MemoryLedgerStore::new();
        let account = account();
        let id = account.id();

        let mut session = store.begin().await.unwrap();
        session.save_account(&account).await.unwrap();
        assert!(store.account(id).is_none());

        session.rollback().await.unwrap();
        assert!(store.account(id).is_none());
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_writes() {
        let store = MemoryLedgerStore::new();
        let account = account();
        let id = account.id();

        let mut session = store.begin().await.unwrap();
        session.save_account(&account).await.unwrap();
        session.commit().await.unwrap();

        assert_eq!(store.account(id).unwrap().id(), id);
    }

    #[tokio::test]
    async fn test_session_reads_its_own_writes() {
        let store = MemoryLedgerStore::new();
        let mut account = account();
        let id = account.id();
        store.seed_account(account.clone());

        let mut session = store.begin().await.unwrap();
        account
            .credit(&Money::new(dec!(10), Currency::new("EUR").unwrap()).unwrap())
            .unwrap();
        session.save_account(&account).await.unwrap();

        let reread = session.find_account(id).await.unwrap().unwrap();
        assert_eq!(reread.balance().amount(), dec!(10.00));
        // persisted state still untouched
        assert!(store.account(id).unwrap().balance().is_zero());
    }

    #[tokio::test]
    async fn test_transaction_must_reference_a_visible_account() {
        let store = MemoryLedgerStore::new();
        let account = account();
        let amount = Money::new(dec!(10), Currency::new("EUR").unwrap()).unwrap();
        let record =
            TransactionRecord::deposit(account.id(), &amount, "Initial deposit".to_string());

        let mut session = store.begin().await.unwrap();
        assert!(matches!(
            session.insert_transaction(&record).await,
            Err(StoreError::Corrupt(_))
        ));

        // staged accounts count as visible
        session.save_account(&account).await.unwrap();
        assert!(session.insert_transaction(&record).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_next_save_fires_once() {
        let store = MemoryLedgerStore::new();
        store.fail_next_save();

        let mut session = store.begin().await.unwrap();
        let account = account();
        assert!(matches!(
            session.save_account(&account).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(session.save_account(&account).await.is_ok());
    }
}
