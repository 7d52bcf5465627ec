//! PostgreSQL store integration tests
//!
//! Exercise the sqlx-backed store against a live database. Ignored by
//! default; run with a migrated database and
//! `DATABASE_URL=... cargo test -- --ignored`.

use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use bank_ledger::{
    AccountFactory, LedgerError, LedgerSession, OpenAccountCommand, PgLedgerStore,
    TransferCommand, TransferEngine, UnitOfWork, UserDirectory,
};

/// Connect and seed a fresh user for the test run.
async fn setup() -> (PgPool, Uuid) {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, username) VALUES ($1, $2)")
        .bind(user_id)
        .bind(format!("test_user_{user_id}"))
        .execute(&pool)
        .await
        .expect("Failed to seed user");

    (pool, user_id)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a migrated database"]
async fn pg_user_directory_lookup() {
    let (pool, user_id) = setup().await;
    let store = PgLedgerStore::new(pool);

    assert!(store.user_exists(user_id).await.unwrap());
    assert!(!store.user_exists(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a migrated database"]
async fn pg_open_deposit_and_transfer() {
    let (pool, user_id) = setup().await;
    let store = PgLedgerStore::new(pool);
    let factory = AccountFactory::new(store.clone(), store.clone());
    let engine = TransferEngine::new(store.clone());

    let x = factory
        .open(
            OpenAccountCommand::new(user_id, "X".to_string(), "checking".to_string())
                .with_initial_deposit(dec!(100.00)),
        )
        .await
        .unwrap();
    let y = factory
        .open(OpenAccountCommand::new(
            user_id,
            "Y".to_string(),
            "savings".to_string(),
        ))
        .await
        .unwrap();

    engine
        .transfer(TransferCommand::new(
            x.account_id,
            y.iban.as_str().to_string(),
            dec!(40.00),
            "EUR".to_string(),
        ))
        .await
        .unwrap();

    let mut session = store.begin().await.unwrap();
    let x_row = session.find_account(x.account_id).await.unwrap().unwrap();
    let y_row = session.find_account(y.account_id).await.unwrap().unwrap();
    assert_eq!(x_row.balance().amount(), dec!(60.00));
    assert_eq!(y_row.balance().amount(), dec!(40.00));
    session.rollback().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a migrated database"]
async fn pg_failed_transfer_rolls_back() {
    let (pool, user_id) = setup().await;
    let store = PgLedgerStore::new(pool);
    let factory = AccountFactory::new(store.clone(), store.clone());
    let engine = TransferEngine::new(store.clone());

    let x = factory
        .open(
            OpenAccountCommand::new(user_id, "X".to_string(), "checking".to_string())
                .with_initial_deposit(dec!(10.00)),
        )
        .await
        .unwrap();
    let y = factory
        .open(OpenAccountCommand::new(
            user_id,
            "Y".to_string(),
            "checking".to_string(),
        ))
        .await
        .unwrap();

    let result = engine
        .transfer(TransferCommand::new(
            x.account_id,
            y.iban.as_str().to_string(),
            dec!(50.00),
            "EUR".to_string(),
        ))
        .await;
    assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));

    let mut session = store.begin().await.unwrap();
    let x_row = session.find_account(x.account_id).await.unwrap().unwrap();
    assert_eq!(x_row.balance().amount(), dec!(10.00));
    session.rollback().await.unwrap();
}
