//! Integration tests for the SQLite registration store.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use axum::http::StatusCode;
use axum_test::TestServer;
use inscriptions_core::environment::Clock;
use inscriptions_registration::mocks::MockMailer;
use inscriptions_registration::providers::{InsertOutcome, RegistrationStore};
use inscriptions_registration::stores::{SqliteRegistrationStore, StoreConfig};
use inscriptions_registration::{
    IntakeEnvironment, NewRegistration, NotificationDispatcher, RegistrationState, StoreError,
    registration_router,
};
use inscriptions_testing::test_clock;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Table written by the first version of the service.
const LEGACY_SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS inscriptions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        age INTEGER NOT NULL,
        phone TEXT NOT NULL,
        email TEXT NOT NULL
    )
";

fn config_in(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        url: format!("sqlite://{}", dir.path().join("inscriptions.db").display()),
        max_connections: 4,
        operation_timeout: Duration::from_secs(5),
    }
}

async fn raw_pool(dir: &TempDir) -> SqlitePool {
    let options = SqliteConnectOptions::from_str(&config_in(dir).url)
        .unwrap()
        .create_if_missing(true);
    SqlitePool::connect_with(options).await.unwrap()
}

async fn seed(dir: &TempDir, schema: &str, rows: &[(&str, &str)]) {
    let pool = raw_pool(dir).await;
    sqlx::query(schema).execute(&pool).await.unwrap();

    for (first_name, email) in rows {
        sqlx::query(
            "INSERT INTO inscriptions (first_name, age, phone, email) \
             VALUES (?, 30, '0600000000', ?)",
        )
        .bind(first_name)
        .bind(email)
        .execute(&pool)
        .await
        .unwrap();
    }

    pool.close().await;
}

fn registration(first_name: &str, email: &str) -> NewRegistration {
    NewRegistration {
        first_name: first_name.to_string(),
        age: 30,
        phone: "0600000000".to_string(),
        email: email.to_string(),
    }
}

#[tokio::test]
async fn test_open_creates_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inscriptions.db");
    assert!(!path.exists());

    let store = SqliteRegistrationStore::open(&config_in(&dir)).await.unwrap();
    store.ping().await.unwrap();

    assert!(path.exists());
    store.close().await;
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);

    let store = SqliteRegistrationStore::open(&config).await.unwrap();
    store
        .insert(&registration("Alice", "alice@example.com"), test_clock().now())
        .await
        .unwrap();
    store
        .insert(&registration("Bob", "bob@example.com"), test_clock().now())
        .await
        .unwrap();
    store.close().await;

    let reopened = SqliteRegistrationStore::open(&config).await.unwrap();
    let all = reopened.read_all().await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all[0].first_name, "Alice");
    assert_eq!(all[1].first_name, "Bob");
    assert_eq!(all[0].created_at, test_clock().now());

    // The constraint survives the reopen too
    let again = reopened
        .insert_if_absent(&registration("Alice", "alice@example.com"), test_clock().now())
        .await
        .unwrap();
    assert_eq!(again, InsertOutcome::Duplicate);
    reopened.close().await;
}

#[tokio::test]
async fn test_open_upgrades_legacy_table() {
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        LEGACY_SCHEMA,
        &[("Alice", "alice@example.com"), ("Bob", "bob@example.com")],
    )
    .await;

    let store = SqliteRegistrationStore::open(&config_in(&dir)).await.unwrap();

    let all = store.read_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].first_name, "Alice");
    assert_eq!(all[0].created_at, chrono::DateTime::from_timestamp(0, 0).unwrap());

    let again = store
        .insert_if_absent(&registration("Alice", "alice@example.com"), test_clock().now())
        .await
        .unwrap();
    assert_eq!(again, InsertOutcome::Duplicate);

    let carol = store
        .insert_if_absent(&registration("Carol", "carol@example.com"), test_clock().now())
        .await
        .unwrap();
    assert!(matches!(carol, InsertOutcome::Inserted(ref r) if r.id == 3));
    store.close().await;

    // A second open finds nothing left to upgrade
    let reopened = SqliteRegistrationStore::open(&config_in(&dir)).await.unwrap();
    assert_eq!(reopened.read_all().await.unwrap().len(), 3);
    reopened.close().await;
}

#[tokio::test]
async fn test_open_rejects_legacy_duplicates() {
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        LEGACY_SCHEMA,
        &[("Alice", "alice@example.com"), ("Alice", "alice@example.com")],
    )
    .await;

    let result = SqliteRegistrationStore::open(&config_in(&dir)).await;
    assert!(matches!(result, Err(StoreError::Schema(_))));

    // The failed upgrade is rolled back
    let pool = raw_pool(&dir).await;
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('inscriptions')")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert!(!columns.iter().any(|c| c == "created_at"));
    pool.close().await;
}

#[tokio::test]
async fn test_open_rejects_unrelated_table() {
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        "CREATE TABLE inscriptions (id INTEGER PRIMARY KEY, name TEXT)",
        &[],
    )
    .await;

    let result = SqliteRegistrationStore::open(&config_in(&dir)).await;
    assert!(matches!(result, Err(StoreError::Schema(ref m)) if m.contains("first_name")));
}

#[tokio::test]
async fn test_delete_all_then_insert() {
    let dir = TempDir::new().unwrap();
    let store = SqliteRegistrationStore::open(&config_in(&dir)).await.unwrap();

    for i in 0..3 {
        store
            .insert(
                &registration("Alice", &format!("alice{i}@example.com")),
                test_clock().now(),
            )
            .await
            .unwrap();
    }

    assert_eq!(store.delete_all().await.unwrap(), 3);
    assert!(store.read_all().await.unwrap().is_empty());

    let id = store
        .insert(&registration("Alice", "alice0@example.com"), test_clock().now())
        .await
        .unwrap();
    assert_eq!(id, 1);
    store.close().await;
}

#[tokio::test]
async fn test_concurrent_insert_if_absent_stores_one() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteRegistrationStore::open(&config_in(&dir)).await.unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .insert_if_absent(
                        &registration("Alice", "alice@example.com"),
                        test_clock().now(),
                    )
                    .await
            })
        })
        .collect();

    let mut inserted = 0;
    for handle in handles {
        if let InsertOutcome::Inserted(_) = handle.await.unwrap().unwrap() {
            inserted += 1;
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(store.read_all().await.unwrap().len(), 1);
    store.close().await;
}

#[tokio::test]
async fn test_http_flow_against_sqlite() {
    let store = Arc::new(SqliteRegistrationStore::in_memory().await.unwrap());
    let mailer = Arc::new(MockMailer::new());
    let env = IntakeEnvironment::new(
        Arc::clone(&store),
        NotificationDispatcher::new(
            Arc::clone(&mailer),
            "admin@example.com",
            Duration::from_secs(1),
        ),
        Arc::new(test_clock()),
        Duration::from_secs(1),
    );
    let server = TestServer::new(registration_router(RegistrationState::new(env))).unwrap();
    let body = json!({
        "firstName": "Alice",
        "age": "30",
        "phone": "0600000000",
        "email": "alice@example.com",
    });

    server.post("/api/inscriptions").json(&body).await.assert_status_ok();
    server
        .post("/api/inscriptions")
        .json(&body)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let all = store.read_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].age, 30);
    assert_eq!(mailer.sent().len(), 2);

    server.get("/ready").await.assert_status_ok();
}
