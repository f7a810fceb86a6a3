//! SQLite registration store.
//!
//! All statements go through runtime-checked `sqlx::query` so the crate
//! builds without a live database. The `(first_name, email)` uniqueness is a
//! table constraint; [`RegistrationStore::insert_if_absent`] relies on it to
//! stay atomic under concurrent submissions.
//!
//! Opening a database written by an earlier version of the service upgrades
//! its table in place: `created_at` is added and the identity key gets a
//! unique index.

use crate::error::StoreError;
use crate::providers::{InsertOutcome, RegistrationStore};
use crate::types::{IdentityKey, NewRegistration, Registration};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS inscriptions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        age INTEGER NOT NULL,
        phone TEXT NOT NULL,
        email TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE(first_name, email)
    )
";

/// Columns every version of the table has had.
const BASE_COLUMNS: [&str; 5] = ["id", "first_name", "age", "phone", "email"];

/// `created_at` of rows written before the column existed.
const LEGACY_CREATED_AT: &str = "1970-01-01T00:00:00+00:00";

const IDENTITY_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS inscriptions_identity \
                              ON inscriptions (first_name, email)";

/// Connection settings for [`SqliteRegistrationStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database URL (e.g. `sqlite://inscriptions.db`)
    pub url: String,
    /// Pool size
    pub max_connections: u32,
    /// Upper bound for acquiring a connection and for each store call
    pub operation_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://inscriptions.db".to_string(),
            max_connections: 5,
            operation_timeout: Duration::from_secs(5),
        }
    }
}

/// SQLite-backed [`RegistrationStore`].
#[derive(Debug, Clone)]
pub struct SqliteRegistrationStore {
    pool: SqlitePool,
}

impl SqliteRegistrationStore {
    /// Open (or create) the database and run the schema migration.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Database`] if the URL is invalid, the file cannot be
    ///   opened or the migration fails
    /// - [`StoreError::Schema`] if an existing table is missing a base column
    ///   or holds the same `(first_name, email)` twice
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(database)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.operation_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.operation_timeout)
            .connect_with(options)
            .await
            .map_err(database)?;

        let store = Self { pool };
        store.migrate().await?;

        info!("Registration store ready");
        Ok(store)
    }

    /// Private in-memory database (for testing).
    ///
    /// The pool holds a single connection that never expires, so the data
    /// lives as long as the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if `SQLite` cannot be initialised.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(database)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(database)?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create the table, or upgrade one left by an earlier version.
    ///
    /// Runs in one transaction; a table that cannot be upgraded is left as it
    /// was and `open` fails with [`StoreError::Schema`].
    async fn migrate(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(database)?;

        sqlx::query(SCHEMA)
            .execute(&mut *tx)
            .await
            .map_err(database)?;

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('inscriptions')")
                .fetch_all(&mut *tx)
                .await
                .map_err(database)?;
        let has_column = |name: &str| columns.iter().any(|c| c == name);

        if let Some(missing) = BASE_COLUMNS.iter().find(|&&c| !has_column(c)) {
            return Err(StoreError::Schema(format!("missing column {missing}")));
        }

        if !has_column("created_at") {
            let add_column = format!(
                "ALTER TABLE inscriptions \
                 ADD COLUMN created_at TEXT NOT NULL DEFAULT '{LEGACY_CREATED_AT}'"
            );
            sqlx::query(&add_column)
                .execute(&mut *tx)
                .await
                .map_err(database)?;
            info!("Added created_at to the registration table");
        }

        if !has_identity_index(&mut tx).await? {
            let repeated: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM (SELECT 1 FROM inscriptions \
                 GROUP BY first_name, email HAVING COUNT(*) > 1)",
            )
            .fetch_one(&mut *tx)
            .await
            .map_err(database)?;

            if repeated > 0 {
                return Err(StoreError::Schema(format!(
                    "{repeated} (first_name, email) pairs are registered more than once"
                )));
            }

            sqlx::query(IDENTITY_INDEX)
                .execute(&mut *tx)
                .await
                .map_err(database)?;
            info!("Added the (first_name, email) unique index");
        }

        tx.commit().await.map_err(database)
    }
}

impl RegistrationStore for SqliteRegistrationStore {
    #[instrument(skip(self, record), fields(first_name = %record.first_name, email = %record.email))]
    async fn insert(
        &self,
        record: &NewRegistration,
        created_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO inscriptions (first_name, age, phone, email, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.first_name)
        .bind(i64::from(record.age))
        .bind(&record.phone)
        .bind(&record.email)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            other => database(other),
        })?;

        Ok(result.last_insert_rowid())
    }

    #[instrument(skip(self, record), fields(first_name = %record.first_name, email = %record.email))]
    async fn insert_if_absent(
        &self,
        record: &NewRegistration,
        created_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError> {
        let row: Option<RegistrationRow> = sqlx::query_as(
            "INSERT INTO inscriptions (first_name, age, phone, email, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(first_name, email) DO NOTHING \
             RETURNING id, first_name, age, phone, email, created_at",
        )
        .bind(&record.first_name)
        .bind(i64::from(record.age))
        .bind(&record.phone)
        .bind(&record.email)
        .bind(created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        match row {
            Some(row) => Ok(InsertOutcome::Inserted(row.into_registration()?)),
            None => Ok(InsertOutcome::Duplicate),
        }
    }

    #[instrument(skip(self), fields(first_name = %key.first_name, email = %key.email))]
    async fn lookup(&self, key: &IdentityKey<'_>) -> Result<Option<Registration>, StoreError> {
        let row: Option<RegistrationRow> = sqlx::query_as(
            "SELECT id, first_name, age, phone, email, created_at \
             FROM inscriptions WHERE first_name = ? AND email = ?",
        )
        .bind(key.first_name)
        .bind(key.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        row.map(RegistrationRow::into_registration).transpose()
    }

    #[instrument(skip(self))]
    async fn read_all(&self) -> Result<Vec<Registration>, StoreError> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(
            "SELECT id, first_name, age, phone, email, created_at \
             FROM inscriptions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database)?;

        rows.into_iter()
            .map(RegistrationRow::into_registration)
            .collect()
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(database)?;

        let deleted = sqlx::query("DELETE FROM inscriptions")
            .execute(&mut *tx)
            .await
            .map_err(database)?
            .rows_affected();

        // Dropping the table also drops its AUTOINCREMENT counter
        sqlx::query("DROP TABLE inscriptions")
            .execute(&mut *tx)
            .await
            .map_err(database)?;
        sqlx::query(SCHEMA)
            .execute(&mut *tx)
            .await
            .map_err(database)?;

        tx.commit().await.map_err(database)?;

        info!(deleted, "Registrations cleared");
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(database)?;
        Ok(())
    }
}

/// Whether a unique index covers exactly `(first_name, email)`.
///
/// The table constraint of [`SCHEMA`] shows up here as an automatic index.
async fn has_identity_index(conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let unique: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM pragma_index_list('inscriptions') WHERE \"unique\" = 1",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(database)?;

    for index in unique {
        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_index_info(?) ORDER BY seqno")
                .bind(&index)
                .fetch_all(&mut *conn)
                .await
                .map_err(database)?;

        if columns == ["first_name", "email"] {
            return Ok(true);
        }
    }

    Ok(false)
}

fn database(error: sqlx::Error) -> StoreError {
    StoreError::Database(error.to_string())
}

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: i64,
    first_name: String,
    age: i64,
    phone: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl RegistrationRow {
    fn into_registration(self) -> Result<Registration, StoreError> {
        let age = u32::try_from(self.age)
            .map_err(|_| StoreError::Database(format!("age out of range: {}", self.age)))?;

        Ok(Registration {
            id: self.id,
            first_name: self.first_name,
            age,
            phone: self.phone,
            email: self.email,
            created_at: self.created_at,
        })
    }
}
