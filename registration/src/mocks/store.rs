//! In-memory registration store for testing.

use crate::error::StoreError;
use crate::providers::{InsertOutcome, RegistrationStore};
use crate::types::{IdentityKey, NewRegistration, Registration};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug)]
struct StoreState {
    records: Vec<Registration>,
    next_id: i64,
    failure: Option<StoreError>,
    insert_attempts: usize,
    lookups: usize,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            failure: None,
            insert_attempts: 0,
            lookups: 0,
        }
    }
}

/// Mutex-guarded registration store.
///
/// Same uniqueness and id semantics as the SQLite store. Every operation can
/// be made to fail with [`InMemoryRegistrationStore::fail_with`] or to wait
/// with [`InMemoryRegistrationStore::with_delay`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistrationStore {
    state: Arc<Mutex<StoreState>>,
    delay: Option<Duration>,
    ack_delay: Option<Duration>,
}

fn lock_failed() -> StoreError {
    StoreError::Database("Mutex lock failed".to_string())
}

impl InMemoryRegistrationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `delay` before every operation.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Commit `insert_if_absent` at once but wait `delay` before answering.
    #[must_use]
    pub const fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = Some(delay);
        self
    }

    /// Make every following operation fail with `error`.
    pub fn fail_with(&self, error: StoreError) {
        self.lock().failure = Some(error);
    }

    /// Stored records in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<Registration> {
        self.lock().records.clone()
    }

    /// Number of `insert`/`insert_if_absent` calls received.
    #[must_use]
    pub fn insert_attempts(&self) -> usize {
        self.lock().insert_attempts
    }

    /// Number of `lookup` calls received.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lock().lookups
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl StoreState {
    fn check(&self) -> Result<(), StoreError> {
        self.failure.clone().map_or(Ok(()), Err)
    }

    fn contains(&self, first_name: &str, email: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.first_name == first_name && r.email == email)
    }

    fn push(&mut self, record: &NewRegistration, created_at: DateTime<Utc>) -> Registration {
        let registration = Registration::from_new(self.next_id, record, created_at);
        self.next_id += 1;
        self.records.push(registration.clone());
        registration
    }
}

impl RegistrationStore for InMemoryRegistrationStore {
    fn insert(
        &self,
        record: &NewRegistration,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send {
        let state = Arc::clone(&self.state);
        let delay = self.delay;
        let record = record.clone();

        async move {
            state.lock().map_err(|_| lock_failed())?.insert_attempts += 1;
            Self::pause(delay).await;

            let mut guard = state.lock().map_err(|_| lock_failed())?;
            guard.check()?;
            if guard.contains(&record.first_name, &record.email) {
                return Err(StoreError::Conflict);
            }
            Ok(guard.push(&record, created_at).id)
        }
    }

    fn insert_if_absent(
        &self,
        record: &NewRegistration,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<InsertOutcome, StoreError>> + Send {
        let state = Arc::clone(&self.state);
        let delay = self.delay;
        let ack_delay = self.ack_delay;
        let record = record.clone();

        async move {
            state.lock().map_err(|_| lock_failed())?.insert_attempts += 1;
            Self::pause(delay).await;

            let outcome = {
                let mut guard = state.lock().map_err(|_| lock_failed())?;
                guard.check()?;
                if guard.contains(&record.first_name, &record.email) {
                    InsertOutcome::Duplicate
                } else {
                    InsertOutcome::Inserted(guard.push(&record, created_at))
                }
            };

            Self::pause(ack_delay).await;
            Ok(outcome)
        }
    }

    fn lookup(
        &self,
        key: &IdentityKey<'_>,
    ) -> impl Future<Output = Result<Option<Registration>, StoreError>> + Send {
        let state = Arc::clone(&self.state);
        let delay = self.delay;
        let first_name = key.first_name.to_string();
        let email = key.email.to_string();

        async move {
            state.lock().map_err(|_| lock_failed())?.lookups += 1;
            Self::pause(delay).await;

            let guard = state.lock().map_err(|_| lock_failed())?;
            guard.check()?;
            Ok(guard
                .records
                .iter()
                .find(|r| r.first_name == first_name && r.email == email)
                .cloned())
        }
    }

    fn read_all(&self) -> impl Future<Output = Result<Vec<Registration>, StoreError>> + Send {
        let state = Arc::clone(&self.state);
        let delay = self.delay;

        async move {
            Self::pause(delay).await;

            let guard = state.lock().map_err(|_| lock_failed())?;
            guard.check()?;
            Ok(guard.records.clone())
        }
    }

    fn delete_all(&self) -> impl Future<Output = Result<u64, StoreError>> + Send {
        let state = Arc::clone(&self.state);
        let delay = self.delay;

        async move {
            Self::pause(delay).await;

            let mut guard = state.lock().map_err(|_| lock_failed())?;
            guard.check()?;
            let deleted = u64::try_from(guard.records.len()).unwrap_or(u64::MAX);
            guard.records.clear();
            guard.next_id = 1;
            Ok(deleted)
        }
    }

    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        let state = Arc::clone(&self.state);

        async move { state.lock().map_err(|_| lock_failed())?.check() }
    }
}
