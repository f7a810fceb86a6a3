//! Registration store trait.

use crate::error::StoreError;
use crate::types::{IdentityKey, NewRegistration, Registration};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

/// Result of an atomic insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was stored
    Inserted(Registration),
    /// A record with the same identity key already exists; nothing was written
    Duplicate,
}

/// Durable collection of registrations.
///
/// Implementations enforce uniqueness of `(first_name, email)` and assign
/// ids that increase with insertion order.
pub trait RegistrationStore: Send + Sync {
    /// Append a registration and return its id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Conflict`] if the identity key is already taken
    /// - [`StoreError::Database`] on any engine fault
    fn insert(
        &self,
        record: &NewRegistration,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Insert unless the identity key is taken, as one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on any engine fault.
    fn insert_if_absent(
        &self,
        record: &NewRegistration,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<InsertOutcome, StoreError>> + Send;

    /// Find the registration with this identity key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on any engine fault.
    fn lookup(
        &self,
        key: &IdentityKey<'_>,
    ) -> impl Future<Output = Result<Option<Registration>, StoreError>> + Send;

    /// All registrations in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on any engine fault.
    fn read_all(&self) -> impl Future<Output = Result<Vec<Registration>, StoreError>> + Send;

    /// Remove every registration and restart id assignment.
    ///
    /// Returns the number of removed rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on any engine fault.
    fn delete_all(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Cheap round trip used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the store is unreachable.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Run a store operation with a time limit.
///
/// # Errors
///
/// Returns the operation's own error, or [`StoreError::Timeout`] once `limit`
/// has elapsed. The operation is dropped on timeout.
pub async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}
