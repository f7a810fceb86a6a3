//! Duplicate detection.

use crate::error::StoreError;
use crate::providers::{RegistrationStore, bounded};
use crate::types::IdentityKey;
use std::sync::Arc;
use std::time::Duration;

/// Fast-path check for an already registered identity key.
///
/// A negative answer is advisory: two submissions can both pass the check,
/// and [`RegistrationStore::insert_if_absent`] decides which one is stored.
pub struct DuplicateChecker<S> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S> Clone for DuplicateChecker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: RegistrationStore> DuplicateChecker<S> {
    /// Create a checker whose lookups are bounded by `timeout`.
    #[must_use]
    pub const fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Whether a record with this identity key is already stored.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Database`] on I/O fault
    /// - [`StoreError::Timeout`] when the lookup exceeds the timeout
    pub async fn is_duplicate(&self, key: &IdentityKey<'_>) -> Result<bool, StoreError> {
        let existing = bounded(self.timeout, self.store.lookup(key)).await?;
        Ok(existing.is_some())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use crate::mocks::InMemoryRegistrationStore;
    use crate::types::NewRegistration;
    use inscriptions_core::environment::Clock;
    use inscriptions_testing::test_clock;

    fn alice() -> NewRegistration {
        NewRegistration {
            first_name: "Alice".to_string(),
            age: 30,
            phone: "0600000000".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_detects_stored_key() {
        let store = Arc::new(InMemoryRegistrationStore::new());
        let checker = DuplicateChecker::new(Arc::clone(&store), Duration::from_secs(1));
        let record = alice();

        assert!(!checker.is_duplicate(&record.identity_key()).await.unwrap());

        store.insert(&record, test_clock().now()).await.unwrap();
        assert!(checker.is_duplicate(&record.identity_key()).await.unwrap());
    }

    #[tokio::test]
    async fn test_key_is_case_sensitive() {
        let store = Arc::new(InMemoryRegistrationStore::new());
        let checker = DuplicateChecker::new(Arc::clone(&store), Duration::from_secs(1));
        store.insert(&alice(), test_clock().now()).await.unwrap();

        let mut shouted = alice();
        shouted.first_name = "ALICE".to_string();
        assert!(!checker.is_duplicate(&shouted.identity_key()).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_fault_propagates() {
        let store = Arc::new(InMemoryRegistrationStore::new());
        store.fail_with(StoreError::Database("disk I/O error".to_string()));
        let checker = DuplicateChecker::new(store, Duration::from_secs(1));

        let result = checker.is_duplicate(&alice().identity_key()).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let store = Arc::new(InMemoryRegistrationStore::new().with_delay(Duration::from_secs(5)));
        let limit = Duration::from_millis(20);
        let checker = DuplicateChecker::new(store, limit);

        let result = checker.is_duplicate(&alice().identity_key()).await;
        assert_eq!(result, Err(StoreError::Timeout(limit)));
    }
}
