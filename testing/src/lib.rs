//! # Inscriptions Testing
//!
//! Testing utilities for reducers built on `inscriptions-core`.
//!
//! This crate provides:
//! - A deterministic [`Clock`] implementation
//! - The [`ReducerTest`] Given-When-Then harness
//! - Helpers that drive effect futures by hand
//!
//! ## Example
//!
//! ```ignore
//! use inscriptions_testing::{ReducerTest, helpers::collect_actions};
//!
//! #[tokio::test]
//! async fn submit_validates_and_persists() {
//!     let (state, effects) = ReducerTest::new(IntakeReducer::new())
//!         .with_env(test_environment())
//!         .given_state(IntakeState::default())
//!         .when_action(IntakeAction::Submit { form })
//!         .execute();
//!
//!     let produced = collect_actions(effects).await;
//!     assert!(matches!(produced[..], [IntakeAction::Persisted { .. }]));
//! }
//! ```

use chrono::{DateTime, Utc};
use inscriptions_core::environment::Clock;

mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use inscriptions_testing::mocks::FixedClock;
    /// use inscriptions_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use inscriptions_core::effect::Effect;

    /// Await every effect in order and collect the actions they produce.
    ///
    /// Mirrors what the runtime would feed back into the reducer, without
    /// feeding anything back.
    pub async fn collect_actions<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut produced = Vec::new();
        for effect in effects {
            if let Some(action) = effect.run().await {
                produced.push(action);
            }
        }
        produced
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
