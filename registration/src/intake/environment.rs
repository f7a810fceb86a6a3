//! Intake environment.

use crate::dispatcher::NotificationDispatcher;
use crate::duplicates::DuplicateChecker;
use crate::providers::{Mailer, RegistrationStore};
use inscriptions_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Extra time granted to the whole workflow beyond its step limits.
const DEADLINE_SLACK: Duration = Duration::from_secs(1);

/// Dependencies of the intake reducer.
///
/// Cheap to clone: every provider sits behind an `Arc`.
pub struct IntakeEnvironment<S, M> {
    /// Registration store
    pub store: Arc<S>,
    /// Email sender
    pub dispatcher: NotificationDispatcher<M>,
    /// Fast-path duplicate check over the same store
    pub duplicates: DuplicateChecker<S>,
    /// Source of `created_at`
    pub clock: Arc<dyn Clock>,
    /// Limit for each store call
    pub store_timeout: Duration,
}

impl<S, M> Clone for IntakeEnvironment<S, M> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: self.dispatcher.clone(),
            duplicates: self.duplicates.clone(),
            clock: Arc::clone(&self.clock),
            store_timeout: self.store_timeout,
        }
    }
}

impl<S: RegistrationStore, M: Mailer> IntakeEnvironment<S, M> {
    /// Wire the environment; the duplicate checker shares `store`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        dispatcher: NotificationDispatcher<M>,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            duplicates: DuplicateChecker::new(Arc::clone(&store), store_timeout),
            store,
            dispatcher,
            clock,
            store_timeout,
        }
    }

    /// Upper bound for one submission: the duplicate check, the insert and
    /// its re-check, two sends, plus slack.
    #[must_use]
    pub fn workflow_deadline(&self) -> Duration {
        self.store_timeout * 3 + self.dispatcher.send_timeout() * 2 + DEADLINE_SLACK
    }
}
