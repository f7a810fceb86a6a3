//! # Inscriptions Runtime
//!
//! Runtime for reducers written against `inscriptions-core`.
//!
//! This crate provides the [`Store`] that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Holds the state and runs the reducer under a write lock
//! - **Effect Executor**: Spawns effect futures and feeds produced actions back to the reducer
//! - **Action Broadcast**: Every action produced by an effect is broadcast, which is what
//!   request-response callers wait on ([`Store::send_and_wait_for`])
//!
//! ## Example
//!
//! ```ignore
//! use inscriptions_runtime::Store;
//!
//! let store = Store::new(IntakeState::default(), IntakeReducer::new(), environment);
//!
//! let outcome = store
//!     .send_and_wait_for(IntakeAction::Submit { form }, IntakeAction::is_terminal, deadline)
//!     .await?;
//! ```

use inscriptions_core::{effect::Effect, reducer::Reducer};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors returned while waiting on a [`crate::Store`]
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Health check status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,

    /// Component is not operational
    Unhealthy,
}

impl HealthStatus {
    /// Get the worst status between two statuses
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Healthy, Self::Healthy) => Self::Healthy,
            _ => Self::Unhealthy,
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Name of the component being checked
    pub component: String,

    /// Current health status
    pub status: HealthStatus,

    /// Optional message providing details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    /// Create a healthy check result
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    /// Create an unhealthy check result
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Aggregated health report
///
/// Combines multiple health checks into an overall system status.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall system status (worst of all checks)
    pub status: HealthStatus,

    /// Individual component checks
    pub checks: Vec<HealthCheck>,

    /// Timestamp when report was generated
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    /// Create a new health report from checks
    #[must_use]
    pub fn new(checks: Vec<HealthCheck>) -> Self {
        let status = checks
            .iter()
            .map(|c| c.status)
            .fold(HealthStatus::Healthy, HealthStatus::worst);

        Self {
            status,
            checks,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{Arc, Duration, Effect, Reducer, RwLock, StoreError};
    use tokio::sync::broadcast;

    /// Capacity of the action broadcast channel
    const BROADCAST_CAPACITY: usize = 16;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, written once per action)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        /// Every action produced by an effect is sent here before it is
        /// fed back into the reducer.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (action_broadcast, _) = broadcast::channel(BROADCAST_CAPACITY);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Spawns the returned effects
        ///
        /// Returns after starting effect execution, not completion.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A)
        where
            R: Clone,
            E: Clone,
        {
            metrics::counter!("store.commands.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect);
            }
        }

        /// Send an action and wait for a matching result action
        ///
        /// Designed for request-response callers (HTTP handlers). Subscribes to
        /// the action broadcast *before* sending so no produced action is missed,
        /// then returns the first produced action matching `predicate`.
        ///
        /// Only actions produced by effects are broadcast, never the initial action.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // A dropped terminal action is caught by the timeout
                            tracing::warn!(skipped, "Action observer lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        }
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Spawn an effect and feed its action back into the store
        ///
        /// A panicking effect is isolated in its spawned task.
        fn execute_effect(&self, effect: Effect<A>)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                    let store = self.clone();
                    tokio::spawn(async move {
                        if let Some(action) = fut.await {
                            let _ = store.action_broadcast.send(action.clone());
                            store.send(action).await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;
