//! Intake reducer.
//!
//! Pure state transitions; every I/O step is returned as an effect whose
//! result comes back as the next action. Actions that do not fit the current
//! phase are dropped with a warning.

use crate::duplicates::DuplicateChecker;
use crate::error::{MailError, Recipient, Rejection, StoreError};
use crate::intake::actions::IntakeAction;
use crate::intake::environment::IntakeEnvironment;
use crate::intake::state::{IntakeState, Phase};
use crate::providers::{InsertOutcome, Mailer, RegistrationStore, bounded};
use crate::types::NewRegistration;
use crate::validation::validate;
use chrono::{DateTime, Utc};
use inscriptions_core::effect::Effect;
use inscriptions_core::reducer::Reducer;
use inscriptions_core::{SmallVec, async_effect, smallvec};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Drives one submission from `Submit` to `Completed` or `Rejected`.
pub struct IntakeReducer<S, M> {
    _phantom: PhantomData<fn() -> (S, M)>,
}

impl<S, M> IntakeReducer<S, M> {
    /// Create a new intake reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S, M> Default for IntakeReducer<S, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, M> Clone for IntakeReducer<S, M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<S, M> Reducer for IntakeReducer<S, M>
where
    S: RegistrationStore + 'static,
    M: Mailer + 'static,
{
    type State = IntakeState;
    type Action = IntakeAction;
    type Environment = IntakeEnvironment<S, M>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match (state.phase.clone(), action) {
            // ═══════════════════════════════════════════════════════════════
            // Submit: validate, then dedupe and store
            // ═══════════════════════════════════════════════════════════════
            (Phase::Received, IntakeAction::Submit { form }) => match validate(&form) {
                Ok(record) => {
                    debug!(first_name = %record.first_name, email = %record.email, "Submission validated");
                    state.phase = Phase::Validated;
                    state.candidate = Some(record.clone());

                    let store = Arc::clone(&env.store);
                    let duplicates = env.duplicates.clone();
                    let created_at = env.clock.now();
                    let timeout = env.store_timeout;

                    smallvec![async_effect! {
                        Some(persist(&*store, &duplicates, record, created_at, timeout).await)
                    }]
                }
                Err(validation) => {
                    info!(field = validation.field, problem = ?validation.problem, "Submission rejected");
                    smallvec![async_effect! {
                        Some(IntakeAction::Rejected {
                            rejection: Rejection::Validation(validation),
                        })
                    }]
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // Persisted: confirmation email
            // ═══════════════════════════════════════════════════════════════
            (Phase::Validated, IntakeAction::Persisted { registration }) => {
                info!(
                    id = registration.id,
                    first_name = %registration.first_name,
                    email = %registration.email,
                    "Registration stored"
                );
                state.phase = Phase::Persisted;
                state.registration = Some(registration.clone());

                let dispatcher = env.dispatcher.clone();
                smallvec![async_effect! {
                    Some(notified(
                        dispatcher.send_confirmation(&registration).await,
                        IntakeAction::UserNotified,
                    ))
                }]
            }

            // ═══════════════════════════════════════════════════════════════
            // UserNotified: administrator email
            // ═══════════════════════════════════════════════════════════════
            (Phase::Persisted, IntakeAction::UserNotified) => {
                state.phase = Phase::NotifiedUser;
                let Some(registration) = state.registration.clone() else {
                    error!("UserNotified without a stored registration");
                    return smallvec![Effect::None];
                };

                let dispatcher = env.dispatcher.clone();
                smallvec![async_effect! {
                    Some(notified(
                        dispatcher.send_admin_notification(&registration).await,
                        IntakeAction::AdminNotified,
                    ))
                }]
            }

            // ═══════════════════════════════════════════════════════════════
            // AdminNotified / Completed: finish
            // ═══════════════════════════════════════════════════════════════
            (Phase::NotifiedUser, IntakeAction::AdminNotified) => {
                state.phase = Phase::NotifiedAdmin;
                let Some(registration) = state.registration.clone() else {
                    error!("AdminNotified without a stored registration");
                    return smallvec![Effect::None];
                };

                smallvec![async_effect! {
                    Some(IntakeAction::Completed { registration })
                }]
            }

            (Phase::NotifiedAdmin, IntakeAction::Completed { registration }) => {
                info!(
                    id = registration.id,
                    first_name = %registration.first_name,
                    email = %registration.email,
                    "Registration completed"
                );
                state.phase = Phase::Completed;
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // Rejected: only from the phase that can produce it
            // ═══════════════════════════════════════════════════════════════
            (phase, IntakeAction::Rejected { rejection }) if rejected_from(&phase, &rejection) => {
                log_rejection(state, &rejection);
                state.phase = Phase::Rejected(rejection);
                smallvec![Effect::None]
            }

            (phase, action) => {
                warn!(phase = ?phase, action = action.name(), "Action ignored in this phase");
                smallvec![Effect::None]
            }
        }
    }
}

/// Dedupe, then insert atomically.
async fn persist<S: RegistrationStore>(
    store: &S,
    duplicates: &DuplicateChecker<S>,
    record: NewRegistration,
    created_at: DateTime<Utc>,
    timeout: Duration,
) -> IntakeAction {
    let rejected = |rejection| IntakeAction::Rejected { rejection };

    match duplicates.is_duplicate(&record.identity_key()).await {
        Ok(true) => return rejected(Rejection::Duplicate),
        Ok(false) => {}
        Err(e) => return rejected(Rejection::Store(e)),
    }

    match bounded(timeout, store.insert_if_absent(&record, created_at)).await {
        Ok(InsertOutcome::Inserted(registration)) => IntakeAction::Persisted { registration },
        Ok(InsertOutcome::Duplicate) | Err(StoreError::Conflict) => {
            rejected(Rejection::Duplicate)
        }
        Err(StoreError::Timeout(limit)) => {
            recover_timed_out_insert(store, &record, created_at, limit).await
        }
        Err(e) => rejected(Rejection::Store(e)),
    }
}

/// An insert that timed out may still have committed: look the key up once.
///
/// Our own row (same `created_at`) means the insert went through. Any other
/// row under the key is a duplicate. No row keeps the timeout.
async fn recover_timed_out_insert<S: RegistrationStore>(
    store: &S,
    record: &NewRegistration,
    created_at: DateTime<Utc>,
    limit: Duration,
) -> IntakeAction {
    let timed_out = || IntakeAction::Rejected {
        rejection: Rejection::Store(StoreError::Timeout(limit)),
    };

    match bounded(limit, store.lookup(&record.identity_key())).await {
        Ok(Some(registration)) if registration.created_at == created_at => {
            warn!(id = registration.id, "Insert timed out after committing");
            IntakeAction::Persisted { registration }
        }
        Ok(Some(_)) => IntakeAction::Rejected {
            rejection: Rejection::Duplicate,
        },
        Ok(None) => timed_out(),
        Err(e) => {
            warn!(error = %e, "Lookup after insert timeout failed");
            timed_out()
        }
    }
}

fn notified(result: Result<(), MailError>, next: IntakeAction) -> IntakeAction {
    match result {
        Ok(()) => next,
        Err(e) => IntakeAction::Rejected {
            rejection: Rejection::Mail(e),
        },
    }
}

/// Whether `phase` is the step that emits this kind of rejection.
const fn rejected_from(phase: &Phase, rejection: &Rejection) -> bool {
    match rejection {
        Rejection::Validation(_) => matches!(phase, Phase::Received),
        Rejection::Duplicate | Rejection::Store(_) => matches!(phase, Phase::Validated),
        Rejection::Mail(MailError {
            recipient: Recipient::User,
            ..
        }) => matches!(phase, Phase::Persisted),
        Rejection::Mail(MailError {
            recipient: Recipient::Admin,
            ..
        }) => matches!(phase, Phase::NotifiedUser),
    }
}

fn log_rejection(state: &IntakeState, rejection: &Rejection) {
    let (first_name, email) = state
        .candidate
        .as_ref()
        .map_or(("", ""), |c| (c.first_name.as_str(), c.email.as_str()));

    match rejection {
        Rejection::Validation(_) => {}
        Rejection::Duplicate => {
            info!(first_name, email, "Duplicate registration");
        }
        Rejection::Store(e) => {
            error!(step = "persist", first_name, email, error = %e, "Store failure");
        }
        Rejection::Mail(e) => {
            // The record stays stored; nothing is rolled back
            let id = state.registration.as_ref().map(|r| r.id);
            error!(
                step = e.recipient.as_str(),
                id,
                first_name,
                email,
                error = %e,
                "Notification failure"
            );
        }
    }
}
