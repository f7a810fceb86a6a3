//! Registration HTTP handlers.

use crate::error::{MISSING_FIELDS_MESSAGE, WORKFLOW_DEADLINE_MESSAGE};
use crate::intake::{IntakeAction, IntakeReducer, IntakeState};
use crate::metrics::{
    OUTCOME_COMPLETED, OUTCOME_DEADLINE, OUTCOME_INTERNAL, OUTCOME_MALFORMED, record_submission,
};
use crate::providers::{Mailer, RegistrationStore, bounded};
use crate::router::RegistrationState;
use crate::types::SubmissionForm;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use inscriptions_runtime::{HealthCheck, HealthReport, Store, StoreError};
use inscriptions_web::handlers::readiness_response;
use inscriptions_web::{AppError, CorrelationId};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Client message for a completed registration.
pub const SUCCESS_MESSAGE: &str = "Inscription enregistrée et emails envoyés !";

/// Success body.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    /// Confirmation message
    pub message: String,
}

/// Register for the event.
///
/// # Endpoint
///
/// ```text
/// POST /api/inscriptions
/// Content-Type: application/json
///
/// { "firstName": "Alice", "age": 30, "phone": "0600000000", "email": "alice@example.com" }
/// ```
///
/// # Response
///
/// ```json
/// { "message": "Inscription enregistrée et emails envoyés !" }
/// ```
///
/// # Flow
///
/// 1. Parse the body (any parse failure is a missing-fields 400)
/// 2. Run the intake workflow on a fresh `Store`
/// 3. Wait for `Completed` or `Rejected`, bounded by the workflow deadline
/// 4. Map the terminal action to a response
///
/// # Errors
///
/// Returns an [`AppError`] carrying the rejection's status and message.
#[tracing::instrument(skip_all, fields(correlation_id = %correlation_id))]
pub async fn submit_registration<S, M>(
    State(state): State<RegistrationState<S, M>>,
    correlation_id: CorrelationId,
    body: Result<Json<SubmissionForm>, JsonRejection>,
) -> Result<Json<SubmissionResponse>, AppError>
where
    S: RegistrationStore + 'static,
    M: Mailer + 'static,
{
    let Json(form) = body.map_err(|rejection| {
        debug!(error = %rejection, "Unreadable submission body");
        record_submission(OUTCOME_MALFORMED);
        AppError::new(StatusCode::BAD_REQUEST, "MISSING_FIELDS", MISSING_FIELDS_MESSAGE)
    })?;

    let store = Store::new(
        IntakeState::default(),
        IntakeReducer::<S, M>::new(),
        state.environment.clone(),
    );

    let terminal = store
        .send_and_wait_for(
            IntakeAction::Submit { form },
            IntakeAction::is_terminal,
            state.workflow_deadline,
        )
        .await
        .map_err(|e| workflow_failure(e, state.workflow_deadline))?;

    match terminal {
        IntakeAction::Completed { .. } => {
            record_submission(OUTCOME_COMPLETED);
            Ok(Json(SubmissionResponse {
                message: SUCCESS_MESSAGE.to_string(),
            }))
        }
        IntakeAction::Rejected { rejection } => {
            record_submission(rejection.outcome());
            Err(rejection.into())
        }
        other => {
            record_submission(OUTCOME_INTERNAL);
            Err(AppError::internal(format!(
                "Unexpected action received: {}",
                other.name()
            )))
        }
    }
}

/// Map a failed wait on the intake store to a response.
///
/// Only a missed deadline is reported as `WORKFLOW_TIMEOUT`.
fn workflow_failure(error: StoreError, deadline: Duration) -> AppError {
    match error {
        StoreError::Timeout => {
            error!(deadline = ?deadline, "Intake workflow did not finish");
            record_submission(OUTCOME_DEADLINE);
            AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "WORKFLOW_TIMEOUT",
                WORKFLOW_DEADLINE_MESSAGE,
            )
            .with_source(anyhow::Error::new(error))
        }
        StoreError::ChannelClosed => {
            record_submission(OUTCOME_INTERNAL);
            AppError::internal(WORKFLOW_DEADLINE_MESSAGE).with_source(anyhow::Error::new(error))
        }
    }
}

/// Readiness probe: round trip to the registration store.
///
/// ```text
/// GET /ready
/// 200 {"status":"healthy","checks":[{"component":"database","status":"healthy"}],...}
/// 503 when the store does not answer
/// ```
pub async fn readiness<S, M>(
    State(state): State<RegistrationState<S, M>>,
) -> (StatusCode, Json<HealthReport>)
where
    S: RegistrationStore + 'static,
    M: Mailer + 'static,
{
    let env = &state.environment;
    let check = match bounded(env.store_timeout, env.store.ping()).await {
        Ok(()) => HealthCheck::healthy("database"),
        Err(e) => HealthCheck::unhealthy("database", e.to_string()),
    };

    readiness_response(HealthReport::new(vec![check]))
}
