//! Registration router composition.

use crate::handlers::{readiness, submit_registration};
use crate::intake::IntakeEnvironment;
use crate::providers::{Mailer, RegistrationStore};
use axum::Router;
use axum::routing::{get, post};
use inscriptions_web::correlation_id_layer;
use inscriptions_web::handlers::health_check;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Shared handler state.
pub struct RegistrationState<S, M> {
    /// Providers handed to every per-request store
    pub environment: IntakeEnvironment<S, M>,
    /// How long a submission may take end to end
    pub workflow_deadline: Duration,
}

impl<S, M> Clone for RegistrationState<S, M> {
    fn clone(&self) -> Self {
        Self {
            environment: self.environment.clone(),
            workflow_deadline: self.workflow_deadline,
        }
    }
}

impl<S: RegistrationStore, M: Mailer> RegistrationState<S, M> {
    /// State whose deadline is derived from the environment's step limits.
    #[must_use]
    pub fn new(environment: IntakeEnvironment<S, M>) -> Self {
        let workflow_deadline = environment.workflow_deadline();
        Self {
            environment,
            workflow_deadline,
        }
    }
}

/// Create the registration router.
///
/// # Routes
///
/// - `POST /api/inscriptions` - Submit a registration
/// - `GET /health` - Liveness
/// - `GET /ready` - Readiness (store round trip)
///
/// Every response carries an `X-Correlation-ID` header.
///
/// # Example
///
/// ```rust,ignore
/// let app = registration_router(RegistrationState::new(environment));
/// axum::serve(listener, app).await?;
/// ```
pub fn registration_router<S, M>(state: RegistrationState<S, M>) -> Router
where
    S: RegistrationStore + 'static,
    M: Mailer + 'static,
{
    Router::new()
        .route("/api/inscriptions", post(submit_registration::<S, M>))
        .route("/ready", get(readiness::<S, M>))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}
