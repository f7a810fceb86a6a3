//! Event registration intake.
//!
//! Accepts a registration form over HTTP, validates it, rejects duplicates,
//! stores it in `SQLite` and sends two plain-text emails: a confirmation to
//! the registrant, then a notification to the administrator.
//!
//! # Architecture
//!
//! ```text
//! POST /api/inscriptions
//!        │
//!        ▼
//! submit_registration ──► Store<IntakeReducer> ──► effects
//!                                                  ├─ DuplicateChecker ─┐
//!                                                  ├─ RegistrationStore ◄┘
//!                                                  └─ NotificationDispatcher ─► Mailer
//! ```
//!
//! Providers are traits ([`providers`]); the server wires in
//! [`stores::SqliteRegistrationStore`] and [`providers::SmtpMailer`], tests
//! use [`mocks`].

pub mod dispatcher;
pub mod duplicates;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod metrics;
pub mod providers;
pub mod router;
pub mod stores;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use dispatcher::NotificationDispatcher;
pub use duplicates::DuplicateChecker;
pub use error::{MailError, Recipient, Rejection, StoreError, ValidationError};
pub use intake::{IntakeAction, IntakeEnvironment, IntakeReducer, IntakeState, Phase};
pub use router::{RegistrationState, registration_router};
pub use types::{IdentityKey, NewRegistration, Registration, SubmissionForm};
pub use validation::validate;
