//! Error types for the registration workflow.
//!
//! Every error is `Clone` so it can travel inside an [`crate::intake::IntakeAction`].

use axum::http::StatusCode;
use inscriptions_web::AppError;
use std::time::Duration;
use thiserror::Error;

/// Client message for a missing field or an unreadable body.
pub const MISSING_FIELDS_MESSAGE: &str = "Tous les champs sont obligatoires.";
/// Client message for a duplicate identity key.
pub const DUPLICATE_MESSAGE: &str = "Une inscription avec ce prénom et cet email existe déjà.";
/// Client message for a storage fault.
pub const STORE_MESSAGE: &str = "Erreur lors de l’enregistrement en base.";
/// Client message for a failed confirmation email.
pub const USER_MAIL_MESSAGE: &str = "Erreur lors de l’envoi de l’email de confirmation.";
/// Client message for a failed administrator email.
pub const ADMIN_MAIL_MESSAGE: &str = "Erreur lors de l’envoi de l’email administrateur.";
/// Client message for a confirmation email that timed out.
pub const USER_MAIL_TIMEOUT_MESSAGE: &str =
    "Délai dépassé lors de l’envoi de l’email de confirmation.";
/// Client message for an administrator email that timed out.
pub const ADMIN_MAIL_TIMEOUT_MESSAGE: &str =
    "Délai dépassé lors de l’envoi de l’email administrateur.";
/// Client message when the workflow never reaches a terminal action.
pub const WORKFLOW_DEADLINE_MESSAGE: &str =
    "Erreur interne lors du traitement de l’inscription.";

// ═══════════════════════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════════════════════

/// What is wrong with a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    /// Absent, null or falsy
    Missing,
    /// Present but unusable (e.g. a negative age)
    Invalid,
}

/// A submission field failed validation.
///
/// `field` names the first offending field, in form order.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{problem:?} field: {field}")]
pub struct ValidationError {
    /// Wire name of the field (`firstName`, `age`, `phone`, `email`)
    pub field: &'static str,
    /// Why it was rejected
    pub problem: FieldProblem,
}

impl ValidationError {
    /// Field absent or falsy
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self {
            field,
            problem: FieldProblem::Missing,
        }
    }

    /// Field present but unusable
    #[must_use]
    pub const fn invalid(field: &'static str) -> Self {
        Self {
            field,
            problem: FieldProblem::Invalid,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Storage
// ═══════════════════════════════════════════════════════════

/// Registration store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// I/O or engine fault
    #[error("Database error: {0}")]
    Database(String),

    /// The `(first_name, email)` uniqueness constraint rejected the write
    #[error("A registration with this identity key already exists")]
    Conflict,

    /// The operation did not finish within the configured limit
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// An existing table cannot be brought up to the current schema
    #[error("Incompatible registration table: {0}")]
    Schema(String),
}

// ═══════════════════════════════════════════════════════════
// Mail
// ═══════════════════════════════════════════════════════════

/// Which leg of the notification step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Confirmation to the registrant
    User,
    /// Notification to the administrator
    Admin,
}

impl Recipient {
    /// Lowercase label for logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// How a send failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailFailure {
    /// The transport reported an error
    Transport(String),
    /// The send did not finish within the configured limit
    Timeout(Duration),
}

/// A notification send failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{} mail failed: {failure:?}", .recipient.as_str())]
pub struct MailError {
    /// Which message failed
    pub recipient: Recipient,
    /// What went wrong
    pub failure: MailFailure,
}

/// Errors reported by a [`crate::providers::Mailer`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailerError {
    /// An address could not be parsed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The message could not be built
    #[error("Failed to build email: {0}")]
    Build(String),

    /// The transport failed to deliver the message
    #[error("Failed to send email: {0}")]
    Transport(String),
}

// ═══════════════════════════════════════════════════════════
// Workflow outcome
// ═══════════════════════════════════════════════════════════

/// Why a submission did not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A required field is missing or unusable
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A registration with the same first name and email already exists
    #[error("Duplicate registration")]
    Duplicate,

    /// The store failed or timed out
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A notification email failed or timed out
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl Rejection {
    /// HTTP status for this rejection
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Duplicate => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Mail(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Validation(_) => MISSING_FIELDS_MESSAGE,
            Self::Duplicate => DUPLICATE_MESSAGE,
            Self::Store(_) => STORE_MESSAGE,
            Self::Mail(MailError {
                recipient,
                failure: MailFailure::Transport(_),
            }) => match recipient {
                Recipient::User => USER_MAIL_MESSAGE,
                Recipient::Admin => ADMIN_MAIL_MESSAGE,
            },
            Self::Mail(MailError {
                recipient,
                failure: MailFailure::Timeout(_),
            }) => match recipient {
                Recipient::User => USER_MAIL_TIMEOUT_MESSAGE,
                Recipient::Admin => ADMIN_MAIL_TIMEOUT_MESSAGE,
            },
        }
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "MISSING_FIELDS",
            Self::Duplicate => "DUPLICATE_REGISTRATION",
            Self::Store(_) => "STORE_ERROR",
            Self::Mail(MailError {
                failure: MailFailure::Transport(_),
                ..
            }) => "MAIL_ERROR",
            Self::Mail(MailError {
                failure: MailFailure::Timeout(_),
                ..
            }) => "MAIL_TIMEOUT",
        }
    }

    /// Label for the submissions counter
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid",
            Self::Duplicate => "duplicate",
            Self::Store(_) => "store_error",
            Self::Mail(MailError {
                recipient: Recipient::User,
                ..
            }) => "user_mail_error",
            Self::Mail(MailError {
                recipient: Recipient::Admin,
                ..
            }) => "admin_mail_error",
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        let error = Self::new(rejection.status(), rejection.code(), rejection.message());
        match rejection {
            Rejection::Store(_) | Rejection::Mail(_) => {
                error.with_source(anyhow::Error::new(rejection))
            }
            Rejection::Validation(_) | Rejection::Duplicate => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(recipient: Recipient, failure: MailFailure) -> Rejection {
        Rejection::Mail(MailError { recipient, failure })
    }

    #[test]
    fn test_client_errors() {
        let missing = Rejection::from(ValidationError::missing("age"));
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.message(), MISSING_FIELDS_MESSAGE);

        assert_eq!(Rejection::Duplicate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Rejection::Duplicate.message(), DUPLICATE_MESSAGE);
    }

    #[test]
    fn test_store_errors_share_one_message() {
        for error in [
            StoreError::Database("disk I/O error".to_string()),
            StoreError::Timeout(Duration::from_secs(5)),
        ] {
            let rejection = Rejection::from(error);
            assert_eq!(rejection.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(rejection.message(), STORE_MESSAGE);
        }
    }

    #[test]
    fn test_mail_messages_name_the_failed_leg() {
        let transport = || MailFailure::Transport("550 rejected".to_string());
        let timeout = || MailFailure::Timeout(Duration::from_secs(10));

        assert_eq!(mail(Recipient::User, transport()).message(), USER_MAIL_MESSAGE);
        assert_eq!(mail(Recipient::Admin, transport()).message(), ADMIN_MAIL_MESSAGE);
        assert_eq!(
            mail(Recipient::User, timeout()).message(),
            USER_MAIL_TIMEOUT_MESSAGE
        );
        assert_eq!(
            mail(Recipient::Admin, timeout()).message(),
            ADMIN_MAIL_TIMEOUT_MESSAGE
        );
        assert_eq!(mail(Recipient::Admin, timeout()).code(), "MAIL_TIMEOUT");
        assert_eq!(mail(Recipient::User, transport()).outcome(), "user_mail_error");
    }

    #[test]
    fn test_app_error_conversion() {
        let error = AppError::from(Rejection::Duplicate);
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "DUPLICATE_REGISTRATION");
        assert_eq!(error.message(), DUPLICATE_MESSAGE);

        let error = AppError::from(Rejection::from(StoreError::Conflict));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&error).is_some());
    }
}
