//! Intake actions.

use crate::error::Rejection;
use crate::types::{Registration, SubmissionForm};

/// Inputs and step results of the intake workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeAction {
    /// A form arrived over HTTP
    Submit {
        /// Raw form
        form: SubmissionForm,
    },

    /// The record was stored
    Persisted {
        /// Stored record
        registration: Registration,
    },

    /// The confirmation email was delivered
    UserNotified,

    /// The administrator email was delivered
    AdminNotified,

    /// The workflow finished successfully
    Completed {
        /// Stored record
        registration: Registration,
    },

    /// The workflow stopped at some step
    Rejected {
        /// What went wrong
        rejection: Rejection,
    },
}

impl IntakeAction {
    /// Whether this action ends the workflow
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Rejected { .. })
    }

    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "Submit",
            Self::Persisted { .. } => "Persisted",
            Self::UserNotified => "UserNotified",
            Self::AdminNotified => "AdminNotified",
            Self::Completed { .. } => "Completed",
            Self::Rejected { .. } => "Rejected",
        }
    }
}
