//! Intake state.

use crate::error::Rejection;
use crate::types::{NewRegistration, Registration};

/// Where a submission is in the workflow.
///
/// Phases only move forward; `Completed` and `Rejected` are terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for `Submit`, or submitted with an invalid form
    #[default]
    Received,
    /// Fields checked, store write in flight
    Validated,
    /// Stored, confirmation email in flight
    Persisted,
    /// Confirmation delivered, administrator email in flight
    NotifiedUser,
    /// Both emails delivered
    NotifiedAdmin,
    /// Done
    Completed,
    /// Stopped
    Rejected(Rejection),
}

impl Phase {
    /// Whether no further action is accepted
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected(_))
    }
}

/// State of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeState {
    /// Current phase
    pub phase: Phase,
    /// Validated fields, once validation passed
    pub candidate: Option<NewRegistration>,
    /// Stored record, once persisted
    pub registration: Option<Registration>,
}
