//! Intake workflow.
//!
//! One submission is one run of [`IntakeReducer`] on its own
//! [`inscriptions_runtime::Store`]:
//!
//! ```text
//! Submit ─► Received ─validate─► Validated ─dedupe+insert─► Persisted
//!                                                              │
//!     Completed ◄─ NotifiedAdmin ◄─admin mail─ NotifiedUser ◄─user mail
//! ```
//!
//! Every step either advances the phase or ends the run with
//! [`IntakeAction::Rejected`]. The HTTP handler waits for the first terminal
//! action.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod state;

pub use actions::IntakeAction;
pub use environment::IntakeEnvironment;
pub use reducer::IntakeReducer;
pub use state::{IntakeState, Phase};
