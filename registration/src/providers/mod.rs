//! Registration providers.
//!
//! Traits for the external dependencies of the intake workflow. The reducer
//! only sees these interfaces; the server wires in SQLite and SMTP, tests
//! wire in the mocks from [`crate::mocks`].
//!
//! ```text
//! IntakeReducer ──► RegistrationStore ──► SqliteRegistrationStore
//!               └─► Mailer            ──► SmtpMailer / ConsoleMailer
//! ```

pub mod console;
pub mod mailer;
pub mod smtp;
pub mod store;

pub use console::ConsoleMailer;
pub use mailer::{MailMessage, Mailer};
pub use smtp::{SmtpMailer, SmtpSettings};
pub use store::{InsertOutcome, RegistrationStore, bounded};
