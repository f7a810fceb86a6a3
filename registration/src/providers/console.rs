//! Console mailer for development.

use crate::error::MailerError;
use crate::providers::{MailMessage, Mailer};
use tracing::info;

/// Logs every message instead of sending it.
///
/// Selected by the server when no SMTP credentials are configured.
#[derive(Clone, Debug, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    /// Create a new console mailer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Mailer for ConsoleMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailerError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "📧 Email (console mode)"
        );
        Ok(())
    }
}
