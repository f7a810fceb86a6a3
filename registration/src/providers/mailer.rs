//! Mailer trait.

use crate::error::MailerError;
use std::future::Future;

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Outbound email delivery.
///
/// This trait abstracts over the delivery channel (SMTP relay, console log,
/// test double).
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - An address cannot be parsed
    /// - The relay rejects the message or cannot be reached
    fn send(&self, message: &MailMessage) -> impl Future<Output = Result<(), MailerError>> + Send;
}
