//! SMTP mailer using Lettre.

use crate::error::MailerError;
use crate::providers::{MailMessage, Mailer};
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::debug;

/// Implicit TLS port; every other port negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

/// Connection settings for [`SmtpMailer`].
#[derive(Clone)]
pub struct SmtpSettings {
    /// Relay host (e.g. "smtp.gmail.com")
    pub host: String,
    /// Relay port (587 for STARTTLS, 465 for implicit TLS)
    pub port: u16,
    /// Login, also used as the sender address
    pub username: String,
    /// Password or app password
    pub password: String,
    /// Sender display name
    pub from_name: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Sends plain-text mail through an authenticated SMTP relay.
///
/// The transport is built once at startup; clones share its configuration.
///
/// # Examples
///
/// ```ignore
/// use inscriptions_registration::providers::{SmtpMailer, SmtpSettings};
///
/// let mailer = SmtpMailer::new(SmtpSettings {
///     host: "smtp.gmail.com".to_string(),
///     port: 587,
///     username: "inscriptions@example.com".to_string(),
///     password: "app_password".to_string(),
///     from_name: "Inscriptions".to_string(),
/// })?;
/// ```
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the mailer and its relay transport.
    ///
    /// No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// - [`MailerError::InvalidAddress`] if the username is not an email address
    /// - [`MailerError::Transport`] if the relay TLS parameters cannot be built
    pub fn new(settings: SmtpSettings) -> Result<Self, MailerError> {
        let from = sender(&settings.from_name, &settings.username)?;

        let builder = if settings.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| MailerError::Transport(format!("SMTP relay error: {e}")))?;

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .build();

        Ok(Self { transport, from })
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailerError> {
        let email = build_message(&self.from, message)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        debug!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// `"{from_name} <{username}>"`
fn sender(from_name: &str, username: &str) -> Result<Mailbox, MailerError> {
    let address: Address = username
        .parse()
        .map_err(|e| MailerError::InvalidAddress(format!("{username}: {e}")))?;

    Ok(Mailbox::new(Some(from_name.to_string()), address))
}

fn build_message(from: &Mailbox, message: &MailMessage) -> Result<Message, MailerError> {
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e| MailerError::InvalidAddress(format!("{}: {e}", message.to)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| MailerError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;

    fn message(to: &str) -> MailMessage {
        MailMessage {
            to: to.to_string(),
            subject: "Confirmation d’inscription".to_string(),
            body: "Bonjour Alice,".to_string(),
        }
    }

    #[test]
    fn test_sender_uses_display_name() {
        let from = sender("Inscriptions", "noreply@example.com").unwrap();

        assert_eq!(from.name.as_deref(), Some("Inscriptions"));
        assert_eq!(from.email.to_string(), "noreply@example.com");
    }

    #[test]
    fn test_sender_rejects_non_address_username() {
        let result = sender("Inscriptions", "not-an-address");
        assert!(matches!(result, Err(MailerError::InvalidAddress(_))));
    }

    #[test]
    fn test_build_message_is_plain_text() {
        let from = sender("Inscriptions", "noreply@example.com").unwrap();
        let email = build_message(&from, &message("alice@example.com")).unwrap();

        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(raw.contains("alice@example.com"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let from = sender("Inscriptions", "noreply@example.com").unwrap();
        let result = build_message(&from, &message("alice at example"));

        assert!(matches!(result, Err(MailerError::InvalidAddress(_))));
    }

    #[test]
    fn test_settings_debug_hides_password() {
        let settings = SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "noreply@example.com".to_string(),
            password: "hunter2".to_string(),
            from_name: "Inscriptions".to_string(),
        };
        assert!(!format!("{settings:?}").contains("hunter2"));
    }
}
