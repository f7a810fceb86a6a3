//! Mailer selection.

use crate::config::{ConfigError, MailTransport, SmtpConfig};
use inscriptions_registration::error::MailerError;
use inscriptions_registration::providers::{
    ConsoleMailer, MailMessage, Mailer, SmtpMailer, SmtpSettings,
};

/// The mailer chosen by `SMTP_TRANSPORT`.
#[derive(Debug, Clone)]
pub enum ServerMailer {
    /// Real delivery
    Smtp(SmtpMailer),
    /// Development logging
    Console(ConsoleMailer),
}

impl ServerMailer {
    /// Build the configured mailer.
    ///
    /// # Errors
    ///
    /// Fails on an unknown transport, missing credentials or an unusable
    /// sender address.
    pub fn from_config(config: &SmtpConfig) -> anyhow::Result<Self> {
        match config.mail_transport()? {
            MailTransport::Console => Ok(Self::Console(ConsoleMailer::new())),
            MailTransport::Smtp => {
                let (Some(username), Some(password)) = (config.user.clone(), config.pass.clone())
                else {
                    return Err(ConfigError::MissingSmtpCredentials.into());
                };

                let mailer = SmtpMailer::new(SmtpSettings {
                    host: config.host.clone(),
                    port: config.port,
                    username,
                    password,
                    from_name: config.from_name.clone(),
                })?;
                Ok(Self::Smtp(mailer))
            }
        }
    }

    /// Transport name for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Console(_) => "console",
        }
    }
}

impl Mailer for ServerMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailerError> {
        match self {
            Self::Smtp(mailer) => mailer.send(message).await,
            Self::Console(mailer) => mailer.send(message).await,
        }
    }
}
