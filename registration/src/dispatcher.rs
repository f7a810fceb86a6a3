//! Notification dispatcher.
//!
//! Builds the two messages sent for every stored registration and delivers
//! them through a [`Mailer`], each under its own time limit. The order
//! (confirmation first, administrator second) is driven by the intake
//! reducer, which only schedules the second leg after the first succeeded.

use crate::error::{MailError, MailFailure, Recipient};
use crate::providers::{MailMessage, Mailer};
use crate::types::Registration;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Subject of the registrant's confirmation
pub const CONFIRMATION_SUBJECT: &str = "Confirmation d’inscription";
/// Subject of the administrator's notification
pub const ADMIN_SUBJECT: &str = "Nouvelle inscription";

/// Sends the confirmation and administrator emails.
pub struct NotificationDispatcher<M> {
    mailer: Arc<M>,
    admin_email: String,
    send_timeout: Duration,
}

impl<M> Clone for NotificationDispatcher<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: Arc::clone(&self.mailer),
            admin_email: self.admin_email.clone(),
            send_timeout: self.send_timeout,
        }
    }
}

impl<M: Mailer> NotificationDispatcher<M> {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(mailer: Arc<M>, admin_email: impl Into<String>, send_timeout: Duration) -> Self {
        Self {
            mailer,
            admin_email: admin_email.into(),
            send_timeout,
        }
    }

    /// Per-send time limit
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Send the confirmation to the registrant.
    ///
    /// # Errors
    ///
    /// Returns a [`MailError`] for [`Recipient::User`] on transport failure or timeout.
    pub async fn send_confirmation(&self, registration: &Registration) -> Result<(), MailError> {
        self.deliver(Recipient::User, confirmation_message(registration))
            .await
    }

    /// Send the notification to the administrator.
    ///
    /// # Errors
    ///
    /// Returns a [`MailError`] for [`Recipient::Admin`] on transport failure or timeout.
    pub async fn send_admin_notification(
        &self,
        registration: &Registration,
    ) -> Result<(), MailError> {
        self.deliver(
            Recipient::Admin,
            admin_message(&self.admin_email, registration),
        )
        .await
    }

    async fn deliver(&self, recipient: Recipient, message: MailMessage) -> Result<(), MailError> {
        let failure = match tokio::time::timeout(self.send_timeout, self.mailer.send(&message)).await
        {
            Ok(Ok(())) => {
                info!(recipient = recipient.as_str(), to = %message.to, "Notification sent");
                return Ok(());
            }
            Ok(Err(e)) => MailFailure::Transport(e.to_string()),
            Err(_) => MailFailure::Timeout(self.send_timeout),
        };

        warn!(
            recipient = recipient.as_str(),
            to = %message.to,
            failure = ?failure,
            "Notification failed"
        );
        Err(MailError { recipient, failure })
    }
}

/// Confirmation addressed to the registrant.
#[must_use]
pub fn confirmation_message(registration: &Registration) -> MailMessage {
    MailMessage {
        to: registration.email.clone(),
        subject: CONFIRMATION_SUBJECT.to_string(),
        body: format!(
            "Bonjour {},\n\nMerci pour votre inscription !\n\nÀ bientôt !",
            registration.first_name
        ),
    }
}

/// Summary of the registration addressed to the administrator.
#[must_use]
pub fn admin_message(admin_email: &str, registration: &Registration) -> MailMessage {
    MailMessage {
        to: admin_email.to_string(),
        subject: ADMIN_SUBJECT.to_string(),
        body: format!(
            "Nouvelle inscription reçue :\nPrénom : {}\nÂge : {}\nTéléphone : {}\nEmail : {}",
            registration.first_name, registration.age, registration.phone, registration.email
        ),
    }
}
