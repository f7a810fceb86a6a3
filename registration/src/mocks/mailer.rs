//! Mock mailer for testing.

use crate::error::MailerError;
use crate::providers::{MailMessage, Mailer};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct MockMailerState {
    sent: Vec<MailMessage>,
    attempts: Vec<String>,
    failing: HashSet<String>,
    stalling: HashSet<String>,
}

/// Mock mailer.
///
/// Records delivered messages instead of sending them. Individual recipients
/// can be set to fail or to never complete.
#[derive(Debug, Clone, Default)]
pub struct MockMailer {
    state: Arc<Mutex<MockMailerState>>,
}

impl MockMailer {
    /// Create a mailer that delivers everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message addressed to `to` with a transport error.
    pub fn fail_for(&self, to: &str) {
        self.lock().failing.insert(to.to_string());
    }

    /// Never complete sends addressed to `to`.
    pub fn stall_for(&self, to: &str) {
        self.lock().stalling.insert(to.to_string());
    }

    /// Messages delivered so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<MailMessage> {
        self.lock().sent.clone()
    }

    /// Recipients of every send attempt, successful or not, in order.
    #[must_use]
    pub fn attempts(&self) -> Vec<String> {
        self.lock().attempts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockMailerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Mailer for MockMailer {
    fn send(&self, message: &MailMessage) -> impl Future<Output = Result<(), MailerError>> + Send {
        let state = Arc::clone(&self.state);
        let message = message.clone();

        async move {
            let stall = {
                let mut guard = state
                    .lock()
                    .map_err(|_| MailerError::Transport("Mutex lock failed".to_string()))?;
                guard.attempts.push(message.to.clone());

                if guard.failing.contains(&message.to) {
                    return Err(MailerError::Transport(format!(
                        "550 mailbox unavailable: {}",
                        message.to
                    )));
                }
                guard.stalling.contains(&message.to)
            };

            if stall {
                std::future::pending::<()>().await;
            }

            state
                .lock()
                .map_err(|_| MailerError::Transport("Mutex lock failed".to_string()))?
                .sent
                .push(message);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn message(to: &str) -> MailMessage {
        MailMessage {
            to: to.to_string(),
            subject: "Sujet".to_string(),
            body: "Corps".to_string(),
        }
    }

    #[tokio::test]
    async fn test_records_delivered_messages() {
        let mailer = MockMailer::new();
        assert!(mailer.send(&message("a@example.com")).await.is_ok());

        assert_eq!(mailer.sent(), vec![message("a@example.com")]);
        assert_eq!(mailer.attempts(), vec!["a@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_recipient_is_attempted_not_sent() {
        let mailer = MockMailer::new();
        mailer.fail_for("a@example.com");

        assert!(mailer.send(&message("a@example.com")).await.is_err());
        assert!(mailer.sent().is_empty());
        assert_eq!(mailer.attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_stalled_recipient_never_completes() {
        let mailer = MockMailer::new();
        mailer.stall_for("a@example.com");

        let result =
            tokio::time::timeout(Duration::from_millis(20), mailer.send(&message("a@example.com")))
                .await;
        assert!(result.is_err());
    }
}
