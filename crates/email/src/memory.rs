use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{EmailError, EmailResult, Mailer, OutgoingEmail};

/// In-memory mailer that records every send attempt.
///
/// Recipients registered with [`MemoryMailer::fail_for`] get a provider rejection instead of a
/// delivery; the attempt is still recorded.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    attempts: Mutex<Vec<OutgoingEmail>>,
    delivered: Mutex<Vec<OutgoingEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future send to `recipient` fail.
    pub fn fail_for(&self, recipient: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(recipient.into());
    }

    /// Every message passed to `send`, including failed ones.
    pub fn attempts(&self) -> Vec<OutgoingEmail> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages that were accepted.
    pub fn delivered(&self) -> Vec<OutgoingEmail> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &OutgoingEmail) -> EmailResult<()> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());

        let fails = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email.to);
        if fails {
            return Err(EmailError::Rejected {
                status: 500,
                message: format!("simulated failure for {}", email.to),
            });
        }

        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_to(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            from: "noreply@example.org".into(),
            to: to.into(),
            reply_to: None,
            subject: "Subject".into(),
            html: "<p>Body</p>".into(),
        }
    }

    #[tokio::test]
    async fn records_delivered_messages() {
        let mailer = MemoryMailer::new();
        mailer.send(&email_to("a@example.org")).await.unwrap();

        assert_eq!(mailer.attempts().len(), 1);
        assert_eq!(mailer.delivered()[0].to, "a@example.org");
    }

    #[tokio::test]
    async fn failing_recipient_is_attempted_but_not_delivered() {
        let mailer = MemoryMailer::new();
        mailer.fail_for("down@example.org");

        let err = mailer
            .send(&email_to("down@example.org"))
            .await
            .expect_err("send should fail");
        assert!(matches!(err, EmailError::Rejected { status: 500, .. }));
        assert_eq!(mailer.attempts().len(), 1);
        assert!(mailer.delivered().is_empty());
    }
}
