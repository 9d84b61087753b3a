//! Notification dispatch for accepted appointment requests.
//!
//! Two sends with different failure policies:
//! - the practice notification is mandatory; its failure fails the request,
//! - the patient confirmation is best effort and only attempted after the practice has been
//!   notified; its failure is logged and otherwise ignored.
//!
//! Sends are sequential and never retried.

mod templates;

pub use templates::{confirmation_html, confirmation_subject, practice_html, practice_subject};

use std::sync::Arc;

use fyl_email::{Mailer, OutgoingEmail};

use crate::config::CoreConfig;
use crate::submission::AppointmentRequest;
use crate::ContactError;

/// What happened beyond the mandatory practice notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub confirmation_sent: bool,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    cfg: Arc<CoreConfig>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, cfg: Arc<CoreConfig>) -> Self {
        Self { mailer, cfg }
    }

    /// Notify the practice, then confirm to the submitter.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::PracticeNotification`] if the practice email could not be sent.
    /// The confirmation is not attempted in that case.
    pub async fn dispatch(&self, request: &AppointmentRequest) -> Result<DispatchReport, ContactError> {
        let practice_email = self.practice_email(request);
        if let Err(e) = self.mailer.send(&practice_email).await {
            tracing::error!(
                reference = %request.reference,
                "failed to send practice notification email: {}",
                e
            );
            return Err(ContactError::PracticeNotification(e));
        }
        tracing::info!(
            reference = %request.reference,
            email = request.email.as_str(),
            "practice notification email sent"
        );

        let confirmation = self.confirmation_email(request);
        let confirmation_sent = match self.mailer.send(&confirmation).await {
            Ok(()) => {
                tracing::info!(
                    reference = %request.reference,
                    email = request.email.as_str(),
                    "confirmation email sent"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    reference = %request.reference,
                    "failed to send confirmation email (non-critical): {}",
                    e
                );
                false
            }
        };

        Ok(DispatchReport { confirmation_sent })
    }

    fn practice_email(&self, request: &AppointmentRequest) -> OutgoingEmail {
        OutgoingEmail {
            from: self.cfg.sender().to_string(),
            to: self.cfg.practice_inbox().to_string(),
            reply_to: Some(request.email.as_str().to_string()),
            subject: practice_subject(request),
            html: practice_html(request),
        }
    }

    fn confirmation_email(&self, request: &AppointmentRequest) -> OutgoingEmail {
        OutgoingEmail {
            from: self.cfg.sender().to_string(),
            to: request.email.as_str().to_string(),
            reply_to: None,
            subject: confirmation_subject(self.cfg.practice()),
            html: confirmation_html(request, &self.cfg),
        }
    }
}
