//! Contact submission service.
//!
//! `ContactService` is the one entry point the HTTP layer needs: it owns the guard chain and the
//! notification dispatcher and turns a screened request into a [`ContactOutcome`].

use std::sync::Arc;

use fyl_email::Mailer;

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::guard::{ClientIdentity, RequestGuard, Screened};
use crate::notification::NotificationDispatcher;
use crate::rate_limit::RateLimit;
use crate::ContactError;

/// A submission that was answered with success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// The practice was notified.
    Delivered { confirmation_sent: bool },
    /// Honeypot submission, silently dropped.
    Discarded,
}

#[derive(Clone)]
pub struct ContactService {
    cfg: Arc<CoreConfig>,
    guard: RequestGuard,
    dispatcher: NotificationDispatcher,
}

impl ContactService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        limiter: Arc<dyn RateLimit>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            guard: RequestGuard::new(cfg.clone(), limiter, clock),
            dispatcher: NotificationDispatcher::new(mailer, cfg.clone()),
            cfg,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Header-level checks; see [`RequestGuard::screen_headers`].
    pub fn screen_headers(&self, headers: &http::HeaderMap) -> Result<ClientIdentity, ContactError> {
        self.guard.screen_headers(headers)
    }

    /// Body-level checks; see [`RequestGuard::screen_body`].
    pub fn screen_body(&self, body: &[u8]) -> Result<Screened, ContactError> {
        self.guard.screen_body(body)
    }

    /// Dispatch notifications for a screened body.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::PracticeNotification`] if the practice could not be notified.
    pub async fn submit(&self, screened: Screened) -> Result<ContactOutcome, ContactError> {
        let request = match screened {
            Screened::Honeypot => return Ok(ContactOutcome::Discarded),
            Screened::Accepted(request) => request,
        };

        tracing::info!(
            reference = %request.reference,
            email = request.email.as_str(),
            name = request.name.as_str(),
            "contact form submission received"
        );

        let report = self.dispatcher.dispatch(&request).await?;
        Ok(ContactOutcome::Delivered {
            confirmation_sent: report.confirmation_sent,
        })
    }

    /// Run the whole chain over an already-buffered request.
    pub async fn handle(
        &self,
        headers: &http::HeaderMap,
        body: &[u8],
    ) -> Result<ContactOutcome, ContactError> {
        self.screen_headers(headers)?;
        let screened = self.screen_body(body)?;
        self.submit(screened).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::ExecutionMode;
    use crate::rate_limit::RateLimiter;
    use chrono::{TimeZone, Utc};
    use fyl_email::MemoryMailer;
    use http::header::CONTENT_TYPE;
    use http::{HeaderMap, HeaderValue};
    use serde_json::json;

    fn service(mailer: Arc<MemoryMailer>) -> ContactService {
        let cfg = Arc::new(
            CoreConfig::new(
                ExecutionMode::Development,
                "https://www.example.org",
                "inbox@example.org",
            )
            .unwrap(),
        );
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
        ));
        let limiter = Arc::new(RateLimiter::new(cfg.rate_limit().clone(), clock.clone()));
        ContactService::new(cfg, limiter, mailer, clock)
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    #[tokio::test]
    async fn valid_submission_is_delivered() {
        let mailer = Arc::new(MemoryMailer::new());
        let service = service(mailer.clone());
        let body = json!({
            "name": "Jane Doe",
            "dob": "1990-05-01",
            "email": "JANE@Example.com",
            "appointmentType": "Telehealth",
            "contactMethod": "Email",
            "message": "<script>x</script>Hi",
            "website": ""
        })
        .to_string();

        let outcome = service
            .handle(&headers(), body.as_bytes())
            .await
            .expect("delivered");
        assert_eq!(
            outcome,
            ContactOutcome::Delivered {
                confirmation_sent: true
            }
        );

        let practice = &mailer.delivered()[0];
        assert!(practice.html.contains(">Hi<"));
        assert!(!practice.html.contains("script"));
        assert_eq!(practice.reply_to.as_deref(), Some("jane@example.com"));
    }

    #[tokio::test]
    async fn honeypot_sends_nothing() {
        let mailer = Arc::new(MemoryMailer::new());
        let service = service(mailer.clone());
        let body = json!({"name": "Bot", "website": "spam"}).to_string();

        let outcome = service.handle(&headers(), body.as_bytes()).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Discarded);
        assert!(mailer.attempts().is_empty());
    }

    #[tokio::test]
    async fn rejected_headers_stop_before_the_body() {
        let mailer = Arc::new(MemoryMailer::new());
        let service = service(mailer.clone());
        let err = service
            .handle(&HeaderMap::new(), b"{not json")
            .await
            .expect_err("content type is checked first");
        assert!(matches!(err, ContactError::InvalidContentType));
    }
}
