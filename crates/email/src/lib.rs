//! # Email
//!
//! Outbound email delivery for appointment requests.
//!
//! The rest of the workspace treats the email provider as a black box behind the [`Mailer`]
//! trait: one call per message, success or failure, no retries. Implementations:
//! - [`ResendMailer`]: the Resend HTTP API, used in deployments.
//! - [`UnconfiguredMailer`]: every send fails; used when no API key is configured.
//! - [`MemoryMailer`]: records messages in memory; used by tests and local experiments.

#![warn(rust_2018_idioms)]

mod memory;
mod resend;

pub use memory::MemoryMailer;
pub use resend::{ResendMailer, DEFAULT_RESEND_API_URL};

use async_trait::async_trait;

/// A fully rendered message ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Sender in `Name <address>` or bare address form.
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    /// HTML body. Callers are responsible for escaping interpolated values.
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("email provider not configured: set RESEND_API_KEY")]
    NotConfigured,
    #[error("email request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid email client configuration: {0}")]
    InvalidConfig(String),
}

pub type EmailResult<T> = std::result::Result<T, EmailError>;

/// Delivers a single message.
///
/// Implementations must not retry internally; a failure is reported once and the caller decides
/// whether it is fatal.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> EmailResult<()>;
}

/// Mailer used when no provider credentials are available.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _email: &OutgoingEmail) -> EmailResult<()> {
        Err(EmailError::NotConfigured)
    }
}
