use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};

use crate::{EmailError, EmailResult, Mailer, OutgoingEmail};

/// Resend's send-email endpoint.
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com/emails";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Mailer backed by the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendMailer")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SendEmailReq<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Deserialize)]
struct ProviderErrorRes {
    #[serde(default)]
    message: Option<String>,
}

impl ResendMailer {
    /// Build a mailer for the given API key.
    ///
    /// `api_url` overrides the endpoint (useful against a local stub); `None` uses
    /// [`DEFAULT_RESEND_API_URL`].
    pub fn new(api_key: impl Into<String>, api_url: Option<String>) -> EmailResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let api_url = api_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string());
        if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
            return Err(EmailError::InvalidConfig(format!(
                "email API URL must be http(s): {api_url}"
            )));
        }

        let client = ClientBuilder::new().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key,
            api_url,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> EmailResult<()> {
        let req = SendEmailReq {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::debug!("email provider accepted message for {}", email.to);
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderErrorRes>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Failed to send email".to_string());

        Err(EmailError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
