//! Request guard chain for contact submissions.
//!
//! The chain runs in two halves so the HTTP layer never buffers a body it is about to
//! reject: [`RequestGuard::screen_headers`] covers content type, origin, rate limit and the
//! declared length; [`RequestGuard::screen_body`] covers the buffered body through to field
//! validation. Each check short-circuits with a [`ContactError`].

use std::sync::Arc;

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, ORIGIN, REFERER};
use http::{HeaderMap, Uri};
use serde_json::Value;

use crate::clock::Clock;
use crate::config::{AllowedHosts, CoreConfig};
use crate::constants::{MAX_BODY_SIZE, UNKNOWN_CLIENT};
use crate::rate_limit::RateLimit;
use crate::submission::AppointmentRequest;
use crate::validation::{validate_submission, RawSubmission};
use crate::ContactError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
const CF_CONNECTING_IP: &str = "cf-connecting-ip";

/// Who sent the request, as far as forwarding headers tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    Address(String),
    Unknown,
}

impl ClientIdentity {
    /// Resolve from `X-Forwarded-For` (first entry), then `X-Real-IP`, then `CF-Connecting-IP`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let forwarded = header(X_FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match forwarded
            .or_else(|| header(X_REAL_IP))
            .or_else(|| header(CF_CONNECTING_IP))
        {
            Some(ip) if ip != UNKNOWN_CLIENT => ClientIdentity::Address(ip.to_string()),
            _ => ClientIdentity::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClientIdentity::Address(ip) => ip,
            ClientIdentity::Unknown => UNKNOWN_CLIENT,
        }
    }
}

/// Result of a body that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screened {
    /// The honeypot was filled. Answer with a bare success and do nothing else.
    Honeypot,
    Accepted(AppointmentRequest),
}

/// Stateless checks plus the shared rate limiter.
#[derive(Clone)]
pub struct RequestGuard {
    cfg: Arc<CoreConfig>,
    limiter: Arc<dyn RateLimit>,
    clock: Arc<dyn Clock>,
}

impl RequestGuard {
    pub fn new(cfg: Arc<CoreConfig>, limiter: Arc<dyn RateLimit>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cfg,
            limiter,
            clock,
        }
    }

    /// Content type, origin (production only), rate limit, declared length.
    ///
    /// # Errors
    ///
    /// - [`ContactError::InvalidContentType`] unless `Content-Type` contains `application/json`
    /// - [`ContactError::InvalidOrigin`] if `Origin`/`Referer` are present and none matches
    /// - [`ContactError::RateLimited`] if the client has used up its window
    /// - [`ContactError::PayloadTooLarge`] if `Content-Length` exceeds [`MAX_BODY_SIZE`]
    pub fn screen_headers(&self, headers: &HeaderMap) -> Result<ClientIdentity, ContactError> {
        let is_json = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"));
        if !is_json {
            return Err(ContactError::InvalidContentType);
        }

        if self.cfg.mode().is_production() {
            self.check_origin(headers)?;
        }

        let client = ClientIdentity::from_headers(headers);
        let counted = match &client {
            ClientIdentity::Address(_) => true,
            ClientIdentity::Unknown => self.cfg.rate_limit().limit_unknown_clients,
        };
        if counted && !self.limiter.allow(client.as_str()) {
            tracing::warn!(ip = client.as_str(), "rate limit exceeded");
            return Err(ContactError::RateLimited);
        }

        // A non-numeric length is left for the body read to police.
        let declared = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if declared.is_some_and(|len| len > MAX_BODY_SIZE as u64) {
            return Err(ContactError::PayloadTooLarge);
        }

        Ok(client)
    }

    /// Size, emptiness, JSON syntax, object shape, honeypot, then field validation.
    ///
    /// # Errors
    ///
    /// - [`ContactError::PayloadTooLarge`] if the body exceeds [`MAX_BODY_SIZE`]
    /// - [`ContactError::EmptyBody`] for an empty or whitespace-only body
    /// - [`ContactError::InvalidJson`] if the body is not JSON
    /// - [`ContactError::InvalidShape`] if the JSON is not an object
    /// - [`ContactError::Validation`] for the first failing field rule
    pub fn screen_body(&self, body: &[u8]) -> Result<Screened, ContactError> {
        if body.len() > MAX_BODY_SIZE {
            return Err(ContactError::PayloadTooLarge);
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ContactError::EmptyBody);
        }

        let value: Value = serde_json::from_slice(body).map_err(|e| {
            tracing::error!("contact body is not valid JSON: {}", e);
            ContactError::InvalidJson(e.to_string())
        })?;

        let raw = RawSubmission::from_json(value).ok_or(ContactError::InvalidShape)?;
        if raw.honeypot_filled {
            tracing::debug!("honeypot filled; discarding submission");
            return Ok(Screened::Honeypot);
        }

        let request = validate_submission(raw, self.clock.today(), self.clock.now())?;
        Ok(Screened::Accepted(request))
    }

    fn check_origin(&self, headers: &HeaderMap) -> Result<(), ContactError> {
        let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
        let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());

        if origin.is_none() && referer.is_none() {
            return Ok(());
        }

        let allowed = self.cfg.allowed_hosts();
        if header_host_allowed(origin, allowed) || header_host_allowed(referer, allowed) {
            return Ok(());
        }

        tracing::warn!(
            origin = origin.unwrap_or_default(),
            referer = referer.unwrap_or_default(),
            allowed = self.cfg.base_url(),
            "rejected cross-origin contact submission"
        );
        Err(ContactError::InvalidOrigin)
    }
}

/// Whether an `Origin`/`Referer` value is an absolute URL on an allowed host.
fn header_host_allowed(value: Option<&str>, allowed: &AllowedHosts) -> bool {
    let Some(uri) = value.and_then(|v| v.trim().parse::<Uri>().ok()) else {
        return false;
    };
    uri.scheme().is_some() && uri.host().is_some_and(|host| allowed.contains(host))
}
