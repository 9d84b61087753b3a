//! Core runtime configuration.
//!
//! This module defines configuration that is resolved once at process startup and then passed
//! into core services. Request handling never reads process-wide environment variables, which
//! keeps behaviour consistent across threads and test harnesses.

use std::fmt;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_FROM_EMAIL, DEFAULT_FROM_NAME, DEFAULT_PRACTICE_LOCATION,
    DEFAULT_PRACTICE_NAME, DEFAULT_PRACTICE_PHONE,
};
use crate::{CoreError, CoreResult};

/// Development or production behaviour.
///
/// Production enforces the origin check and hides internal error detail from responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Development,
    Production,
}

impl ExecutionMode {
    pub fn is_production(self) -> bool {
        self == ExecutionMode::Production
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "development" | "dev" => Ok(ExecutionMode::Development),
            "production" | "prod" => Ok(ExecutionMode::Production),
            other => Err(CoreError::Config(format!(
                "FYL_ENV must be 'development' or 'production', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Development => f.write_str("development"),
            ExecutionMode::Production => f.write_str("production"),
        }
    }
}

/// Fixed-window limiter settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    pub sweep_interval: Duration,
    /// Table size that triggers eviction after a sweep.
    pub max_entries: usize,
    /// Table size eviction trims down to.
    pub evict_to: usize,
    /// Limit clients with no resolvable address under a synthetic key instead of skipping them.
    pub limit_unknown_clients: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            max_entries: 10_000,
            evict_to: 5_000,
            limit_unknown_clients: false,
        }
    }
}

/// Practice details quoted in outgoing email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PracticeProfile {
    pub name: String,
    pub phone: String,
    pub location: String,
}

impl Default for PracticeProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PRACTICE_NAME.into(),
            phone: DEFAULT_PRACTICE_PHONE.into(),
            location: DEFAULT_PRACTICE_LOCATION.into(),
        }
    }
}

/// Hostnames accepted in `Origin`/`Referer` headers: the canonical host plus its bare and
/// `www.` forms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowedHosts {
    canonical: String,
    bare: String,
    www: String,
}

impl AllowedHosts {
    pub fn from_host(host: &str) -> Self {
        let canonical = host.trim().to_ascii_lowercase();
        let bare = canonical
            .strip_prefix("www.")
            .unwrap_or(&canonical)
            .to_string();
        let www = format!("www.{bare}");
        Self {
            canonical,
            bare,
            www,
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.canonical || host == self.bare || host == self.www
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    mode: ExecutionMode,
    base_url: String,
    allowed_hosts: AllowedHosts,
    sender: String,
    practice_inbox: String,
    rate_limit: RateLimitConfig,
    practice: PracticeProfile,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with default sender, limiter and practice profile.
    pub fn new(
        mode: ExecutionMode,
        base_url: &str,
        practice_inbox: impl Into<String>,
    ) -> CoreResult<Self> {
        let (base_url, host) = parse_base_url(base_url)?;

        let practice_inbox = practice_inbox.into().trim().to_string();
        if practice_inbox.is_empty() {
            return Err(CoreError::Config(
                "CONTACT_EMAIL is required (practice inbox for appointment requests)".into(),
            ));
        }

        Ok(Self {
            mode,
            base_url,
            allowed_hosts: AllowedHosts::from_host(&host),
            sender: format!("{DEFAULT_FROM_NAME} <{DEFAULT_FROM_EMAIL}>"),
            practice_inbox,
            rate_limit: RateLimitConfig::default(),
            practice: PracticeProfile::default(),
        })
    }

    /// Resolve configuration from process environment variables.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mode = get("FYL_ENV")
            .map(|v| v.parse::<ExecutionMode>())
            .transpose()?
            .unwrap_or_default();
        let base_url = get("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let inbox = get("CONTACT_EMAIL").unwrap_or_default();

        let mut cfg = Self::new(mode, &base_url, inbox)?;

        cfg.sender = match get("RESEND_FROM") {
            Some(combined) => combined,
            None => {
                let email = get("RESEND_FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM_EMAIL.into());
                let name = get("RESEND_FROM_NAME").unwrap_or_else(|| DEFAULT_FROM_NAME.into());
                format!("{name} <{email}>")
            }
        };

        let mut rate_limit = RateLimitConfig::default();
        if let Some(v) = get("RATE_LIMIT_MAX_REQUESTS") {
            rate_limit.max_requests = parse_number("RATE_LIMIT_MAX_REQUESTS", &v)?;
        }
        if let Some(v) = get("RATE_LIMIT_WINDOW_SECS") {
            rate_limit.window = Duration::from_secs(parse_number("RATE_LIMIT_WINDOW_SECS", &v)?);
        }
        if let Some(v) = get("RATE_LIMIT_UNKNOWN_CLIENTS") {
            rate_limit.limit_unknown_clients = parse_flag("RATE_LIMIT_UNKNOWN_CLIENTS", &v)?;
        }
        cfg = cfg.with_rate_limit(rate_limit)?;

        let defaults = PracticeProfile::default();
        cfg.practice = PracticeProfile {
            name: get("PRACTICE_NAME").unwrap_or(defaults.name),
            phone: get("PRACTICE_PHONE").unwrap_or(defaults.phone),
            location: get("PRACTICE_LOCATION").unwrap_or(defaults.location),
        };

        Ok(cfg)
    }

    /// Replace the limiter settings.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> CoreResult<Self> {
        if rate_limit.max_requests == 0 {
            return Err(CoreError::Config(
                "RATE_LIMIT_MAX_REQUESTS must be at least 1".into(),
            ));
        }
        if rate_limit.window.is_zero() || rate_limit.sweep_interval.is_zero() {
            return Err(CoreError::Config(
                "rate limit window and sweep interval must be non-zero".into(),
            ));
        }
        if rate_limit.evict_to > rate_limit.max_entries {
            return Err(CoreError::Config(
                "rate limit eviction target cannot exceed the table cap".into(),
            ));
        }
        self.rate_limit = rate_limit;
        Ok(self)
    }

    pub fn with_practice(mut self, practice: PracticeProfile) -> Self {
        self.practice = practice;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Canonical base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn allowed_hosts(&self) -> &AllowedHosts {
        &self.allowed_hosts
    }

    /// Sender in `Name <address>` form.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn practice_inbox(&self) -> &str {
        &self.practice_inbox
    }

    pub fn rate_limit(&self) -> &RateLimitConfig {
        &self.rate_limit
    }

    pub fn practice(&self) -> &PracticeProfile {
        &self.practice
    }
}

fn parse_base_url(raw: &str) -> CoreResult<(String, String)> {
    let trimmed = raw.trim().trim_end_matches('/');
    let uri: http::Uri = trimmed
        .parse()
        .map_err(|e| CoreError::Config(format!("BASE_URL is not a valid URL: {e}")))?;

    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        _ => {
            return Err(CoreError::Config(format!(
                "BASE_URL must start with http:// or https://, got '{trimmed}'"
            )))
        }
    }

    let host = uri
        .host()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| CoreError::Config(format!("BASE_URL has no host: '{trimmed}'")))?;

    Ok((trimmed.to_string(), host.to_string()))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> CoreResult<T> {
    value
        .parse()
        .map_err(|_| CoreError::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}

fn parse_flag(key: &str, value: &str) -> CoreResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CoreError::Config(format!(
            "{key} must be true or false, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_applies_defaults() {
        let cfg = CoreConfig::from_lookup(lookup(&[("CONTACT_EMAIL", "inbox@example.org")]))
            .expect("valid config");

        assert_eq!(cfg.mode(), ExecutionMode::Development);
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            cfg.sender(),
            "Find Your Light Psychiatry <noreply@findyourlightpsychiatry.org>"
        );
        assert_eq!(cfg.rate_limit(), &RateLimitConfig::default());
        assert_eq!(cfg.practice(), &PracticeProfile::default());
    }

    #[test]
    fn from_lookup_requires_contact_email() {
        let err = CoreConfig::from_lookup(lookup(&[("CONTACT_EMAIL", "  ")]))
            .expect_err("missing inbox should fail");
        assert!(matches!(err, CoreError::Config(msg) if msg.contains("CONTACT_EMAIL")));
    }

    #[test]
    fn from_lookup_prefers_combined_sender() {
        let cfg = CoreConfig::from_lookup(lookup(&[
            ("CONTACT_EMAIL", "inbox@example.org"),
            ("RESEND_FROM", "Clinic <hello@clinic.example>"),
            ("RESEND_FROM_NAME", "Ignored"),
        ]))
        .unwrap();
        assert_eq!(cfg.sender(), "Clinic <hello@clinic.example>");
    }

    #[test]
    fn from_lookup_builds_sender_from_parts() {
        let cfg = CoreConfig::from_lookup(lookup(&[
            ("CONTACT_EMAIL", "inbox@example.org"),
            ("RESEND_FROM_EMAIL", "front@clinic.example"),
            ("RESEND_FROM_NAME", "Front Desk"),
        ]))
        .unwrap();
        assert_eq!(cfg.sender(), "Front Desk <front@clinic.example>");
    }

    #[test]
    fn from_lookup_reads_mode_and_limits() {
        let cfg = CoreConfig::from_lookup(lookup(&[
            ("CONTACT_EMAIL", "inbox@example.org"),
            ("FYL_ENV", "Production"),
            ("RATE_LIMIT_MAX_REQUESTS", "10"),
            ("RATE_LIMIT_WINDOW_SECS", "60"),
            ("RATE_LIMIT_UNKNOWN_CLIENTS", "true"),
        ]))
        .unwrap();

        assert!(cfg.mode().is_production());
        assert_eq!(cfg.rate_limit().max_requests, 10);
        assert_eq!(cfg.rate_limit().window, Duration::from_secs(60));
        assert!(cfg.rate_limit().limit_unknown_clients);
    }

    #[test]
    fn from_lookup_rejects_bad_values() {
        let base = [("CONTACT_EMAIL", "inbox@example.org")];

        let err = CoreConfig::from_lookup(lookup(&[base[0], ("FYL_ENV", "staging")]))
            .expect_err("unknown mode");
        assert!(matches!(err, CoreError::Config(msg) if msg.contains("FYL_ENV")));

        let err = CoreConfig::from_lookup(lookup(&[base[0], ("RATE_LIMIT_MAX_REQUESTS", "five")]))
            .expect_err("non-numeric limit");
        assert!(matches!(err, CoreError::Config(msg) if msg.contains("RATE_LIMIT_MAX_REQUESTS")));

        let err = CoreConfig::from_lookup(lookup(&[base[0], ("RATE_LIMIT_MAX_REQUESTS", "0")]))
            .expect_err("zero limit");
        assert!(matches!(err, CoreError::Config(msg) if msg.contains("at least 1")));
    }

    #[test]
    fn base_url_must_be_absolute_http() {
        assert!(CoreConfig::new(ExecutionMode::Production, "ftp://example.org", "a@b.org").is_err());
        assert!(CoreConfig::new(ExecutionMode::Production, "not a url", "a@b.org").is_err());

        let cfg =
            CoreConfig::new(ExecutionMode::Production, "https://www.Example.org/", "a@b.org")
                .unwrap();
        assert_eq!(cfg.base_url(), "https://www.Example.org");
        assert_eq!(cfg.allowed_hosts().canonical(), "www.example.org");
    }

    #[test]
    fn allowed_hosts_accept_bare_and_www_forms() {
        let hosts = AllowedHosts::from_host("www.example.org");
        assert!(hosts.contains("www.example.org"));
        assert!(hosts.contains("example.org"));
        assert!(hosts.contains("WWW.EXAMPLE.ORG"));
        assert!(!hosts.contains("evil.example"));
        assert!(!hosts.contains("example.org.evil.example"));

        let hosts = AllowedHosts::from_host("example.org");
        assert!(hosts.contains("www.example.org"));
        assert!(hosts.contains("example.org"));
    }
}
