//! Constants used throughout the core crate.
//!
//! Limits, field names and user-facing fallback strings live here so the guard chain, the
//! validator and the API layer agree on them.

/// JSON field name of the honeypot input. Humans never see it; bots tend to fill it.
pub const HONEYPOT_FIELD: &str = "website";

/// Maximum accepted request body, in bytes (1 MiB).
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Maximum length of any sanitised free-text field, in characters.
pub const MAX_FIELD_LENGTH: usize = 5000;

/// Maximum length of an email address, in characters.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Client identity used when no forwarding header carries an address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Modulus applied to the millisecond clock when synthesising keys for unknown clients.
pub const UNKNOWN_CLIENT_BUCKETS: i64 = 10_000;

/// Message returned to the submitter once the practice has been notified.
pub const SUCCESS_MESSAGE: &str = "Thank you for your request. We will contact you soon.";

/// Default canonical site URL.
pub const DEFAULT_BASE_URL: &str = "https://www.findyourlightpsychiatry.org";

/// Default sender address when `RESEND_FROM` is not set.
pub const DEFAULT_FROM_EMAIL: &str = "noreply@findyourlightpsychiatry.org";

/// Default sender display name when `RESEND_FROM` is not set.
pub const DEFAULT_FROM_NAME: &str = "Find Your Light Psychiatry";

pub const DEFAULT_PRACTICE_NAME: &str = "Find Your Light Psychiatry PLLC";
pub const DEFAULT_PRACTICE_PHONE: &str = "(206) 555-1234";
pub const DEFAULT_PRACTICE_LOCATION: &str = "Seattle, Washington";

/// National suicide and crisis line, quoted in the confirmation email.
pub const CRISIS_LINE: &str = "988";
