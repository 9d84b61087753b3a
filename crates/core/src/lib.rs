//! # FYL Core
//!
//! Core logic for the practice contact endpoint.
//!
//! This crate takes one buffered HTTP request (headers and body) and decides what happens to it:
//! - Guard chain: content type, origin, rate limit, size, JSON shape, honeypot
//! - Validation and sanitisation into a typed [`AppointmentRequest`]
//! - Notification dispatch: mandatory practice email, best-effort confirmation
//!
//! **No HTTP server concerns**: routing, status-to-response mapping, CORS and headers belong in
//! `api-rest`; outbound email transport belongs in `fyl-email`.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod guard;
pub mod notification;
pub mod rate_limit;
pub mod sanitize;
pub mod service;
pub mod submission;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AllowedHosts, CoreConfig, ExecutionMode, PracticeProfile, RateLimitConfig};
pub use error::{ContactError, CoreError, CoreResult, ValidationError};
pub use guard::{ClientIdentity, RequestGuard, Screened};
pub use notification::{DispatchReport, NotificationDispatcher};
pub use rate_limit::{RateLimit, RateLimitRecord, RateLimiter};
pub use service::{ContactOutcome, ContactService};
pub use submission::{AppointmentRequest, AppointmentType, ContactMethod, EmailAddress, NonEmptyText};
pub use validation::{validate_submission, RawSubmission};
