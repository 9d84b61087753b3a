//! Typed appointment-request model.
//!
//! An [`AppointmentRequest`] only exists once a submission has passed validation: every
//! free-text field is sanitised, the email is normalised and the enums hold allow-listed
//! values. It lives for the duration of one HTTP request and is never persisted.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_EMAIL_LENGTH;
use crate::ValidationError;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("valid regex")
});

/// A string type that guarantees non-empty, trimmed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Returns `None` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Option<Self> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A trimmed, lower-cased address matching the accepted email grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalised = input.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(ValidationError::EmailRequired);
        }
        if normalised.chars().count() > MAX_EMAIL_LENGTH || !EMAIL_PATTERN.is_match(&normalised) {
            return Err(ValidationError::EmailFormat);
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Preferred appointment format. Anything unrecognised falls back to in-person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentType {
    #[default]
    #[serde(rename = "In-Person")]
    InPerson,
    #[serde(rename = "Telehealth")]
    Telehealth,
}

impl AppointmentType {
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some("Telehealth") => AppointmentType::Telehealth,
            _ => AppointmentType::InPerson,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentType::InPerson => "In-Person",
            AppointmentType::Telehealth => "Telehealth",
        }
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred way for the practice to reply. Anything unrecognised falls back to email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactMethod {
    #[default]
    Email,
    Phone,
}

impl ContactMethod {
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some("Phone") => ContactMethod::Phone,
            _ => ContactMethod::Email,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContactMethod::Email => "Email",
            ContactMethod::Phone => "Phone",
        }
    }
}

impl fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, sanitised appointment request.
///
/// Optional free-text fields are empty strings when not supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRequest {
    /// Correlates log lines and the practice email for one submission.
    pub reference: Uuid,
    pub name: NonEmptyText,
    pub date_of_birth: NaiveDate,
    pub email: EmailAddress,
    pub phone: String,
    pub insurance: String,
    pub appointment_type: AppointmentType,
    pub contact_method: ContactMethod,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

impl AppointmentRequest {
    /// Date of birth as `YYYY-MM-DD`.
    pub fn dob_display(&self) -> String {
        self.date_of_birth.format("%Y-%m-%d").to_string()
    }
}
