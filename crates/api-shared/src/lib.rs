//! # API Shared
//!
//! Wire types for the contact API, shared by the server (`api-rest`) and its clients
//! (`fyl-form`, `fyl-cli`).
//!
//! Contains:
//! - Request and response bodies of `POST /api/contact`
//! - `HealthRes` and the `HealthService` behind `GET /health`

pub mod health;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use health::{HealthRes, HealthService};

/// JSON body of `POST /api/contact` as sent by the contact form.
///
/// The server reads bodies leniently (wrong types count as absent), so this type describes what
/// a well-behaved client sends rather than what the server requires.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactReq {
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// Date of birth, `YYYY-MM-DD`.
    #[schema(example = "1990-05-01")]
    pub dob: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub insurance: String,
    /// `In-Person` or `Telehealth`; anything else is treated as `In-Person`.
    #[serde(default)]
    pub appointment_type: String,
    /// `Email` or `Phone`; anything else is treated as `Email`.
    #[serde(default)]
    pub contact_method: String,
    #[serde(default)]
    pub message: String,
    /// Honeypot. Must be empty.
    #[serde(default)]
    pub website: String,
}

/// Success body. `message` is absent for discarded submissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactSuccessRes {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body for every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    /// Internal detail; only sent outside production.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}
