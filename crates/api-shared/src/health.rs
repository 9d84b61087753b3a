use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Health check shared by every server entry point.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static check; no instance needed.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "FYL contact API is alive".into(),
        }
    }
}
