use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use api_shared::ErrorRes;
use fyl_core::ContactError;

/// Message for failures that have no more specific public wording.
pub const GENERIC_ERROR: &str = "An error occurred. Please try again later.";

/// A [`ContactError`] on its way out as `{error, details?}`.
///
/// `details` is only filled for server-side failures and only when `expose_details` is set,
/// which the router does outside production.
#[derive(Debug)]
pub struct ApiError {
    error: ContactError,
    expose_details: bool,
}

impl ApiError {
    pub fn new(error: ContactError, expose_details: bool) -> Self {
        Self {
            error,
            expose_details,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.error.status_code()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = if self.expose_details && status.is_server_error() {
            self.error.details()
        } else {
            None
        };

        let body = ErrorRes {
            error: self.error.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// `500` body for a handler that panicked.
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorRes::new(GENERIC_ERROR)),
    )
        .into_response()
}
