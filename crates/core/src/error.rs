use http::StatusCode;

/// Startup and configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// A field-level rejection of an appointment request.
///
/// The `Display` text is the exact sentence returned to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,
    #[error("Date of birth is required")]
    DobRequired,
    #[error("Invalid date format. Please use YYYY-MM-DD format.")]
    DobFormat,
    #[error("Invalid date")]
    DobInvalid,
    #[error("Date of birth cannot be in the future")]
    DobInFuture,
    #[error("Email is required")]
    EmailRequired,
    #[error("Invalid email format")]
    EmailFormat,
}

/// Every way a contact submission can be turned away.
///
/// Each variant maps to one HTTP status. `Display` is the public message; internal detail (if
/// any) is only available through [`ContactError::details`].
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("Invalid content type. Expected application/json.")]
    InvalidContentType,
    #[error("Invalid request origin")]
    InvalidOrigin,
    #[error("Too many requests. Please try again later.")]
    RateLimited,
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Request body is empty")]
    EmptyBody,
    #[error("Invalid JSON format")]
    InvalidJson(String),
    #[error("Invalid request format")]
    InvalidShape,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to send your message. Please try again later or contact us directly.")]
    PracticeNotification(#[source] fyl_email::EmailError),
}

impl ContactError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ContactError::InvalidContentType
            | ContactError::EmptyBody
            | ContactError::InvalidJson(_)
            | ContactError::InvalidShape
            | ContactError::Validation(_) => StatusCode::BAD_REQUEST,
            ContactError::InvalidOrigin => StatusCode::FORBIDDEN,
            ContactError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ContactError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ContactError::PracticeNotification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal detail for server-side failures; `None` for client errors.
    ///
    /// Callers decide whether the detail may be shown (only outside production).
    pub fn details(&self) -> Option<String> {
        match self {
            ContactError::PracticeNotification(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests_with_their_own_message() {
        let err = ContactError::from(ValidationError::DobInFuture);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Date of birth cannot be in the future");
        assert!(err.details().is_none());
    }

    #[test]
    fn practice_notification_hides_detail_from_message() {
        let err = ContactError::PracticeNotification(fyl_email::EmailError::NotConfigured);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("RESEND_API_KEY"));
        assert!(err
            .details()
            .is_some_and(|d| d.contains("RESEND_API_KEY")));
    }

    #[test]
    fn abuse_rejections_map_to_distinct_statuses() {
        assert_eq!(ContactError::InvalidOrigin.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ContactError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ContactError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
