//! # FYL Form
//!
//! The contact form as a state machine, independent of any UI toolkit.
//!
//! `Idle -> Submitting -> Success | Error`. Local validation mirrors the server's required-field
//! and format rules so obvious mistakes never cost a round trip. The honeypot is not a field of
//! [`FormFields`] at all: every payload built here carries it empty.

#![warn(rust_2018_idioms)]

mod transport;

pub use transport::{ContactTransport, HttpTransport, TransportError, TransportResponse};

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use api_shared::ContactReq;

pub const SUCCESS_FALLBACK: &str = "Thank you for your request. We will contact you soon.";
pub const ERROR_FALLBACK: &str = "An error occurred. Please try again later.";
pub const NETWORK_ERROR: &str = "Network error. Please check your connection and try again.";

pub const DEFAULT_APPOINTMENT_TYPE: &str = "In-Person";
pub const DEFAULT_CONTACT_METHOD: &str = "Email";

static DATE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Editable inputs of the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Name,
    Dob,
    Email,
    Phone,
    Insurance,
    AppointmentType,
    ContactMethod,
    Message,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub dob: String,
    pub email: String,
    pub phone: String,
    pub insurance: String,
    pub appointment_type: String,
    pub contact_method: String,
    pub message: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            dob: String::new(),
            email: String::new(),
            phone: String::new(),
            insurance: String::new(),
            appointment_type: DEFAULT_APPOINTMENT_TYPE.into(),
            contact_method: DEFAULT_CONTACT_METHOD.into(),
            message: String::new(),
        }
    }
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Dob => &self.dob,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Insurance => &self.insurance,
            Field::AppointmentType => &self.appointment_type,
            Field::ContactMethod => &self.contact_method,
            Field::Message => &self.message,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Dob => &mut self.dob,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::Insurance => &mut self.insurance,
            Field::AppointmentType => &mut self.appointment_type,
            Field::ContactMethod => &mut self.contact_method,
            Field::Message => &mut self.message,
        }
    }

    /// Wire payload. The honeypot is always empty.
    pub fn to_request(&self) -> ContactReq {
        ContactReq {
            name: self.name.clone(),
            dob: self.dob.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            insurance: self.insurance.clone(),
            appointment_type: self.appointment_type.clone(),
            contact_method: self.contact_method.clone(),
            message: self.message.clone(),
            website: String::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Clone, Debug, Default)]
pub struct ContactForm {
    fields: FormFields,
    errors: BTreeMap<Field, String>,
    status: SubmissionStatus,
    status_message: Option<String>,
}

impl ContactForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.status != SubmissionStatus::Submitting
    }

    /// Update one field and clear its error. The status banner is left as it is.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        *self.fields.slot(field) = value.into();
        self.errors.remove(&field);
    }

    /// Run the local checks and replace the error map. Returns `true` if nothing failed.
    pub fn validate(&mut self) -> bool {
        let mut errors = BTreeMap::new();
        let f = &self.fields;

        if f.name.trim().is_empty() {
            errors.insert(Field::Name, "Name is required".to_string());
        }

        if f.dob.trim().is_empty() {
            errors.insert(Field::Dob, "Date of birth is required".to_string());
        } else if !DATE_FORMAT.is_match(&f.dob) {
            errors.insert(Field::Dob, "Invalid date format (YYYY-MM-DD)".to_string());
        }

        if f.email.trim().is_empty() {
            errors.insert(Field::Email, "Email is required".to_string());
        } else if !EMAIL_SHAPE.is_match(&f.email) {
            errors.insert(Field::Email, "Invalid email format".to_string());
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    /// Start a submission.
    ///
    /// Clears the previous banner and validates. Returns the payload to send and moves to
    /// `Submitting`, or returns `None` (no network call should be made) when validation fails
    /// or a submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<ContactReq> {
        if self.status == SubmissionStatus::Submitting {
            return None;
        }
        self.status = SubmissionStatus::Idle;
        self.status_message = None;

        if !self.validate() {
            return None;
        }

        self.status = SubmissionStatus::Submitting;
        Some(self.fields.to_request())
    }

    /// Apply the server's answer to a submission started with [`ContactForm::begin_submit`].
    pub fn finish_submit(&mut self, outcome: Result<TransportResponse, TransportError>) {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("contact submission failed: {}", e);
                self.fail(NETWORK_ERROR.to_string());
                return;
            }
        };

        let Some(body) = response.body.as_ref() else {
            self.fail(ERROR_FALLBACK.to_string());
            return;
        };

        let accepted = body.get("success").and_then(|v| v.as_bool()) == Some(true);
        if response.is_success() && accepted {
            let message = body
                .get("message")
                .and_then(|v| v.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(SUCCESS_FALLBACK);
            self.status = SubmissionStatus::Success;
            self.status_message = Some(message.to_string());
            self.fields = FormFields::default();
            self.errors.clear();
        } else {
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(ERROR_FALLBACK);
            self.fail(message.to_string());
        }
    }

    /// Validate, send through `transport` and record the outcome.
    ///
    /// Returns the resulting status; a local validation failure leaves the form `Idle`.
    pub async fn submit(&mut self, transport: &dyn ContactTransport) -> SubmissionStatus {
        let Some(request) = self.begin_submit() else {
            return self.status;
        };
        let outcome = transport.post_contact(&request).await;
        self.finish_submit(outcome);
        self.status
    }

    fn fail(&mut self, message: String) {
        self.status = SubmissionStatus::Error;
        self.status_message = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays one canned outcome and records what was sent.
    struct FakeTransport {
        reply: Mutex<Option<Result<TransportResponse, TransportError>>>,
        sent: Mutex<Vec<ContactReq>>,
    }

    impl FakeTransport {
        fn replying(reply: Result<TransportResponse, TransportError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn json(status: u16, body: serde_json::Value) -> Self {
            Self::replying(Ok(TransportResponse {
                status,
                body: Some(body),
            }))
        }

        fn sent(&self) -> Vec<ContactReq> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContactTransport for FakeTransport {
        async fn post_contact(
            &self,
            request: &ContactReq,
        ) -> Result<TransportResponse, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .expect("one reply per test")
        }
    }

    fn filled_form() -> ContactForm {
        let mut form = ContactForm::new();
        form.edit(Field::Name, "Jane Doe");
        form.edit(Field::Dob, "1990-05-01");
        form.edit(Field::Email, "jane@example.com");
        form.edit(Field::AppointmentType, "Telehealth");
        form
    }

    #[test]
    fn new_form_starts_idle_with_defaults() {
        let form = ContactForm::new();
        assert_eq!(form.status(), SubmissionStatus::Idle);
        assert!(form.is_submit_enabled());
        assert_eq!(form.fields().get(Field::AppointmentType), "In-Person");
        assert_eq!(form.fields().get(Field::ContactMethod), "Email");
    }

    #[test]
    fn local_validation_blocks_submission() {
        let mut form = ContactForm::new();
        form.edit(Field::Dob, "01/05/1990");
        form.edit(Field::Email, "jane@example");

        assert!(form.begin_submit().is_none());
        assert_eq!(form.status(), SubmissionStatus::Idle);
        assert_eq!(form.error(Field::Name), Some("Name is required"));
        assert_eq!(form.error(Field::Dob), Some("Invalid date format (YYYY-MM-DD)"));
        assert_eq!(form.error(Field::Email), Some("Invalid email format"));
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let mut form = ContactForm::new();
        form.validate();
        assert_eq!(form.errors().len(), 3);

        form.edit(Field::Name, "J");
        assert!(form.error(Field::Name).is_none());
        assert_eq!(form.error(Field::Dob), Some("Date of birth is required"));
        assert_eq!(form.error(Field::Email), Some("Email is required"));
    }

    #[test]
    fn begin_submit_disables_the_control_and_empties_the_honeypot() {
        let mut form = filled_form();
        let request = form.begin_submit().expect("valid form");

        assert_eq!(form.status(), SubmissionStatus::Submitting);
        assert!(!form.is_submit_enabled());
        assert_eq!(request.website, "");
        assert_eq!(request.appointment_type, "Telehealth");
        assert!(form.begin_submit().is_none(), "no double submission");
    }

    #[tokio::test]
    async fn success_shows_server_message_and_resets_fields() {
        let mut form = filled_form();
        let transport = FakeTransport::json(200, json!({"success": true, "message": "Got it."}));

        assert_eq!(form.submit(&transport).await, SubmissionStatus::Success);
        assert_eq!(form.status_message(), Some("Got it."));
        assert_eq!(form.fields(), &FormFields::default());
        assert_eq!(transport.sent().len(), 1);
        assert!(form.is_submit_enabled());
    }

    #[tokio::test]
    async fn success_without_message_uses_fallback() {
        let mut form = filled_form();
        let transport = FakeTransport::json(200, json!({"success": true}));
        form.submit(&transport).await;
        assert_eq!(form.status_message(), Some(SUCCESS_FALLBACK));
    }

    #[tokio::test]
    async fn server_error_message_is_shown_and_fields_kept() {
        let mut form = filled_form();
        let transport = FakeTransport::json(
            429,
            json!({"error": "Too many requests. Please try again later."}),
        );

        assert_eq!(form.submit(&transport).await, SubmissionStatus::Error);
        assert_eq!(
            form.status_message(),
            Some("Too many requests. Please try again later.")
        );
        assert_eq!(form.fields().get(Field::Name), "Jane Doe");
    }

    #[tokio::test]
    async fn falsy_success_is_an_error() {
        let mut form = filled_form();
        let transport = FakeTransport::json(200, json!({"success": false}));
        assert_eq!(form.submit(&transport).await, SubmissionStatus::Error);
        assert_eq!(form.status_message(), Some(ERROR_FALLBACK));
    }

    #[tokio::test]
    async fn non_json_response_is_a_generic_error() {
        let mut form = filled_form();
        let transport = FakeTransport::replying(Ok(TransportResponse {
            status: 502,
            body: None,
        }));
        assert_eq!(form.submit(&transport).await, SubmissionStatus::Error);
        assert_eq!(form.status_message(), Some(ERROR_FALLBACK));
    }

    #[tokio::test]
    async fn network_failure_has_its_own_message() {
        let mut form = filled_form();
        let transport =
            FakeTransport::replying(Err(TransportError::Network("connection refused".into())));
        assert_eq!(form.submit(&transport).await, SubmissionStatus::Error);
        assert_eq!(form.status_message(), Some(NETWORK_ERROR));
    }

    #[tokio::test]
    async fn invalid_form_makes_no_network_call() {
        let mut form = ContactForm::new();
        let transport = FakeTransport::json(200, json!({"success": true}));
        assert_eq!(form.submit(&transport).await, SubmissionStatus::Idle);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn banner_persists_across_edits_until_next_submit() {
        let mut form = filled_form();
        let transport = FakeTransport::json(500, json!({"error": "Failed to send your message."}));
        form.submit(&transport).await;

        form.edit(Field::Message, "hello");
        assert_eq!(form.status(), SubmissionStatus::Error);

        form.edit(Field::Name, "");
        assert!(form.begin_submit().is_none());
        assert_eq!(form.status(), SubmissionStatus::Idle);
        assert!(form.status_message().is_none());
    }
}
