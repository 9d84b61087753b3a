//! Input validation for appointment requests.
//!
//! Untyped JSON is narrowed once, at the boundary, into [`RawSubmission`]: a field that is not
//! the expected primitive type is treated as absent instead of failing the request. From there
//! [`validate_submission`] applies the field rules in a fixed order (name, date of birth,
//! email) and produces an [`AppointmentRequest`] with every free-text field sanitised.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use crate::sanitize::{sanitize_phone, sanitize_text};
use crate::submission::{
    AppointmentRequest, AppointmentType, ContactMethod, EmailAddress, NonEmptyText,
};
use crate::ValidationError;

static DATE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));

/// A submission body after type narrowing and before any field rule is applied.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawSubmission {
    #[serde(deserialize_with = "string_or_absent")]
    pub name: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    pub dob: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    pub email: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    pub insurance: Option<String>,
    #[serde(rename = "appointmentType", deserialize_with = "string_or_absent")]
    pub appointment_type: Option<String>,
    #[serde(rename = "contactMethod", deserialize_with = "string_or_absent")]
    pub contact_method: Option<String>,
    #[serde(deserialize_with = "string_or_absent")]
    pub message: Option<String>,
    /// Whether the honeypot field carried anything.
    #[serde(rename = "website", deserialize_with = "honeypot_filled")]
    pub honeypot_filled: bool,
}

impl RawSubmission {
    /// Narrow a parsed JSON object. Returns `None` for anything that is not an object.
    pub fn from_json(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

fn string_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Blank strings, `null` and `false` leave the honeypot empty; any other value fills it.
fn honeypot_filled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

/// Apply the field rules and build a sanitised [`AppointmentRequest`].
///
/// `today` bounds the date of birth (a birth date equal to `today` is accepted).
///
/// # Errors
///
/// Returns the first [`ValidationError`] in the order name, date of birth, email.
pub fn validate_submission(
    raw: RawSubmission,
    today: NaiveDate,
    submitted_at: DateTime<Utc>,
) -> Result<AppointmentRequest, ValidationError> {
    let raw_name = raw.name.unwrap_or_default();
    if raw_name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }

    let date_of_birth = validate_dob(raw.dob.as_deref().unwrap_or_default(), today)?;
    let email = EmailAddress::parse(raw.email.as_deref().unwrap_or_default())?;

    // Markup-only names sanitise to nothing.
    let name = NonEmptyText::new(sanitize_text(&raw_name)).ok_or(ValidationError::NameRequired)?;

    Ok(AppointmentRequest {
        reference: Uuid::new_v4(),
        name,
        date_of_birth,
        email,
        phone: raw.phone.as_deref().map(sanitize_phone).unwrap_or_default(),
        insurance: raw.insurance.as_deref().map(sanitize_text).unwrap_or_default(),
        appointment_type: AppointmentType::from_field(raw.appointment_type.as_deref()),
        contact_method: ContactMethod::from_field(raw.contact_method.as_deref()),
        message: raw.message.as_deref().map(sanitize_text).unwrap_or_default(),
        submitted_at,
    })
}

fn validate_dob(dob: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if dob.trim().is_empty() {
        return Err(ValidationError::DobRequired);
    }
    if !DATE_FORMAT.is_match(dob) {
        return Err(ValidationError::DobFormat);
    }
    let date =
        NaiveDate::parse_from_str(dob, "%Y-%m-%d").map_err(|_| ValidationError::DobInvalid)?;
    if date > today {
        return Err(ValidationError::DobInFuture);
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn raw(value: Value) -> RawSubmission {
        RawSubmission::from_json(value).expect("object")
    }

    fn valid() -> Value {
        json!({
            "name": "Jane Doe",
            "dob": "1990-05-01",
            "email": "JANE@Example.com",
            "appointmentType": "Telehealth",
            "contactMethod": "Email",
            "message": "<script>x</script>Hi",
            "website": ""
        })
    }

    fn validate(value: Value) -> Result<AppointmentRequest, ValidationError> {
        validate_submission(raw(value), today(), now())
    }

    #[test]
    fn accepts_and_normalises_a_valid_submission() {
        let req = validate(valid()).expect("valid submission");
        assert_eq!(req.name.as_str(), "Jane Doe");
        assert_eq!(req.dob_display(), "1990-05-01");
        assert_eq!(req.email.as_str(), "jane@example.com");
        assert_eq!(req.appointment_type, AppointmentType::Telehealth);
        assert_eq!(req.contact_method, ContactMethod::Email);
        assert_eq!(req.message, "Hi");
        assert_eq!(req.phone, "");
        assert_eq!(req.insurance, "");
        assert_eq!(req.submitted_at, now());
    }

    #[test]
    fn wrong_types_are_treated_as_absent() {
        let parsed = raw(json!({
            "name": 42,
            "dob": ["1990-05-01"],
            "email": {"address": "a@b.co"},
            "appointmentType": true,
            "phone": null
        }));
        assert_eq!(parsed, RawSubmission::default());

        let err = validate(json!({"name": 42})).expect_err("name is not a string");
        assert_eq!(err, ValidationError::NameRequired);
    }

    #[test]
    fn non_objects_are_not_submissions() {
        assert!(RawSubmission::from_json(json!([1, 2])).is_none());
        assert!(RawSubmission::from_json(json!("text")).is_none());
        assert!(RawSubmission::from_json(Value::Null).is_none());
    }

    #[test]
    fn honeypot_detection() {
        assert!(!raw(json!({})).honeypot_filled);
        assert!(!raw(json!({"website": "  "})).honeypot_filled);
        assert!(!raw(json!({"website": null})).honeypot_filled);
        assert!(raw(json!({"website": "http://spam.example"})).honeypot_filled);
        assert!(raw(json!({"website": 1})).honeypot_filled);
    }

    #[test]
    fn name_is_required() {
        let mut body = valid();
        body["name"] = json!("   ");
        assert_eq!(validate(body).unwrap_err(), ValidationError::NameRequired);

        let mut body = valid();
        body["name"] = json!("<b></b>");
        assert_eq!(validate(body).unwrap_err(), ValidationError::NameRequired);
    }

    #[test]
    fn dob_rules_apply_in_order() {
        let cases = [
            ("", ValidationError::DobRequired),
            ("01/05/1990", ValidationError::DobFormat),
            ("1990-5-1", ValidationError::DobFormat),
            (" 1990-05-01", ValidationError::DobFormat),
            ("١٩٩٠-٠٥-٠١", ValidationError::DobFormat),
            ("2024-02-30", ValidationError::DobInvalid),
            ("2023-13-01", ValidationError::DobInvalid),
            ("2026-10-17", ValidationError::DobInFuture),
        ];
        for (dob, expected) in cases {
            let mut body = valid();
            body["dob"] = json!(dob);
            assert_eq!(validate(body).unwrap_err(), expected, "dob {dob:?}");
        }
    }

    #[test]
    fn dob_of_today_and_leap_day_are_accepted() {
        let mut body = valid();
        body["dob"] = json!("2026-10-16");
        assert!(validate(body).is_ok());

        let mut body = valid();
        body["dob"] = json!("2024-02-29");
        assert!(validate(body).is_ok());
    }

    #[test]
    fn name_is_checked_before_dob_and_dob_before_email() {
        let err = validate(json!({"email": "bad"})).unwrap_err();
        assert_eq!(err, ValidationError::NameRequired);

        let err = validate(json!({"name": "A", "email": "bad"})).unwrap_err();
        assert_eq!(err, ValidationError::DobRequired);

        let err = validate(json!({"name": "A", "dob": "1990-01-01"})).unwrap_err();
        assert_eq!(err, ValidationError::EmailRequired);
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut body = valid();
        body["email"] = json!("not-an-email");
        assert_eq!(validate(body).unwrap_err(), ValidationError::EmailFormat);
    }

    #[test]
    fn unknown_enum_values_fall_back_silently() {
        let mut body = valid();
        body["appointmentType"] = json!("Carrier pigeon");
        body["contactMethod"] = json!("Fax");
        let req = validate(body).expect("advisory fields never fail");
        assert_eq!(req.appointment_type, AppointmentType::InPerson);
        assert_eq!(req.contact_method, ContactMethod::Email);
    }

    #[test]
    fn optional_fields_are_sanitised() {
        let mut body = valid();
        body["phone"] = json!("(206) 555-1234 <i>cell</i>");
        body["insurance"] = json!("  Premera \"Blue\" ");
        body["name"] = json!("Jane <b onclick=x>Doe</b>");
        let req = validate(body).unwrap();
        assert_eq!(req.phone, "(206) 555-1234");
        assert_eq!(req.insurance, "Premera Blue");
        assert_eq!(req.name.as_str(), "Jane Doe");
    }
}
