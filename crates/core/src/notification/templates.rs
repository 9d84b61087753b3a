//! HTML bodies for the practice notification and the patient confirmation.
//!
//! Every interpolated value goes through [`escape_html`], even though the request has already
//! been sanitised.

use crate::config::{CoreConfig, PracticeProfile};
use crate::constants::CRISIS_LINE;
use crate::sanitize::escape_html;
use crate::submission::AppointmentRequest;

const PRACTICE_STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
.header { background-color: #059669; color: white; padding: 20px; border-radius: 8px 8px 0 0; }
.content { background-color: #f9fafb; padding: 20px; border-radius: 0 0 8px 8px; }
.field { margin-bottom: 15px; }
.label { font-weight: bold; color: #059669; }
.value { margin-top: 5px; padding: 8px; background-color: white; border-radius: 4px; }
.footer { margin-top: 20px; padding-top: 20px; border-top: 1px solid #e5e7eb; font-size: 12px; color: #6b7280; }";

const CONFIRMATION_STYLE: &str = "body { font-family: Georgia, 'Times New Roman', serif; line-height: 1.8; color: #1f2937; margin: 0; background-color: #f9fafb; }
.container { max-width: 600px; margin: 0 auto; background-color: #ffffff; }
.header { background-color: #059669; color: white; padding: 32px 24px; text-align: center; }
.content { padding: 32px 24px; }
.highlight { background-color: #f0fdf4; border-left: 4px solid #059669; padding: 16px 20px; margin: 24px 0; }
.details { margin: 28px 0; padding: 20px; background-color: #f9fafb; border-radius: 8px; }
.urgent { background-color: #fef3c7; border: 1px solid #fbbf24; padding: 16px; margin: 24px 0; color: #92400e; }
.footer { background-color: #f9fafb; padding: 24px; text-align: center; font-size: 12px; color: #6b7280; }";

/// Subject line of the practice notification.
pub fn practice_subject(request: &AppointmentRequest) -> String {
    format!(
        "New Appointment Request from {}",
        escape_html(request.name.as_str())
    )
}

/// Subject line of the patient confirmation.
pub fn confirmation_subject(practice: &PracticeProfile) -> String {
    format!("Appointment Request Confirmed - {}", practice.name)
}

/// Practice notification body. Empty optional fields are left out.
pub fn practice_html(request: &AppointmentRequest) -> String {
    let mut output = String::new();
    output.push_str(&document_head(PRACTICE_STYLE));
    output.push_str("<div class=\"container\">\n");
    output.push_str("<div class=\"header\"><h2>New Appointment Request</h2></div>\n");
    output.push_str("<div class=\"content\">\n");

    output.push_str(&field("Name", request.name.as_str()));
    output.push_str(&field("Date of Birth", &request.dob_display()));
    output.push_str(&field("Email", request.email.as_str()));
    if !request.phone.is_empty() {
        output.push_str(&field("Phone", &request.phone));
    }
    if !request.insurance.is_empty() {
        output.push_str(&field("Insurance", &request.insurance));
    }
    output.push_str(&field("Appointment Type", request.appointment_type.as_str()));
    output.push_str(&field(
        "Preferred Contact Method",
        request.contact_method.as_str(),
    ));
    if !request.message.is_empty() {
        output.push_str(&field("Message", &request.message));
    }

    output.push_str(&format!(
        "<div class=\"footer\"><p>Submitted at: {}</p><p>Reference: {}</p></div>\n",
        request.submitted_at.format("%Y-%m-%d %H:%M:%S UTC"),
        request.reference
    ));
    output.push_str("</div>\n</div>\n</body>\n</html>\n");
    output
}

/// Patient confirmation body.
pub fn confirmation_html(request: &AppointmentRequest, cfg: &CoreConfig) -> String {
    let practice = cfg.practice();
    let practice_name = escape_html(&practice.name);
    let base_url = escape_html(cfg.base_url());
    let site_label = escape_html(cfg.allowed_hosts().canonical());

    let mut output = String::new();
    output.push_str(&document_head(CONFIRMATION_STYLE));
    output.push_str("<div class=\"container\">\n");
    output.push_str(&format!(
        "<div class=\"header\"><h1>{practice_name}</h1></div>\n"
    ));
    output.push_str("<div class=\"content\">\n");

    output.push_str(&format!(
        "<p>Dear {},</p>\n",
        escape_html(request.name.as_str())
    ));
    output.push_str(&format!(
        "<p>Thank you for reaching out to {practice_name}. We have received your appointment \
         request.</p>\n"
    ));

    output.push_str("<div class=\"highlight\">\n<p><strong>What Happens Next</strong></p>\n");
    output.push_str(&format!(
        "<p>Our team will review your request and contact you via {} within 1-2 business days \
         to schedule your {} appointment and discuss next steps.</p>\n</div>\n",
        escape_html(request.contact_method.as_str()),
        escape_html(&request.appointment_type.as_str().to_lowercase())
    ));

    output.push_str("<div class=\"details\">\n<p><strong>Your Request Details:</strong></p>\n");
    output.push_str(&format!(
        "<p>Preferred Appointment Type: {}</p>\n",
        escape_html(request.appointment_type.as_str())
    ));
    output.push_str(&format!(
        "<p>Preferred Contact Method: {}</p>\n",
        escape_html(request.contact_method.as_str())
    ));
    if !request.insurance.is_empty() {
        output.push_str(&format!(
            "<p>Insurance Provider: {}</p>\n",
            escape_html(&request.insurance)
        ));
    }
    output.push_str("</div>\n");

    output.push_str(&format!(
        "<div class=\"urgent\"><p><strong>Important Notice</strong></p>\
         <p>If you are experiencing a mental health emergency or having thoughts of self-harm, \
         please call <strong>{CRISIS_LINE}</strong> (Suicide &amp; Crisis Lifeline) immediately \
         or go to your nearest emergency room. This form is for non-urgent appointment requests \
         only.</p></div>\n"
    ));

    output.push_str(&format!(
        "<p>If you have any questions before we contact you, please visit our website at \
         <a href=\"{base_url}\">{site_label}</a> or call our office at {}.</p>\n",
        escape_html(&practice.phone)
    ));
    output.push_str("</div>\n");

    output.push_str(&format!(
        "<div class=\"footer\"><p><strong>{practice_name}</strong></p><p>{}</p>\
         <p>This is an automated confirmation email. Please do not reply directly to this \
         message.</p></div>\n",
        escape_html(&practice.location)
    ));
    output.push_str("</div>\n</body>\n</html>\n");
    output
}

fn document_head(style: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <style>\n{style}\n</style>\n</head>\n<body>\n"
    )
}

fn field(label: &str, value: &str) -> String {
    format!(
        "<div class=\"field\"><div class=\"label\">{label}:</div>\
         <div class=\"value\">{}</div></div>\n",
        escape_html(value)
    )
}
