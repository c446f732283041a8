// src/mail/templates.rs

use crate::{
    mail::{CertificateEmail, ReminderEmail},
    utils::html::escape_text,
};

pub const VERIFICATION_SUBJECT: &str = "Learning Hub - Confirm your registration";
pub const SMTP_TEST_SUBJECT: &str = "Learning Hub - SMTP test";
pub const SMTP_TEST_BODY: &str =
    r#"<h2 style="color:#003047">SMTP works!</h2><p>Test email from Learning Hub.</p>"#;

fn frame(heading: &str, inner: &str) -> String {
    format!(
        r#"<div style="font-family:Arial,sans-serif;max-width:500px;margin:0 auto">
<div style="background:#003047;padding:20px;text-align:center;border-radius:10px 10px 0 0">
<h2 style="color:#FFE100;margin:0">{heading}</h2></div>
<div style="background:#fff;padding:30px;border:1px solid #eee;border-radius:0 0 10px 10px">
{inner}
<p style="color:#888;font-size:12px">Learning Hub</p></div></div>"#
    )
}

pub fn verification(code: &str) -> String {
    frame(
        "Learning Hub",
        &format!(
            r#"<p>Hello,</p><p>Your verification code:</p>
<div style="background:#F2F2F2;padding:20px;text-align:center;border-radius:8px;margin:20px 0">
<span style="font-size:32px;font-weight:bold;color:#003047;letter-spacing:8px">{}</span></div>
<p style="color:#888;font-size:13px">Enter this code on the verification page to activate your account.</p>"#,
            escape_text(code)
        ),
    )
}

pub fn certificate_subject(course_title: &str) -> String {
    format!("Certificate: {course_title}")
}

pub fn certificate(email: &CertificateEmail<'_>) -> String {
    let trainer = email
        .trainer_name
        .filter(|name| !name.is_empty())
        .map(|name| format!("<p>Trainer: {}</p>", escape_text(name)))
        .unwrap_or_default();
    frame(
        "Certificate of completion",
        &format!(
            r#"<h3 style="color:#003047">Congratulations {name}!</h3>
<p>You have completed:</p>
<div style="background:#F2F2F2;padding:16px;border-radius:8px;margin:16px 0;border-left:4px solid #FFE100">
<strong style="color:#003047;font-size:18px">{course}</strong><br>
<span style="color:#28A745;font-weight:bold">Score: {score}/{total}</span></div>
<p>Date: {date}</p>
{trainer}"#,
            name = escape_text(email.learner_name),
            course = escape_text(email.course_title),
            score = email.score,
            total = email.total,
            date = escape_text(email.date),
        ),
    )
}

pub fn reminder_subject(course_title: &str) -> String {
    format!("Reminder: {course_title}")
}

pub fn reminder(email: &ReminderEmail<'_>) -> String {
    frame(
        "Training reminder",
        &format!(
            r#"<p>Hello <strong>{name}</strong>,</p>
<div style="background:#fff3cd;padding:16px;border-radius:8px;margin:16px 0;border-left:4px solid #FFE100">
<strong style="color:#003047">{course}</strong>
<p style="margin:8px 0 0;color:#555">{message}</p></div>
<p style="color:#888;font-size:12px">Sent by: {sender}</p>"#,
            name = escape_text(email.learner_name),
            course = escape_text(email.course_title),
            message = escape_text(email.message),
            sender = escape_text(email.sender_name),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_contains_code() {
        assert!(verification("123456").contains("123456"));
    }

    #[test]
    fn test_certificate_interpolates_and_escapes() {
        let html = certificate(&CertificateEmail {
            to: "a@corp.com",
            learner_name: "<b>An</b>",
            course_title: "Safety",
            score: 3,
            total: 4,
            date: "04/03/2026",
            trainer_name: Some("Trainer"),
        });
        assert!(html.contains("3/4"));
        assert!(html.contains("Safety"));
        assert!(html.contains("Trainer:"));
        assert!(!html.contains("<b>An</b>"));
    }

    #[test]
    fn test_certificate_without_trainer() {
        let html = certificate(&CertificateEmail {
            to: "a@corp.com",
            learner_name: "An",
            course_title: "Safety",
            score: 4,
            total: 4,
            date: "04/03/2026",
            trainer_name: None,
        });
        assert!(!html.contains("Trainer:"));
    }

    #[test]
    fn test_reminder_contains_message() {
        let html = reminder(&ReminderEmail {
            to: "a@corp.com",
            learner_name: "An",
            course_title: "SOP",
            message: "Please retake the test.",
            sender_name: "Admin",
        });
        assert!(html.contains("Please"));
        assert!(html.contains("SOP"));
    }
}
