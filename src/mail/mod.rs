// src/mail/mod.rs

//! Notification gateway: a raw `Mailer` plus typed senders on top of it.
//! Delivery failures are reported as `false` and logged, never raised.

pub mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;

pub use smtp::SmtpMailer;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one HTML email. Returns whether it was accepted for delivery.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> bool;
}

/// Mailer used when SMTP credentials are not configured.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> bool {
        tracing::warn!(to, subject, "SMTP is not configured, email skipped");
        false
    }
}

pub struct CertificateEmail<'a> {
    pub to: &'a str,
    pub learner_name: &'a str,
    pub course_title: &'a str,
    pub score: i64,
    pub total: i64,
    pub date: &'a str,
    pub trainer_name: Option<&'a str>,
}

pub struct ReminderEmail<'a> {
    pub to: &'a str,
    pub learner_name: &'a str,
    pub course_title: &'a str,
    pub message: &'a str,
    pub sender_name: &'a str,
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn send_verification_code(&self, to: &str, code: &str) -> bool {
        let ok = self
            .mailer
            .send(to, templates::VERIFICATION_SUBJECT, &templates::verification(code))
            .await;
        if !ok {
            tracing::warn!(to, "Verification email not delivered, code falls back to the response");
        }
        ok
    }

    pub async fn send_certificate(&self, email: &CertificateEmail<'_>) -> bool {
        let ok = self
            .mailer
            .send(
                email.to,
                &templates::certificate_subject(email.course_title),
                &templates::certificate(email),
            )
            .await;
        if !ok {
            tracing::warn!(to = email.to, "Certificate email not delivered");
        }
        ok
    }

    pub async fn send_reminder(&self, email: &ReminderEmail<'_>) -> bool {
        self.mailer
            .send(
                email.to,
                &templates::reminder_subject(email.course_title),
                &templates::reminder(email),
            )
            .await
    }

    pub async fn send_test(&self, to: &str) -> bool {
        self.mailer
            .send(to, templates::SMTP_TEST_SUBJECT, templates::SMTP_TEST_BODY)
            .await
    }
}
