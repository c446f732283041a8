// src/mail/smtp.rs

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};

use crate::{config::SmtpConfig, mail::Mailer};

const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP delivery over lettre.
///
/// Each send tries STARTTLS on the configured port, then implicit TLS on 465,
/// then an unencrypted session, stopping at the first success.
pub struct SmtpMailer {
    config: SmtpConfig,
}

#[derive(Debug, Clone, Copy)]
enum Method {
    StartTls,
    ImplicitTls,
    Plain,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, to: &str, subject: &str, html_body: &str) -> Option<Message> {
        let from: Mailbox = match self.config.from.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::error!(from = %self.config.from, "Invalid SMTP_FROM address: {}", e);
                return None;
            }
        };
        let to: Mailbox = match to.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!(to, "Invalid recipient address: {}", e);
                return None;
            }
        };
        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| tracing::error!("Failed to build email: {}", e))
            .ok()
    }

    fn transport(&self, method: Method) -> Result<AsyncSmtpTransport<Tokio1Executor>, SmtpError> {
        let builder = match method {
            Method::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.server)?
                    .port(self.config.port)
            }
            Method::ImplicitTls => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.server)?
                    .port(IMPLICIT_TLS_PORT)
            }
            Method::Plain => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.server)
                .port(self.config.port),
        };
        Ok(builder
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.pass.clone(),
            ))
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> bool {
        if !self.config.is_configured() {
            tracing::warn!(to, subject, "SMTP_USER or SMTP_PASS not set, email skipped");
            return false;
        }
        let Some(message) = self.build_message(to, subject, html_body) else {
            return false;
        };

        for method in [Method::StartTls, Method::ImplicitTls, Method::Plain] {
            let outcome = match self.transport(method) {
                Ok(transport) => transport.send(message.clone()).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => {
                    tracing::info!(to, ?method, "Email sent");
                    return true;
                }
                Err(e) => tracing::warn!(to, ?method, "SMTP delivery attempt failed: {}", e),
            }
        }

        tracing::error!(to, "All SMTP delivery methods failed");
        false
    }
}
