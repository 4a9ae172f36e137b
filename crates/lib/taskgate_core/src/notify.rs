//! Outbound e-mail.
//!
//! The core only needs "send this message"; delivery is best effort and a
//! failure never undoes state that was already persisted (e.g. a reset token).

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

/// Subject line of the password-reset mail.
pub const RESET_SUBJECT: &str = "Password Reset (Valid for 1 hour)";

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// A message ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// E-mail delivery seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError>;
}

/// Build the password-reset mail for `to`, linking to
/// `{app_url}/auth/set-new-password?token=<secret>`.
pub fn password_reset_message(
    app_url: &str,
    to: &str,
    secret: &str,
) -> Result<OutgoingMessage, NotifyError> {
    let base = app_url.trim_end_matches('/');
    let mut link = Url::parse(&format!("{base}/auth/set-new-password"))
        .map_err(|e| NotifyError::InvalidAddress(format!("app url: {e}")))?;
    link.query_pairs_mut().append_pair("token", secret);
    Ok(OutgoingMessage {
        to: to.to_string(),
        subject: RESET_SUBJECT.to_string(),
        html: format!("<p>Click <a href=\"{link}\">here</a> to reset your password.</p>"),
    })
}

/// Logs deliveries without their body. Default when no relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), NotifyError> {
        info!(to, subject, "mail delivery skipped (no relay configured)");
        Ok(())
    }
}

/// Posts `{to, subject, html}` as JSON to a mail relay endpoint.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpMailer {
    pub fn new(endpoint: &str) -> Result<Self, NotifyError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| NotifyError::InvalidAddress(format!("relay: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        let message = OutgoingMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html_body.to_string(),
        };
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "relay responded {}",
                resp.status()
            )));
        }
        info!(to, subject, "mail handed to relay");
        Ok(())
    }
}

/// Keeps sent messages in memory. Can be switched to fail every send.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<OutgoingMessage>>,
    failing: bool,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with `Delivery`.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Delivery("outbox configured to fail".into()));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| NotifyError::Delivery("outbox lock poisoned".into()))?;
        sent.push(OutgoingMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html_body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_message_links_to_app() {
        let msg = password_reset_message("https://app.example.com/", "a@b.com", "abc123").unwrap();
        assert_eq!(msg.subject, RESET_SUBJECT);
        assert!(
            msg.html
                .contains("https://app.example.com/auth/set-new-password?token=abc123")
        );
    }

    #[test]
    fn reset_message_rejects_bad_base() {
        assert!(password_reset_message("not a url", "a@b.com", "x").is_err());
    }

    #[tokio::test]
    async fn outbox_records_messages() {
        let outbox = OutboxMailer::new();
        outbox.send("a@b.com", "hi", "<p>x</p>").await.unwrap();
        assert_eq!(outbox.sent().len(), 1);
        assert!(OutboxMailer::failing().send("a@b.com", "hi", "").await.is_err());
    }
}
