//! Mail transport seam

use async_trait::async_trait;
use serde::Serialize;

use reportctl_core::EmailConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    /// Grafana user IDs of the report group members, not addresses.
    /// A delivering mailer resolves them to email addresses.
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport rejected message: {0}")]
    Rejected(String),

    #[error("mail account not configured: {0}")]
    NotConfigured(&'static str),
}

/// Delivers a composed email using the stored account settings.
///
/// Recipients arrive as Grafana user IDs (see [`Email::to`]); address lookup
/// belongs to the implementation.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, account: &EmailConfig, email: &Email) -> Result<(), MailError>;
}

/// Writes outgoing mail to the log instead of an SMTP server.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, account: &EmailConfig, email: &Email) -> Result<(), MailError> {
        if account.host.is_empty() {
            return Err(MailError::NotConfigured("emailHost"));
        }

        tracing::info!(
            host = %account.host,
            port = account.port,
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            "Email dispatched"
        );
        tracing::debug!(body = %email.body, "Email body");
        Ok(())
    }
}
