//! Delivery of design submissions to the seller.
//!
//! The service composes one [`DesignMessage`] per submission and hands it to a
//! [`DesignMailer`]. SMTP transport lives outside this process: the
//! [`OutboxMailer`] drops each message into a directory for a relay to pick
//! up, and the [`LogMailer`] only records it.

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tshirt_core::DesignSubmission;
use uuid::Uuid;

/// Attachment file name on outgoing messages.
pub const ATTACHMENT_NAME: &str = "design.png";

/// Attachment MIME type.
pub const ATTACHMENT_CONTENT_TYPE: &str = "image/png";

/// Mailer failures.
#[derive(Debug, Error)]
pub enum MailError {
    /// Writing the message failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Message metadata could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The transport refused the message.
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Sender and recipient addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    /// Sender address.
    pub from: String,
    /// Seller address that receives submissions.
    pub to: String,
}

/// A composed submission email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    #[serde(skip)]
    pub html: String,
    /// Attachment file name.
    pub attachment_name: &'static str,
    /// Attachment MIME type.
    pub attachment_content_type: &'static str,
    /// PNG attachment bytes.
    #[serde(skip)]
    pub attachment: Vec<u8>,
}

impl DesignMessage {
    /// Compose the seller notification for a validated submission.
    #[must_use]
    pub fn compose(settings: &MailSettings, submission: &DesignSubmission, png: Vec<u8>) -> Self {
        Self {
            from: settings.from.clone(),
            to: settings.to.clone(),
            subject: submission.subject(),
            html: render_html(submission),
            attachment_name: ATTACHMENT_NAME,
            attachment_content_type: ATTACHMENT_CONTENT_TYPE,
            attachment: png,
        }
    }
}

/// Sends composed messages.
#[async_trait]
pub trait DesignMailer: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &DesignMessage) -> Result<(), MailError>;

    /// Whether the mailer can currently accept messages.
    async fn ready(&self) -> bool {
        true
    }
}

/// Records messages in the log without delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl DesignMailer for LogMailer {
    async fn send(&self, message: &DesignMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            attachment_bytes = message.attachment.len(),
            "Design submission logged (no outbox configured)"
        );
        Ok(())
    }
}

/// Writes each message into its own directory under an outbox root.
///
/// Layout: `<root>/<unix-millis>-<uuid>/{message.html, design.png, meta.json}`.
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    root: PathBuf,
}

impl OutboxMailer {
    /// Create a mailer writing under `root`; the directory is created on demand.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Outbox root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DesignMailer for OutboxMailer {
    async fn send(&self, message: &DesignMessage) -> Result<(), MailError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let dir = self.root.join(format!("{millis}-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;

        tokio::fs::write(dir.join("message.html"), &message.html).await?;
        tokio::fs::write(dir.join(message.attachment_name), &message.attachment).await?;
        tokio::fs::write(dir.join("meta.json"), serde_json::to_vec_pretty(message)?).await?;

        tracing::info!(
            to = %message.to,
            outbox = %dir.display(),
            "Design submission queued"
        );
        Ok(())
    }

    async fn ready(&self) -> bool {
        if tokio::fs::create_dir_all(&self.root).await.is_err() {
            return false;
        }
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }
}

const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 8px;";

fn render_html(submission: &DesignSubmission) -> String {
    let user = &submission.user_details;
    let delivery = &submission.delivery_details;

    let mut html = String::with_capacity(2048);
    html.push_str("<h2>New Design Submission</h2>\n");
    html.push_str("<h3>User Details:</h3>\n");
    write_table(
        &mut html,
        &[
            ("Name", user.name.as_str()),
            ("Email", user.email.as_str()),
            ("Phone", user.phone.as_str()),
            ("Company (Optional)", user.company_or_na()),
        ],
    );
    html.push_str("<h3>Delivery Details:</h3>\n");
    write_table(
        &mut html,
        &[
            ("Address", delivery.address.as_str()),
            ("City", delivery.city.as_str()),
            ("State", delivery.state.as_str()),
            ("Postal Code", delivery.postal_code.as_str()),
            ("Country", delivery.country.as_str()),
        ],
    );
    html.push_str("<h3>Design Submitted</h3>\n");
    html.push_str("<p>The design image is attached to this email.</p>\n");
    html
}

fn write_table(html: &mut String, rows: &[(&str, &str)]) {
    html.push_str(
        "<table style=\"border-collapse: collapse; width: 100%; margin-bottom: 20px;\">\n",
    );
    for (label, value) in rows {
        let _ = writeln!(
            html,
            "<tr><td style=\"{CELL_STYLE} font-weight: bold;\">{label}:</td><td style=\"{CELL_STYLE}\">{}</td></tr>",
            escape_html(value),
        );
    }
    html.push_str("</table>\n");
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
