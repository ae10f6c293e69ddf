use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Represents the lifecycle state of an email record.
/// Corresponds to the `email_status` SQL enum.
///
/// A record starts at `Draft` and transitions at most once, to either
/// `Sent` or `Failed`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "email_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    /// Record persisted, no delivery attempted yet.
    Draft,
    /// The transport accepted the message.
    Sent,
    /// The transport rejected the message or the send timed out.
    Failed,
}

/// A single recipient: address plus optional display name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// An attachment as declared by the caller. Exactly one source is expected:
/// `path` (a local file or a URL on the asset host) or `content` (raw bytes).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AttachmentInput {
    pub filename: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<u8>>,
    pub content_type: Option<String>,
}

/// The attachment shape persisted on the email record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoredAttachment {
    pub filename: String,
    pub path: Option<String>,
    pub content_type: Option<String>,
}

/// Failure detail recorded when a send attempt ends in `Failed`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SendFailure {
    pub message: String,
    pub code: Option<String>,
    /// Diagnostic detail (debug rendering of the underlying error).
    pub detail: Option<String>,
}

/// One persisted send attempt and its outcome.
///
/// The record is created with status `Draft` before any network send is
/// attempted, so every attempt is durably observable whether it succeeds
/// or fails. It is mutated at most twice: the draft insert, then one
/// terminal write.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmailRecord {
    /// Unique identifier for the record (UUID v4).
    pub id: Uuid,
    /// Identifier of the user who initiated the send.
    pub sender: i32,
    /// Ordered, non-empty list of recipients.
    pub recipients: Vec<Recipient>,
    pub subject: String,
    /// The caller-supplied message content (HTML, or plain text when no
    /// HTML was given). The branded template wrapper is not persisted.
    pub body: String,
    /// Optional project reference for correlation.
    pub project: Option<Uuid>,
    /// Optional client reference for correlation.
    pub client: Option<Uuid>,
    pub status: EmailStatus,
    /// Set at creation, refreshed when the record transitions to `Sent`.
    pub sent_at: DateTime<Utc>,
    /// Provider-assigned identifier, set only on success.
    pub message_id: Option<String>,
    /// Failure detail, set only when the record transitions to `Failed`.
    pub error: Option<SendFailure>,
    pub attachments: Vec<StoredAttachment>,
    pub created_at: DateTime<Utc>,
}

impl EmailRecord {
    /// Creates a new `Draft` record for a validated send request.
    pub fn draft(input: &EmailInput, sender: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sender,
            recipients: input.to.clone(),
            subject: input.subject.clone(),
            body: input
                .html
                .clone()
                .filter(|html| !html.is_empty())
                .or_else(|| input.text.clone())
                .unwrap_or_default(),
            project: input.project,
            client: input.client,
            status: EmailStatus::Draft,
            sent_at: now,
            message_id: None,
            error: None,
            attachments: input
                .attachments
                .iter()
                .map(|file| StoredAttachment {
                    filename: file.filename.clone().unwrap_or_else(|| "attachment".into()),
                    path: file.path.clone(),
                    content_type: file.content_type.clone(),
                })
                .collect(),
            created_at: now,
        }
    }
}

/// Input structure for sending an email.
///
/// The `html`/`text` presence rule (at least one must be non-empty) is
/// enforced by the service before a record is created, since `validator`
/// cannot express cross-field requirements here.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct EmailInput {
    /// Sender address override; defaults to the configured from address.
    pub from: Option<String>,
    /// Sender display name override; defaults to the configured from name.
    pub from_name: Option<String>,

    /// Recipients. Must contain at least one entry.
    #[validate(length(min = 1, message = "At least one recipient is required"))]
    pub to: Vec<Recipient>,

    #[validate(length(min = 1, message = "Email subject is required"))]
    pub subject: String,

    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub project: Option<Uuid>,
    #[serde(default)]
    pub client: Option<Uuid>,

    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

impl EmailInput {
    /// Whether the request carries any message content at all.
    pub fn has_body(&self) -> bool {
        self.html.as_deref().map_or(false, |html| !html.is_empty())
            || self.text.as_deref().map_or(false, |text| !text.is_empty())
    }
}

/// Query parameters for listing a user's emails.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailQuery {
    /// Page size; defaults to 10.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// 1-based page number; defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Optional status filter.
    pub status: Option<EmailStatus>,
}

fn default_limit() -> i64 {
    10
}

fn default_page() -> i64 {
    1
}

impl Default for EmailQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            page: default_page(),
            status: None,
        }
    }
}

/// Pagination envelope returned alongside a listing.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub limit: i64,
}

/// A single page of a user's emails, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailPage {
    pub emails: Vec<EmailRecord>,
    pub pagination: Pagination,
}

/// Result payload of a successful send.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    pub email_id: Uuid,
    pub message_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with(to: Vec<Recipient>, subject: &str) -> EmailInput {
        EmailInput {
            to,
            subject: subject.to_string(),
            html: Some("<p>Hello</p>".to_string()),
            ..EmailInput::default()
        }
    }

    #[test]
    fn test_email_input_validation() {
        let valid = input_with(
            vec![Recipient {
                email: "client@example.com".to_string(),
                name: "Client".to_string(),
            }],
            "Quarterly invoice",
        );
        assert!(valid.validate().is_ok());

        let no_recipients = input_with(vec![], "Quarterly invoice");
        assert!(no_recipients.validate().is_err());

        let no_subject = input_with(
            vec![Recipient {
                email: "client@example.com".to_string(),
                name: String::new(),
            }],
            "",
        );
        assert!(no_subject.validate().is_err());
    }

    #[test]
    fn test_has_body() {
        let mut input = input_with(
            vec![Recipient {
                email: "client@example.com".to_string(),
                name: String::new(),
            }],
            "Subject",
        );
        assert!(input.has_body());

        input.html = None;
        assert!(!input.has_body());

        input.text = Some("plain text".to_string());
        assert!(input.has_body());

        input.text = Some(String::new());
        assert!(!input.has_body());
    }

    #[test]
    fn test_draft_record() {
        let input = EmailInput {
            to: vec![Recipient {
                email: "client@example.com".to_string(),
                name: "Client".to_string(),
            }],
            subject: "Project update".to_string(),
            html: Some("<p>Update</p>".to_string()),
            text: Some("Update".to_string()),
            attachments: vec![AttachmentInput {
                filename: Some("report.pdf".to_string()),
                path: Some("/tmp/report.pdf".to_string()),
                content: None,
                content_type: Some("application/pdf".to_string()),
            }],
            ..EmailInput::default()
        };

        let record = EmailRecord::draft(&input, 42);
        assert_eq!(record.sender, 42);
        assert_eq!(record.status, EmailStatus::Draft);
        assert_eq!(record.body, "<p>Update</p>");
        assert!(record.message_id.is_none());
        assert!(record.error.is_none());
        assert_eq!(record.attachments.len(), 1);
        assert_eq!(record.attachments[0].filename, "report.pdf");
    }

    #[test]
    fn test_draft_record_falls_back_to_text_body() {
        let input = EmailInput {
            to: vec![Recipient {
                email: "client@example.com".to_string(),
                name: String::new(),
            }],
            subject: "Plain".to_string(),
            text: Some("just text".to_string()),
            ..EmailInput::default()
        };

        let record = EmailRecord::draft(&input, 1);
        assert_eq!(record.body, "just text");
    }
}
