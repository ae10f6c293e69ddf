//! Mail transport boundary.
//!
//! `Mailer` is the injected seam between the orchestrator and the actual
//! relay, so the service never touches process-wide transport state and
//! tests can substitute a stub. `SmtpMailer` is the production
//! implementation on lettre's async SMTP transport.

use async_trait::async_trait;
use lettre::message::header::{ContentType, MessageId};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::mail::fetch::{AttachmentPayload, ResolvedAttachment};
use crate::models::Recipient;

/// A fully composed message handed to the transport.
#[derive(Debug)]
pub struct OutgoingEmail {
    pub from_email: String,
    pub from_name: String,
    pub to: Vec<Recipient>,
    pub subject: String,
    /// Plain-text alternative body.
    pub text: String,
    /// Rendered HTML body.
    pub html: String,
    pub attachments: Vec<ResolvedAttachment>,
}

/// What the transport reports back on success.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
}

/// One-shot delivery to an SMTP-compatible relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `email`, returning the message identifier on acceptance.
    async fn send(&self, email: OutgoingEmail) -> Result<SendReceipt, AppError>;

    /// Probes the relay connection without sending anything.
    async fn test_connection(&self) -> Result<bool, AppError>;
}

/// Production mailer over a STARTTLS SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    http: reqwest::Client,
    sender_suffix: String,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let creds = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            http: reqwest::Client::new(),
            sender_suffix: "via MailForge".to_string(),
        })
    }

    /// Builds the MIME message plus the Message-ID it was stamped with.
    ///
    /// The Message-ID is generated here rather than trusting the relay to
    /// report one back, so the caller always has an identifier to persist.
    async fn build(&self, email: &OutgoingEmail) -> Result<(Message, String), AppError> {
        let from = Mailbox::new(
            Some(format!("{} {}", email.from_name, self.sender_suffix)),
            email.from_email.parse()?,
        );

        let domain = email.from_email.split('@').nth(1).unwrap_or("mailforge.local");
        let message_id = format!("{}@{}", Uuid::new_v4(), domain);

        let mut builder = Message::builder()
            .from(from)
            .subject(email.subject.clone())
            .header(MessageId::from(message_id.clone()));

        for recipient in &email.to {
            let name = if recipient.name.is_empty() {
                None
            } else {
                Some(recipient.name.clone())
            };
            builder = builder.to(Mailbox::new(name, recipient.email.parse()?));
        }

        let alternative = MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(email.text.clone()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(email.html.clone()),
            );

        let message = if email.attachments.is_empty() {
            builder.multipart(alternative)?
        } else {
            let mut mixed = MultiPart::mixed().multipart(alternative);
            for attachment in &email.attachments {
                mixed = mixed.singlepart(self.attachment_part(attachment).await?);
            }
            builder.multipart(mixed)?
        };

        Ok((message, message_id))
    }

    /// Turns a resolved attachment into a MIME part.
    ///
    /// File payloads are read from disk here, which is why downloaded temp
    /// files must outlive the send. Remote payloads (asset-host images) are
    /// fetched into memory at compose time and embedded by content-id;
    /// failures here fail the send, not the attachment resolution step.
    async fn attachment_part(
        &self,
        attachment: &ResolvedAttachment,
    ) -> Result<SinglePart, AppError> {
        let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
            AppError::TransportError {
                message: format!(
                    "Invalid attachment content type {}: {}",
                    attachment.content_type, e
                ),
                code: None,
            }
        })?;

        match &attachment.payload {
            AttachmentPayload::File { path } => {
                let content = tokio::fs::read(path).await.map_err(|e| {
                    AppError::TransportError {
                        message: format!(
                            "Failed to read attachment {}: {}",
                            path.display(),
                            e
                        ),
                        code: None,
                    }
                })?;
                Ok(Attachment::new(attachment.filename.clone()).body(content, content_type))
            }
            AttachmentPayload::Remote { url } => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(|e| AppError::TransportError {
                        message: format!("Failed to fetch inline attachment {}: {}", url, e),
                        code: None,
                    })?;
                let bytes = response.bytes().await.map_err(|e| AppError::TransportError {
                    message: format!("Failed to fetch inline attachment {}: {}", url, e),
                    code: None,
                })?;
                Ok(Attachment::new_inline(attachment.filename.clone())
                    .body(bytes.to_vec(), content_type))
            }
            AttachmentPayload::Bytes { content } => {
                Ok(Attachment::new(attachment.filename.clone())
                    .body(content.clone(), content_type))
            }
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<SendReceipt, AppError> {
        let (message, message_id) = self.build(&email).await?;
        self.transport.send(message).await?;
        Ok(SendReceipt { message_id })
    }

    async fn test_connection(&self) -> Result<bool, AppError> {
        Ok(self.transport.test_connection().await?)
    }
}
