//! Email send orchestration.
//!
//! `EmailService` composes the fetcher, template renderer, transport, and
//! record store. Both the store and the transport are injected, so nothing
//! in here reaches for process-wide state.
//!
//! Lifecycle of one send: validate, persist a draft record, render, resolve
//! attachments (tolerating per-attachment failures), race the transport
//! send against the configured timeout, write the terminal record state,
//! release temp files, and return or propagate.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempPath;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::AppError;
use crate::mail::fetch::AttachmentFetcher;
use crate::mail::template;
use crate::mail::transport::{Mailer, OutgoingEmail, SendReceipt};
use crate::models::{
    EmailInput, EmailPage, EmailQuery, EmailRecord, Pagination, SendFailure, SendOutcome,
};
use crate::store::EmailStore;

const FOOTER_TEXT: &str = "This email was sent from MailForge CRM.";

#[derive(Clone)]
pub struct EmailService {
    store: Arc<dyn EmailStore>,
    mailer: Arc<dyn Mailer>,
    fetcher: AttachmentFetcher,
    from_email: String,
    from_name: String,
    send_timeout: Duration,
}

impl EmailService {
    pub fn new(
        store: Arc<dyn EmailStore>,
        mailer: Arc<dyn Mailer>,
        fetcher: AttachmentFetcher,
        from_email: String,
        from_name: String,
        send_timeout: Duration,
    ) -> Self {
        Self {
            store,
            mailer,
            fetcher,
            from_email,
            from_name,
            send_timeout,
        }
    }

    /// Wires a service from configuration, building the attachment fetcher
    /// on a fresh HTTP client.
    pub fn from_config(
        store: Arc<dyn EmailStore>,
        mailer: Arc<dyn Mailer>,
        config: &Config,
    ) -> Result<Self, AppError> {
        let fetcher = AttachmentFetcher::new(
            reqwest::Client::new(),
            config.temp_dir.clone(),
            config.asset_host.clone(),
        )?;
        Ok(Self::new(
            store,
            mailer,
            fetcher,
            config.from_email.clone(),
            config.from_name.clone(),
            config.send_timeout,
        ))
    }

    /// Sends one email and records the attempt.
    ///
    /// Validation failures surface before any record exists. Once the draft
    /// is persisted, every outcome of this attempt is durably observable:
    /// the record transitions to `Sent` or `Failed` exactly once. A failure
    /// to write the `Failed` state is logged and swallowed so it never
    /// shadows the send error itself.
    pub async fn send_email(
        &self,
        sender: i32,
        input: EmailInput,
    ) -> Result<SendOutcome, AppError> {
        input.validate()?;
        if !input.has_body() {
            return Err(AppError::ValidationError("Email content is required".into()));
        }

        let record = EmailRecord::draft(&input, sender);
        self.store.insert(&record).await?;
        log::info!("Email record {} created for user {}", record.id, sender);

        match self.deliver(&record, &input).await {
            Ok(receipt) => {
                self.store
                    .mark_sent(record.id, &receipt.message_id, Utc::now())
                    .await?;
                log::info!(
                    "Email {} sent, message id {}",
                    record.id,
                    receipt.message_id
                );
                Ok(SendOutcome {
                    success: true,
                    email_id: record.id,
                    message_id: receipt.message_id,
                })
            }
            Err(error) => {
                log::error!("Email {} failed: {}", record.id, error);
                let failure = failure_detail(&error);
                if let Err(update_error) = self.store.mark_failed(record.id, &failure).await {
                    // Never mask the send error with a bookkeeping one.
                    log::error!(
                        "Failed to record send failure for {}: {}",
                        record.id,
                        update_error
                    );
                }
                Err(error)
            }
        }
    }

    /// Renders, resolves attachments, and races the transport send against
    /// the timeout. All temp-file release actions run before this returns,
    /// whichever way the race settles.
    async fn deliver(
        &self,
        record: &EmailRecord,
        input: &EmailInput,
    ) -> Result<SendReceipt, AppError> {
        let from_email = input
            .from
            .clone()
            .unwrap_or_else(|| self.from_email.clone());
        let from_name = input
            .from_name
            .clone()
            .unwrap_or_else(|| self.from_name.clone());

        let rendered = template::render_message(&from_name, &record.body, Some(FOOTER_TEXT));
        let text = input
            .text
            .clone()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| template::strip_tags(input.html.as_deref().unwrap_or("")));

        // Resolve attachments one by one; a failure skips that attachment
        // without aborting the send.
        let mut attachments = Vec::new();
        for declared in &input.attachments {
            match self.fetcher.resolve(declared).await {
                Ok(resolved) => attachments.push(resolved),
                Err(error) => {
                    log::warn!("Skipping attachment for email {}: {}", record.id, error)
                }
            }
        }

        // Take the release actions out of the payloads before they move
        // into the spawned send, so cleanup stays on this side of the race.
        let temp_files: Vec<TempPath> = attachments
            .iter_mut()
            .filter_map(|attachment| attachment.temp.take())
            .collect();

        let outgoing = OutgoingEmail {
            from_email,
            from_name,
            to: record.recipients.clone(),
            subject: record.subject.clone(),
            text,
            html: rendered,
            attachments,
        };

        // First-of(send, timer). The send runs on its own task: when the
        // timer wins, the transport call is abandoned, not cancelled, and
        // may still settle in the background. Its late result is ignored;
        // a late file read against an already released temp file fails
        // late, which callers of an abandoned send must tolerate.
        let mailer = Arc::clone(&self.mailer);
        let send = tokio::spawn(async move { mailer.send(outgoing).await });

        let result = match tokio::time::timeout(self.send_timeout, send).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(AppError::InternalServerError(format!(
                "Send task failed: {}",
                join_error
            ))),
            Err(_) => {
                log::warn!(
                    "Email {} send still running after {}s; abandoning it",
                    record.id,
                    self.send_timeout.as_secs()
                );
                Err(AppError::TimeoutError(format!(
                    "Email sending timed out after {} seconds",
                    self.send_timeout.as_secs()
                )))
            }
        };

        release_temp_files(temp_files);
        result
    }

    /// Paginated listing of a user's emails, newest first.
    pub async fn user_emails(&self, sender: i32, query: EmailQuery) -> Result<EmailPage, AppError> {
        let limit = query.limit.max(1);
        let page = query.page.max(1);
        let offset = (page - 1) * limit;

        let emails = self
            .store
            .list_for_sender(sender, query.status, limit, offset)
            .await?;
        let total = self.store.count_for_sender(sender, query.status).await?;
        let pages = (total + limit - 1) / limit;

        Ok(EmailPage {
            emails,
            pagination: Pagination {
                total,
                page,
                pages,
                limit,
            },
        })
    }

    /// Fetches one email with an ownership check. A missing record and a
    /// foreign record are indistinguishable to the caller.
    pub async fn email_by_id(&self, id: Uuid, sender: i32) -> Result<EmailRecord, AppError> {
        self.store
            .find_for_sender(id, sender)
            .await?
            .ok_or_else(|| AppError::NotFound("Email not found or access denied".into()))
    }

    /// Probes the configured transport.
    pub async fn test_connection(&self) -> Result<bool, AppError> {
        self.mailer.test_connection().await
    }
}

/// Flattens a send error into the shape persisted on the record.
fn failure_detail(error: &AppError) -> SendFailure {
    let (message, code) = match error {
        AppError::TransportError { message, code } => (message.clone(), code.clone()),
        AppError::TimeoutError(message) => (message.clone(), Some("timeout".to_string())),
        other => (other.to_string(), None),
    };
    SendFailure {
        message,
        code,
        detail: Some(format!("{:?}", error)),
    }
}

fn release_temp_files(temp_files: Vec<TempPath>) {
    for temp in temp_files {
        if let Err(error) = temp.close() {
            log::warn!("Failed to remove attachment temp file: {}", error);
        }
    }
}
