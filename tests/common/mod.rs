#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mailforge::error::AppError;
use mailforge::mail::{AttachmentFetcher, AttachmentPayload, Mailer, OutgoingEmail, SendReceipt};
use mailforge::models::{EmailInput, Recipient};
use mailforge::services::EmailService;
use mailforge::store::{EmailStore, MemoryEmailStore};
use tempfile::TempDir;
use uuid::Uuid;

/// How the stub transport behaves when asked to send.
pub enum StubBehavior {
    /// Accept the message and hand back a fresh message id.
    Succeed,
    /// Reject the message with a permanent SMTP-style failure.
    Fail,
    /// Sleep before accepting, to lose (or win) the timeout race.
    Delay(Duration),
}

/// In-process stand-in for the SMTP relay.
///
/// Records every accepted message, and snapshots whether file-backed
/// attachment payloads still existed on disk at send time, so tests can
/// prove temp files live through the send and are gone afterwards.
pub struct StubMailer {
    behavior: StubBehavior,
    sent: Mutex<Vec<OutgoingEmail>>,
    files_present_at_send: Mutex<Vec<bool>>,
}

impl StubMailer {
    pub fn new(behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            sent: Mutex::new(Vec::new()),
            files_present_at_send: Mutex::new(Vec::new()),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Runs assertions against the recorded outbox.
    pub fn with_sent<R>(&self, f: impl FnOnce(&[OutgoingEmail]) -> R) -> R {
        f(&self.sent.lock().unwrap())
    }

    pub fn files_present_at_send(&self) -> Vec<bool> {
        self.files_present_at_send.lock().unwrap().clone()
    }

    fn record(&self, email: OutgoingEmail) {
        let mut present = self.files_present_at_send.lock().unwrap();
        for attachment in &email.attachments {
            if let AttachmentPayload::File { path } = &attachment.payload {
                present.push(path.exists());
            }
        }
        drop(present);
        self.sent.lock().unwrap().push(email);
    }
}

#[async_trait]
impl Mailer for StubMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<SendReceipt, AppError> {
        match &self.behavior {
            StubBehavior::Succeed => {
                self.record(email);
                Ok(SendReceipt {
                    message_id: format!("{}@stub.mailforge.dev", Uuid::new_v4()),
                })
            }
            StubBehavior::Fail => Err(AppError::TransportError {
                message: "relay refused the message".into(),
                code: Some("550".into()),
            }),
            StubBehavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                self.record(email);
                Ok(SendReceipt {
                    message_id: format!("{}@stub.mailforge.dev", Uuid::new_v4()),
                })
            }
        }
    }

    async fn test_connection(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// A wired-up service over the in-memory store and the stub transport.
pub struct TestHarness {
    pub service: EmailService,
    pub store: Arc<MemoryEmailStore>,
    pub mailer: Arc<StubMailer>,
    /// Scratch directory handed to the fetcher; dropped with the harness.
    pub temp_dir: TempDir,
}

pub fn harness(behavior: StubBehavior, asset_host: &str, timeout: Duration) -> TestHarness {
    let store = Arc::new(MemoryEmailStore::new());
    let mailer = StubMailer::new(behavior);
    let temp_dir = tempfile::tempdir().expect("Failed to create test temp dir");
    let fetcher = AttachmentFetcher::new(
        reqwest::Client::new(),
        temp_dir.path().to_path_buf(),
        asset_host,
    )
    .expect("Failed to build fetcher");

    let store_boundary: Arc<dyn EmailStore> = store.clone();
    let mailer_boundary: Arc<dyn Mailer> = mailer.clone();
    let service = EmailService::new(
        store_boundary,
        mailer_boundary,
        fetcher,
        "no-reply@mailforge.dev".to_string(),
        "MailForge".to_string(),
        timeout,
    );

    TestHarness {
        service,
        store,
        mailer,
        temp_dir,
    }
}

pub fn recipient(email: &str) -> Recipient {
    Recipient {
        email: email.to_string(),
        name: String::new(),
    }
}

/// A minimal valid send request.
pub fn basic_input() -> EmailInput {
    EmailInput {
        to: vec![recipient("client@example.com")],
        subject: "Project update".to_string(),
        html: Some("<p>hi from the test</p>".to_string()),
        ..EmailInput::default()
    }
}
