//! Email record persistence boundary.
//!
//! One record per send attempt. The trait deliberately offers only the two
//! terminal writes (`mark_sent`, `mark_failed`) besides the draft insert,
//! so a record cannot be mutated past its single draft → terminal
//! transition through this interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{EmailRecord, EmailStatus, SendFailure};

pub mod memory;
pub mod postgres;

pub use memory::MemoryEmailStore;
pub use postgres::PgEmailStore;

#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Persists a freshly created draft record.
    async fn insert(&self, record: &EmailRecord) -> Result<(), AppError>;

    /// Transitions a record to `Sent`, storing the provider message id and
    /// the refreshed send timestamp.
    async fn mark_sent(
        &self,
        id: Uuid,
        message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Transitions a record to `Failed`, storing the failure detail.
    async fn mark_failed(&self, id: Uuid, failure: &SendFailure) -> Result<(), AppError>;

    /// Lists a sender's records newest first, optionally filtered by status.
    async fn list_for_sender(
        &self,
        sender: i32,
        status: Option<EmailStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EmailRecord>, AppError>;

    /// Counts a sender's records under the same filter as `list_for_sender`.
    async fn count_for_sender(
        &self,
        sender: i32,
        status: Option<EmailStatus>,
    ) -> Result<i64, AppError>;

    /// Fetches one record if it exists and belongs to `sender`.
    async fn find_for_sender(
        &self,
        id: Uuid,
        sender: i32,
    ) -> Result<Option<EmailRecord>, AppError>;
}
