//! Postgres-backed email record store.
//!
//! Document-shaped fields (recipients, attachments, failure detail) live in
//! JSONB columns; everything the listing filters or sorts on is a plain
//! column. See `migrations/0001_create_emails.sql` for the schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{EmailRecord, EmailStatus, Recipient, SendFailure, StoredAttachment};
use crate::store::EmailStore;

const EMAIL_COLUMNS: &str = "id, sender, recipients, subject, body, project, client, status, \
     sent_at, message_id, error, attachments, created_at";

pub struct PgEmailStore {
    pool: PgPool,
}

impl PgEmailStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape bridging JSONB columns to the domain model.
#[derive(sqlx::FromRow)]
struct EmailRow {
    id: Uuid,
    sender: i32,
    recipients: Json<Vec<Recipient>>,
    subject: String,
    body: String,
    project: Option<Uuid>,
    client: Option<Uuid>,
    status: EmailStatus,
    sent_at: DateTime<Utc>,
    message_id: Option<String>,
    error: Option<Json<SendFailure>>,
    attachments: Json<Vec<StoredAttachment>>,
    created_at: DateTime<Utc>,
}

impl From<EmailRow> for EmailRecord {
    fn from(row: EmailRow) -> Self {
        Self {
            id: row.id,
            sender: row.sender,
            recipients: row.recipients.0,
            subject: row.subject,
            body: row.body,
            project: row.project,
            client: row.client,
            status: row.status,
            sent_at: row.sent_at,
            message_id: row.message_id,
            error: row.error.map(|error| error.0),
            attachments: row.attachments.0,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl EmailStore for PgEmailStore {
    async fn insert(&self, record: &EmailRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO emails (id, sender, recipients, subject, body, project, client, status, \
             sent_at, message_id, error, attachments, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(record.id)
        .bind(record.sender)
        .bind(Json(&record.recipients))
        .bind(&record.subject)
        .bind(&record.body)
        .bind(record.project)
        .bind(record.client)
        .bind(record.status)
        .bind(record.sent_at)
        .bind(&record.message_id)
        .bind(record.error.as_ref().map(Json))
        .bind(Json(&record.attachments))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE emails SET status = $2, message_id = $3, sent_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(EmailStatus::Sent)
        .bind(message_id)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Email record not found".into()));
        }

        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, failure: &SendFailure) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE emails SET status = $2, error = $3 WHERE id = $1")
            .bind(id)
            .bind(EmailStatus::Failed)
            .bind(Json(failure))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Email record not found".into()));
        }

        Ok(())
    }

    async fn list_for_sender(
        &self,
        sender: i32,
        status: Option<EmailStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EmailRecord>, AppError> {
        // Status filter is appended dynamically, keeping the parameter
        // numbering straight for both query shapes.
        let mut sql = format!("SELECT {} FROM emails WHERE sender = $1", EMAIL_COLUMNS);
        if status.is_some() {
            sql.push_str(" AND status = $4");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT $2 OFFSET $3");

        let mut query = sqlx::query_as::<_, EmailRow>(&sql)
            .bind(sender)
            .bind(limit)
            .bind(offset);
        if let Some(status) = status {
            query = query.bind(status);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(EmailRecord::from).collect())
    }

    async fn count_for_sender(
        &self,
        sender: i32,
        status: Option<EmailStatus>,
    ) -> Result<i64, AppError> {
        let mut sql = String::from("SELECT COUNT(*) FROM emails WHERE sender = $1");
        if status.is_some() {
            sql.push_str(" AND status = $2");
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(sender);
        if let Some(status) = status {
            query = query.bind(status);
        }

        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn find_for_sender(
        &self,
        id: Uuid,
        sender: i32,
    ) -> Result<Option<EmailRecord>, AppError> {
        let row = sqlx::query_as::<_, EmailRow>(&format!(
            "SELECT {} FROM emails WHERE id = $1 AND sender = $2",
            EMAIL_COLUMNS
        ))
        .bind(id)
        .bind(sender)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmailRecord::from))
    }
}
