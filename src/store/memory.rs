//! In-memory email record store for tests and local development.
//!
//! Keeps records in insertion order; listings walk the vector in reverse,
//! which matches the newest-first ordering of the Postgres store as long as
//! inserts happen in creation order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{EmailRecord, EmailStatus, SendFailure};
use crate::store::EmailStore;

#[derive(Default)]
pub struct MemoryEmailStore {
    records: RwLock<Vec<EmailRecord>>,
}

impl MemoryEmailStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(record: &EmailRecord, sender: i32, status: Option<EmailStatus>) -> bool {
    record.sender == sender && status.map_or(true, |status| record.status == status)
}

#[async_trait]
impl EmailStore for MemoryEmailStore {
    async fn insert(&self, record: &EmailRecord) -> Result<(), AppError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| AppError::NotFound("Email record not found".into()))?;

        record.status = EmailStatus::Sent;
        record.message_id = Some(message_id.to_string());
        record.sent_at = sent_at;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, failure: &SendFailure) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| AppError::NotFound("Email record not found".into()))?;

        record.status = EmailStatus::Failed;
        record.error = Some(failure.clone());
        Ok(())
    }

    async fn list_for_sender(
        &self,
        sender: i32,
        status: Option<EmailStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EmailRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|record| matches(record, sender, status))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_for_sender(
        &self,
        sender: i32,
        status: Option<EmailStatus>,
    ) -> Result<i64, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| matches(record, sender, status))
            .count() as i64)
    }

    async fn find_for_sender(
        &self,
        id: Uuid,
        sender: i32,
    ) -> Result<Option<EmailRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| record.id == id && record.sender == sender)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailInput, Recipient};

    fn record_for(sender: i32, subject: &str) -> EmailRecord {
        let input = EmailInput {
            to: vec![Recipient {
                email: "client@example.com".to_string(),
                name: String::new(),
            }],
            subject: subject.to_string(),
            html: Some("<p>hi</p>".to_string()),
            ..EmailInput::default()
        };
        EmailRecord::draft(&input, sender)
    }

    #[actix_rt::test]
    async fn test_insert_and_transitions() {
        let store = MemoryEmailStore::new();
        let record = record_for(1, "First");
        store.insert(&record).await.unwrap();

        store
            .mark_sent(record.id, "abc@mailforge.dev", Utc::now())
            .await
            .unwrap();

        let stored = store.find_for_sender(record.id, 1).await.unwrap().unwrap();
        assert_eq!(stored.status, EmailStatus::Sent);
        assert_eq!(stored.message_id.as_deref(), Some("abc@mailforge.dev"));

        // Unknown id is reported, not silently ignored.
        let missing = store
            .mark_failed(
                Uuid::new_v4(),
                &SendFailure {
                    message: "boom".into(),
                    code: None,
                    detail: None,
                },
            )
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_listing_is_newest_first_and_scoped_to_sender() {
        let store = MemoryEmailStore::new();
        for i in 1..=3 {
            store
                .insert(&record_for(1, &format!("email-{}", i)))
                .await
                .unwrap();
        }
        store.insert(&record_for(2, "other-user")).await.unwrap();

        let listed = store.list_for_sender(1, None, 10, 0).await.unwrap();
        let subjects: Vec<_> = listed.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["email-3", "email-2", "email-1"]);

        assert_eq!(store.count_for_sender(1, None).await.unwrap(), 3);
        assert_eq!(
            store
                .count_for_sender(1, Some(EmailStatus::Sent))
                .await
                .unwrap(),
            0
        );
    }
}
