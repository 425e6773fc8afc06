use async_trait::async_trait;
use chrono::Utc;

use usher_core::{QuestionInbox, QuestionRecord, StoreError};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlQuestionInbox {
    pool: DbPool,
}

impl SqlQuestionInbox {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn submit_inner(&self, record: QuestionRecord) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO question (email, question, submitted_at) VALUES (?1, ?2, ?3)")
            .bind(&record.email)
            .bind(&record.question)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionInbox for SqlQuestionInbox {
    async fn submit(&self, record: QuestionRecord) -> Result<(), StoreError> {
        self.submit_inner(record).await.map_err(StoreError::from)
    }
}
