use async_trait::async_trait;
use chrono::Utc;

use usher_core::{DialogStack, SessionKey, SessionStore, StoreError};

use super::RepositoryError;
use crate::DbPool;

/// Dialog stacks persisted as one JSON document per session, reloaded at
/// the start of each turn and rewritten after it.
pub struct SqlSessionStore {
    pool: DbPool,
}

impl SqlSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_inner(&self, key: &SessionKey) -> Result<Option<DialogStack>, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT stack FROM dialog_session WHERE session_key = ?1")
                .bind(&key.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((raw,)) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|error| RepositoryError::Decode(format!("corrupt dialog stack: {error}"))),
            None => Ok(None),
        }
    }

    async fn save_inner(
        &self,
        key: &SessionKey,
        stack: &DialogStack,
    ) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(stack)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        sqlx::query(
            "INSERT INTO dialog_session (session_key, stack, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(session_key) DO UPDATE SET stack = excluded.stack, \
             updated_at = excluded.updated_at",
        )
        .bind(&key.0)
        .bind(raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<DialogStack>, StoreError> {
        self.load_inner(key).await.map_err(StoreError::from)
    }

    async fn save(&self, key: &SessionKey, stack: &DialogStack) -> Result<(), StoreError> {
        self.save_inner(key, stack).await.map_err(StoreError::from)
    }
}
