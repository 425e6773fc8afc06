use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use usher_core::{AttendeeDirectory, AttendeeRecord, RsvpStatus, StoreError};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlAttendeeDirectory {
    pool: DbPool,
}

impl SqlAttendeeDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn upsert_inner(&self, record: AttendeeRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO attendee (email, name, agency, interests, rsvp, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(email) DO UPDATE SET name = excluded.name, \
             agency = excluded.agency, interests = excluded.interests, \
             rsvp = excluded.rsvp, updated_at = excluded.updated_at",
        )
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.agency)
        .bind(&record.interests)
        .bind(record.rsvp.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_inner(&self, email: &str) -> Result<Option<AttendeeRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT email, name, agency, interests, rsvp FROM attendee WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(decode_record).transpose()
    }

    async fn replace_inner(&self, record: AttendeeRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE attendee SET name = ?2, agency = ?3, interests = ?4, rsvp = ?5, \
             updated_at = ?6 WHERE email = ?1",
        )
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.agency)
        .bind(&record.interests)
        .bind(record.rsvp.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Decode(format!(
                "no attendee record to replace for {}",
                record.email
            )));
        }
        Ok(())
    }
}

fn decode_record(row: sqlx::sqlite::SqliteRow) -> Result<AttendeeRecord, RepositoryError> {
    let rsvp: String = row.get("rsvp");
    let rsvp = rsvp.parse::<RsvpStatus>().map_err(RepositoryError::Decode)?;

    Ok(AttendeeRecord {
        email: row.get("email"),
        name: row.get("name"),
        agency: row.get("agency"),
        interests: row.get("interests"),
        rsvp,
    })
}

#[async_trait]
impl AttendeeDirectory for SqlAttendeeDirectory {
    async fn upsert(&self, record: AttendeeRecord) -> Result<(), StoreError> {
        self.upsert_inner(record).await.map_err(StoreError::from)
    }

    async fn find(&self, email: &str) -> Result<Option<AttendeeRecord>, StoreError> {
        self.find_inner(email).await.map_err(StoreError::from)
    }

    async fn replace(&self, record: AttendeeRecord) -> Result<(), StoreError> {
        self.replace_inner(record).await.map_err(StoreError::from)
    }
}
