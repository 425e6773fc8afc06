use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::dialog::stack::DialogStack;
use crate::domain::{AttendeeRecord, QuestionRecord, SessionKey};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Persists one dialog stack per session between turns. `save` is called
/// exactly once per turn, after all synchronous step chaining completes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &SessionKey) -> Result<Option<DialogStack>, StoreError>;
    async fn save(&self, key: &SessionKey, stack: &DialogStack) -> Result<(), StoreError>;
}

/// The committed-record collaborator: upsert on registration, read-modify-
/// replace on cancellation.
#[async_trait]
pub trait AttendeeDirectory: Send + Sync {
    async fn upsert(&self, record: AttendeeRecord) -> Result<(), StoreError>;
    async fn find(&self, email: &str) -> Result<Option<AttendeeRecord>, StoreError>;
    async fn replace(&self, record: AttendeeRecord) -> Result<(), StoreError>;
}

#[async_trait]
pub trait QuestionInbox: Send + Sync {
    async fn submit(&self, record: QuestionRecord) -> Result<(), StoreError>;
}

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, DialogStack>>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<DialogStack>, StoreError> {
        let sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(sessions.get(&key.0).cloned())
    }

    async fn save(&self, key: &SessionKey, stack: &DialogStack) -> Result<(), StoreError> {
        let mut sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.insert(key.0.clone(), stack.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAttendeeDirectory {
    records: Arc<Mutex<HashMap<String, AttendeeRecord>>>,
}

impl InMemoryAttendeeDirectory {
    pub fn record(&self, email: &str) -> Option<AttendeeRecord> {
        let records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.get(email).cloned()
    }
}

#[async_trait]
impl AttendeeDirectory for InMemoryAttendeeDirectory {
    async fn upsert(&self, record: AttendeeRecord) -> Result<(), StoreError> {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.insert(record.email.clone(), record);
        Ok(())
    }

    async fn find(&self, email: &str) -> Result<Option<AttendeeRecord>, StoreError> {
        Ok(self.record(email))
    }

    async fn replace(&self, record: AttendeeRecord) -> Result<(), StoreError> {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !records.contains_key(&record.email) {
            return Err(StoreError::Backend(format!(
                "no attendee record to replace for {}",
                record.email
            )));
        }
        records.insert(record.email.clone(), record);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryQuestionInbox {
    questions: Arc<Mutex<Vec<QuestionRecord>>>,
}

impl InMemoryQuestionInbox {
    pub fn submitted(&self) -> Vec<QuestionRecord> {
        match self.questions.lock() {
            Ok(questions) => questions.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl QuestionInbox for InMemoryQuestionInbox {
    async fn submit(&self, record: QuestionRecord) -> Result<(), StoreError> {
        match self.questions.lock() {
            Ok(mut questions) => questions.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AttendeeDirectory, InMemoryAttendeeDirectory, InMemorySessionStore, SessionStore,
        StoreError,
    };
    use crate::dialog::stack::{DialogFrame, DialogStack};
    use crate::domain::{AttendeeRecord, RsvpStatus, SessionKey};

    fn record(email: &str) -> AttendeeRecord {
        AttendeeRecord {
            email: email.to_string(),
            name: "Ada Li".to_string(),
            agency: Some("Acme".to_string()),
            interests: Some("AI".to_string()),
            rsvp: RsvpStatus::Yes,
        }
    }

    #[tokio::test]
    async fn session_store_round_trips_a_stack() {
        let store = InMemorySessionStore::default();
        let key = SessionKey("user-1".to_string());
        let mut stack = DialogStack::new();
        stack.push(DialogFrame::root());

        store.save(&key, &stack).await.expect("save stack");
        let loaded = store.load(&key).await.expect("load stack");

        assert_eq!(loaded, Some(stack));
        assert_eq!(store.load(&SessionKey("user-2".to_string())).await.expect("load"), None);
    }

    #[tokio::test]
    async fn directory_replace_requires_an_existing_record() {
        let directory = InMemoryAttendeeDirectory::default();
        let missing = directory.replace(record("ada@example.com")).await;
        assert!(matches!(missing, Err(StoreError::Backend(_))));

        directory.upsert(record("ada@example.com")).await.expect("upsert");
        let mut updated = record("ada@example.com");
        updated.rsvp = RsvpStatus::No;
        directory.replace(updated.clone()).await.expect("replace");

        assert_eq!(directory.record("ada@example.com"), Some(updated));
    }
}
