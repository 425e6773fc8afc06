use thiserror::Error;

use usher_core::StoreError;

pub mod attendee;
pub mod question;
pub mod session;

pub use attendee::SqlAttendeeDirectory;
pub use question::SqlQuestionInbox;
pub use session::SqlSessionStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        StoreError::Backend(error.to_string())
    }
}
