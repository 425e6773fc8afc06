use serde::{Deserialize, Serialize};

/// A question submitted for the organizers, keyed by the asker's address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub email: String,
    pub question: String,
}
