use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of intents the root interaction routes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Rsvp,
    CancelRsvp,
    Question,
    Greeting,
    EventDetails,
    Participants,
    AddToCalendar,
    Unknown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub confidence: f64,
    pub entities: HashMap<String, String>,
}

impl ClassificationResult {
    pub fn new(intent: Intent, confidence: f64) -> Self {
        Self { intent, confidence, entities: HashMap::new() }
    }

    pub fn unknown() -> Self {
        Self::new(Intent::Unknown, 0.0)
    }

    pub fn with_entity(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities.insert(key.into(), value.into());
        self
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("classifier provider failure: {0}")]
    Provider(String),
}

/// The NLU collaborator seam. The engine treats classification as an opaque
/// text -> {intent, confidence, entities} function and tolerates an
/// unconfigured provider by always selecting the registration interaction.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    fn is_configured(&self) -> bool {
        true
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError>;
}
