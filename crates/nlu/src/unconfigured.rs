use async_trait::async_trait;

use usher_core::nlu::{ClassificationResult, ClassifyError, IntentClassifier};

/// Stands in when no provider is configured. The engine checks
/// `is_configured()` before classifying and routes every request down the
/// registration path, so `classify` is never reached in practice.
#[derive(Clone, Debug, Default)]
pub struct UnconfiguredClassifier;

#[async_trait]
impl IntentClassifier for UnconfiguredClassifier {
    fn is_configured(&self) -> bool {
        false
    }

    async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassifyError> {
        Ok(ClassificationResult::unknown())
    }
}

#[cfg(test)]
mod tests {
    use super::UnconfiguredClassifier;
    use usher_core::nlu::{Intent, IntentClassifier};

    #[tokio::test]
    async fn reports_itself_unconfigured() {
        let classifier = UnconfiguredClassifier;
        assert!(!classifier.is_configured());
        let result = classifier.classify("rsvp").await.expect("classify");
        assert_eq!(result.intent, Intent::Unknown);
    }
}
