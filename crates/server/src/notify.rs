use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use usher_core::{NotificationEvent, NotificationSink, NotifyError};

/// Delivers organizer notifications as JSON webhook posts. One payload per
/// event, no retries: the dispatcher treats delivery as fire-and-forget and
/// retry policy belongs to the receiving side.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    sender: String,
    recipient: String,
}

impl WebhookNotifier {
    pub fn new(url: String, sender: String, recipient: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, url, sender, recipient }
    }

    fn payload(&self, event: &NotificationEvent) -> Value {
        let (subject, body) = match event {
            NotificationEvent::Registration(record) => (
                "New User Registration",
                json!({
                    "email": record.email,
                    "name": record.name,
                    "agency": record.agency,
                    "interests": record.interests,
                    "rsvp": record.rsvp.as_str(),
                }),
            ),
            NotificationEvent::Cancellation { email, name } => (
                "RSVP Cancellation",
                json!({
                    "email": email,
                    "name": name,
                    "rsvp": "no",
                }),
            ),
            NotificationEvent::Question(record) => (
                "New Question",
                json!({
                    "email": record.email,
                    "question": record.question,
                }),
            ),
        };

        json!({
            "kind": event.kind(),
            "subject": subject,
            "from": self.sender,
            "to": self.recipient,
            "body": body,
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn notify(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        let payload = self.payload(&event);
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|failure| NotifyError::Delivery(failure.to_string()))?;

        response
            .error_for_status()
            .map_err(|failure| NotifyError::Delivery(failure.to_string()))?;
        Ok(())
    }
}

/// Stands in when no webhook URL is configured: events are logged at debug
/// level and dropped.
pub struct DisabledNotificationSink;

#[async_trait]
impl NotificationSink for DisabledNotificationSink {
    async fn notify(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        debug!(kind = event.kind(), "notifications disabled; event dropped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use usher_core::{AttendeeRecord, NotificationEvent, QuestionRecord, RsvpStatus};

    use super::WebhookNotifier;

    fn notifier() -> WebhookNotifier {
        WebhookNotifier::new(
            "https://example.com/hook".to_string(),
            "Usher <noreply@example.com>".to_string(),
            "organizers@example.com".to_string(),
        )
    }

    #[test]
    fn registration_payload_carries_the_record_fields() {
        let payload = notifier().payload(&NotificationEvent::Registration(AttendeeRecord {
            email: "ada@example.com".to_string(),
            name: "Ada Li".to_string(),
            agency: Some("Acme".to_string()),
            interests: Some("AI".to_string()),
            rsvp: RsvpStatus::Yes,
        }));

        assert_eq!(payload["kind"], "registration");
        assert_eq!(payload["subject"], "New User Registration");
        assert_eq!(payload["body"]["email"], "ada@example.com");
        assert_eq!(payload["body"]["agency"], "Acme");
        assert_eq!(payload["body"]["rsvp"], "yes");
    }

    #[test]
    fn cancellation_payload_marks_rsvp_no() {
        let payload = notifier().payload(&NotificationEvent::Cancellation {
            email: "ada@example.com".to_string(),
            name: "Ada Li".to_string(),
        });

        assert_eq!(payload["subject"], "RSVP Cancellation");
        assert_eq!(payload["body"]["rsvp"], "no");
    }

    #[test]
    fn question_payload_carries_the_question_text() {
        let payload = notifier().payload(&NotificationEvent::Question(QuestionRecord {
            email: "ada@example.com".to_string(),
            question: "Is there parking?".to_string(),
        }));

        assert_eq!(payload["subject"], "New Question");
        assert_eq!(payload["body"]["question"], "Is there parking?");
    }
}
