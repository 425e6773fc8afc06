use async_trait::async_trait;
use tracing::warn;

use crate::dialog::capture::CaptureKind;
use crate::dialog::engine::{InteractionDefinition, StepContext};
use crate::dialog::interactions::cancellation_fields;
use crate::dialog::stack::{FrameData, InteractionId};
use crate::dialog::step::{
    CompletionTag, OutgoingMessage, SideEffect, StepResult, StepValue, TurnOutcome,
};
use crate::errors::EngineError;

/// The RSVP-cancellation waterfall: confirm, then flip the stored record to
/// "not going".
pub struct CancellationInteraction;

#[async_trait]
impl InteractionDefinition for CancellationInteraction {
    fn id(&self) -> InteractionId {
        InteractionId::Cancellation
    }

    fn step_count(&self) -> usize {
        2
    }

    async fn run_step(
        &self,
        index: usize,
        frame: &mut FrameData,
        previous: StepValue,
        turn: &mut TurnOutcome,
        _ctx: &StepContext<'_>,
    ) -> Result<StepResult, EngineError> {
        let fields = cancellation_fields(frame)?;
        match index {
            0 => Ok(StepResult::AwaitInput {
                prompt: OutgoingMessage::expecting("Are you sure you want to cancel your RSVP?"),
                capture: CaptureKind::YesNo,
            }),
            1 => {
                if previous != StepValue::Confirmation(true) {
                    return Ok(StepResult::EndFrame(None));
                }
                match &fields.attendee {
                    Some(attendee) => {
                        turn.record(SideEffect::RecordCancellation { attendee: attendee.clone() });
                    }
                    None => warn!(
                        "cancellation confirmed without an attendee identity; no record committed"
                    ),
                }
                Ok(StepResult::EndFrame(Some(StepValue::Completed(CompletionTag::Cancelled))))
            }
            _ => Err(EngineError::StepIndexOutOfRange {
                interaction: InteractionId::Cancellation,
                index,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::CancellationInteraction;
    use crate::config::EventConfig;
    use crate::dialog::engine::{InteractionDefinition, StepContext};
    use crate::dialog::stack::{CancellationFields, FrameData};
    use crate::dialog::step::{CompletionTag, SideEffect, StepResult, StepValue, TurnOutcome};
    use crate::domain::{AttendeeIdentity, UserProfile};
    use crate::nlu::{ClassificationResult, ClassifyError, IntentClassifier};

    struct NoopClassifier;

    #[async_trait]
    impl IntentClassifier for NoopClassifier {
        async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassifyError> {
            Ok(ClassificationResult::unknown())
        }
    }

    #[tokio::test]
    async fn confirmed_cancellation_emits_the_effect_and_tag() {
        let profile = UserProfile {
            address: "ada@example.com".to_string(),
            display_name: "Ada Li".to_string(),
        };
        let event = EventConfig {
            name: "the Horizon Symposium".to_string(),
            venue: "Meridian".to_string(),
            schedule: "April 8th".to_string(),
            attendees_url: "https://example.com/a".to_string(),
            calendar_url: "https://example.com/c".to_string(),
        };
        let classifier = NoopClassifier;
        let ctx = StepContext {
            profile: &profile,
            classifier: &classifier,
            event: &event,
            min_confidence: 0.5,
        };
        let interaction = CancellationInteraction;
        let mut data = FrameData::Cancellation(CancellationFields {
            attendee: Some(AttendeeIdentity {
                email: "ada@example.com".to_string(),
                display_name: "Ada Li".to_string(),
            }),
        });
        let mut turn = TurnOutcome::default();

        let result = interaction
            .run_step(1, &mut data, StepValue::Confirmation(true), &mut turn, &ctx)
            .await
            .expect("run final step");

        assert_eq!(
            result,
            StepResult::EndFrame(Some(StepValue::Completed(CompletionTag::Cancelled)))
        );
        assert!(matches!(turn.effects[0], SideEffect::RecordCancellation { .. }));
    }
}
