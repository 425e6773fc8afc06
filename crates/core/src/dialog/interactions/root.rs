use async_trait::async_trait;
use tracing::warn;

use crate::dialog::capture::CaptureKind;
use crate::dialog::engine::{InteractionDefinition, StepContext};
use crate::dialog::interactions::root_fields;
use crate::dialog::stack::{
    CancellationFields, DialogFrame, FrameData, InteractionId, QuestionFields, RegistrationFields,
};
use crate::dialog::step::{CompletionTag, OutgoingMessage, StepResult, StepValue, TurnOutcome};
use crate::domain::AttendeeIdentity;
use crate::errors::EngineError;
use crate::nlu::{ClassificationResult, Intent};

/// The session-long root interaction: render the idle prompt, classify the
/// reply, start the matching child interaction, confirm its result, loop.
/// The root frame is never popped; completing a pass restarts it.
pub struct RootInteraction;

#[async_trait]
impl InteractionDefinition for RootInteraction {
    fn id(&self) -> InteractionId {
        InteractionId::Root
    }

    fn step_count(&self) -> usize {
        3
    }

    async fn run_step(
        &self,
        index: usize,
        frame: &mut FrameData,
        previous: StepValue,
        turn: &mut TurnOutcome,
        ctx: &StepContext<'_>,
    ) -> Result<StepResult, EngineError> {
        match index {
            0 => self.intro_step(frame, turn, ctx),
            1 => self.act_step(previous, turn, ctx).await,
            2 => self.final_step(frame, previous, turn, ctx),
            _ => Err(EngineError::StepIndexOutOfRange { interaction: InteractionId::Root, index }),
        }
    }
}

impl RootInteraction {
    fn intro_step(
        &self,
        frame: &mut FrameData,
        turn: &mut TurnOutcome,
        ctx: &StepContext<'_>,
    ) -> Result<StepResult, EngineError> {
        if !ctx.classifier.is_configured() {
            turn.say(OutgoingMessage::ignoring(
                "NOTE: intent classification is not configured. Every request will run the \
                 registration path.",
            ));
            return Ok(StepResult::PassToNext(StepValue::None));
        }

        let fields = root_fields(frame)?;
        let text = if fields.restarted {
            "If you wish to do anything else, please give me a command.".to_string()
        } else {
            format!(
                "Hi, {}! How can I help you? You can say: RSVP, Cancel my RSVP, See who's \
                 attending, When and where is the event, Add the event to my calendar, or \
                 Question for the organizers.",
                ctx.profile.display_name
            )
        };

        Ok(StepResult::AwaitInput {
            prompt: OutgoingMessage::expecting(text),
            capture: CaptureKind::FreeText,
        })
    }

    async fn act_step(
        &self,
        previous: StepValue,
        turn: &mut TurnOutcome,
        ctx: &StepContext<'_>,
    ) -> Result<StepResult, EngineError> {
        let attendee = AttendeeIdentity::from_profile(ctx.profile);

        if !ctx.classifier.is_configured() {
            return Ok(StepResult::BeginChild(registration_frame(attendee)));
        }

        let StepValue::Text(text) = previous else {
            // Nothing classifiable was captured; fall through to the final
            // step, which restarts the idle prompt.
            return Ok(StepResult::PassToNext(StepValue::None));
        };

        let classification = match ctx.classifier.classify(&text).await {
            Ok(classification) => classification,
            Err(error) => {
                warn!(
                    error = %error,
                    "intent classification failed; treating turn as not understood"
                );
                ClassificationResult::unknown()
            }
        };

        if classification.confidence < ctx.min_confidence {
            turn.say(didnt_understand());
            return Ok(StepResult::PassToNext(StepValue::None));
        }

        Ok(match classification.intent {
            Intent::Rsvp => StepResult::BeginChild(registration_frame(attendee)),
            Intent::CancelRsvp => StepResult::BeginChild(DialogFrame::new(
                FrameData::Cancellation(CancellationFields { attendee: Some(attendee) }),
            )),
            Intent::Question => {
                let question = classification
                    .entities
                    .get("question")
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty());
                StepResult::BeginChild(DialogFrame::new(FrameData::QuestionSubmission(
                    QuestionFields { attendee: Some(attendee), question },
                )))
            }
            Intent::Greeting => {
                turn.say(OutgoingMessage::ignoring(format!(
                    "Hi, {}! How can I help you today?",
                    ctx.profile.display_name
                )));
                StepResult::PassToNext(StepValue::None)
            }
            Intent::EventDetails => {
                turn.say(OutgoingMessage::ignoring(format!(
                    "{} will be held on {}. Location: {}. See you there!",
                    ctx.event.name, ctx.event.schedule, ctx.event.venue
                )));
                StepResult::PassToNext(StepValue::None)
            }
            Intent::Participants => {
                turn.say(OutgoingMessage::ignoring(format!(
                    "To see who's attending, please follow this link: {}",
                    ctx.event.attendees_url
                )));
                StepResult::PassToNext(StepValue::None)
            }
            Intent::AddToCalendar => {
                turn.say(OutgoingMessage::ignoring(format!(
                    "Click here to download the calendar file: {}",
                    ctx.event.calendar_url
                )));
                StepResult::PassToNext(StepValue::None)
            }
            Intent::Unknown => {
                turn.say(didnt_understand());
                StepResult::PassToNext(StepValue::None)
            }
        })
    }

    fn final_step(
        &self,
        frame: &mut FrameData,
        previous: StepValue,
        turn: &mut TurnOutcome,
        ctx: &StepContext<'_>,
    ) -> Result<StepResult, EngineError> {
        match previous {
            StepValue::Completed(CompletionTag::Cancelled) => {
                turn.say(OutgoingMessage::ignoring("You have changed your RSVP to \"Not Going\"."));
            }
            StepValue::Completed(CompletionTag::QuestionSent) => {
                turn.say(OutgoingMessage::ignoring(
                    "I have successfully sent your question to the organizers!",
                ));
            }
            StepValue::Completed(CompletionTag::Registered) => {
                turn.say(OutgoingMessage::ignoring(format!(
                    "You are registered for {}. See you there!",
                    ctx.event.name
                )));
            }
            // Declined confirmations, informational passes, and the global
            // cancel marker all return to the idle prompt silently.
            _ => {}
        }

        let fields = root_fields(frame)?;
        fields.restarted = true;
        Ok(StepResult::RestartRoot)
    }
}

fn registration_frame(attendee: AttendeeIdentity) -> DialogFrame {
    DialogFrame::new(FrameData::Registration(RegistrationFields {
        attendee: Some(attendee),
        ..RegistrationFields::default()
    }))
}

fn didnt_understand() -> OutgoingMessage {
    OutgoingMessage::ignoring("Sorry, I didn't get that. Please try asking in a different way.")
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::RootInteraction;
    use crate::config::EventConfig;
    use crate::dialog::engine::{InteractionDefinition, StepContext};
    use crate::dialog::stack::{FrameData, InteractionId, RootFields};
    use crate::dialog::step::{CompletionTag, StepResult, StepValue, TurnOutcome};
    use crate::domain::UserProfile;
    use crate::nlu::{ClassificationResult, ClassifyError, Intent, IntentClassifier};

    struct FixedClassifier(ClassificationResult);

    #[async_trait]
    impl IntentClassifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassifyError> {
            Ok(self.0.clone())
        }
    }

    fn ctx<'a>(
        classifier: &'a dyn IntentClassifier,
        profile: &'a UserProfile,
        event: &'a EventConfig,
    ) -> StepContext<'a> {
        StepContext { profile, classifier, event, min_confidence: 0.5 }
    }

    fn profile() -> UserProfile {
        UserProfile { address: "ada@example.com".to_string(), display_name: "Ada Li".to_string() }
    }

    fn event() -> EventConfig {
        EventConfig {
            name: "the Horizon Symposium".to_string(),
            venue: "Meridian Conference Center".to_string(),
            schedule: "April 8th".to_string(),
            attendees_url: "https://example.com/attendees".to_string(),
            calendar_url: "https://example.com/event.ics".to_string(),
        }
    }

    #[tokio::test]
    async fn act_step_routes_a_question_intent_with_its_entity() {
        let classifier = FixedClassifier(
            ClassificationResult::new(Intent::Question, 0.9)
                .with_entity("question", "Is there parking?"),
        );
        let profile = profile();
        let event = event();
        let interaction = RootInteraction;
        let mut frame = FrameData::Root(RootFields::default());
        let mut turn = TurnOutcome::default();

        let result = interaction
            .run_step(
                1,
                &mut frame,
                StepValue::Text("question".to_string()),
                &mut turn,
                &ctx(&classifier, &profile, &event),
            )
            .await
            .expect("run act step");

        match result {
            StepResult::BeginChild(child) => {
                assert_eq!(child.interaction(), InteractionId::QuestionSubmission);
            }
            other => panic!("expected BeginChild, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn informational_intent_answers_inline_and_falls_through() {
        let classifier = FixedClassifier(ClassificationResult::new(Intent::EventDetails, 0.9));
        let profile = profile();
        let event = event();
        let interaction = RootInteraction;
        let mut frame = FrameData::Root(RootFields::default());
        let mut turn = TurnOutcome::default();

        let result = interaction
            .run_step(
                1,
                &mut frame,
                StepValue::Text("when is it".to_string()),
                &mut turn,
                &ctx(&classifier, &profile, &event),
            )
            .await
            .expect("run act step");

        assert_eq!(result, StepResult::PassToNext(StepValue::None));
        assert!(turn.messages[0].text.contains("Meridian Conference Center"));
    }

    #[tokio::test]
    async fn classifier_failure_degrades_to_didnt_understand() {
        struct FailingClassifier;

        #[async_trait]
        impl IntentClassifier for FailingClassifier {
            async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassifyError> {
                Err(ClassifyError::Provider("provider down".to_string()))
            }
        }

        let classifier = FailingClassifier;
        let profile = profile();
        let event = event();
        let interaction = RootInteraction;
        let mut frame = FrameData::Root(RootFields::default());
        let mut turn = TurnOutcome::default();

        let result = interaction
            .run_step(
                1,
                &mut frame,
                StepValue::Text("rsvp".to_string()),
                &mut turn,
                &ctx(&classifier, &profile, &event),
            )
            .await
            .expect("run act step");

        assert_eq!(result, StepResult::PassToNext(StepValue::None));
        assert!(turn.messages[0].text.contains("didn't get that"));
    }

    #[tokio::test]
    async fn final_step_confirms_by_completion_tag_and_restarts() {
        let classifier = FixedClassifier(ClassificationResult::unknown());
        let profile = profile();
        let event = event();
        let interaction = RootInteraction;
        let mut frame = FrameData::Root(RootFields::default());
        let mut turn = TurnOutcome::default();

        let result = interaction
            .run_step(
                2,
                &mut frame,
                StepValue::Completed(CompletionTag::QuestionSent),
                &mut turn,
                &ctx(&classifier, &profile, &event),
            )
            .await
            .expect("run final step");

        assert_eq!(result, StepResult::RestartRoot);
        assert!(turn.messages[0].text.contains("sent your question"));
        match frame {
            FrameData::Root(fields) => assert!(fields.restarted),
            other => panic!("unexpected frame data: {other:?}"),
        }
    }
}
