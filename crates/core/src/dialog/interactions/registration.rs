use async_trait::async_trait;
use tracing::warn;

use crate::dialog::capture::CaptureKind;
use crate::dialog::engine::{InteractionDefinition, StepContext};
use crate::dialog::interactions::registration_fields;
use crate::dialog::stack::{FrameData, InteractionId};
use crate::dialog::step::{
    CompletionTag, OutgoingMessage, SideEffect, StepResult, StepValue, TurnOutcome,
};
use crate::domain::{AttendeeRecord, RsvpStatus};
use crate::errors::EngineError;

/// The registration waterfall: agency -> interests -> confirm -> commit.
/// Each capture step checks whether its field was pre-seeded by the caller
/// and skips its prompt when so.
pub struct RegistrationInteraction;

#[async_trait]
impl InteractionDefinition for RegistrationInteraction {
    fn id(&self) -> InteractionId {
        InteractionId::Registration
    }

    fn step_count(&self) -> usize {
        4
    }

    async fn run_step(
        &self,
        index: usize,
        frame: &mut FrameData,
        previous: StepValue,
        turn: &mut TurnOutcome,
        _ctx: &StepContext<'_>,
    ) -> Result<StepResult, EngineError> {
        let fields = registration_fields(frame)?;
        match index {
            0 => Ok(match &fields.agency {
                None => StepResult::AwaitInput {
                    prompt: OutgoingMessage::expecting("What's your agency?"),
                    capture: CaptureKind::FreeText,
                },
                Some(agency) => StepResult::PassToNext(StepValue::Text(agency.clone())),
            }),
            1 => {
                if fields.agency.is_none() {
                    if let StepValue::Text(answer) = &previous {
                        fields.agency = Some(answer.clone());
                    }
                }
                Ok(match &fields.interests {
                    None => StepResult::AwaitInput {
                        prompt: OutgoingMessage::expecting("What topics would you like to see?")
                            .with_speak("What are your topics of interest?"),
                        capture: CaptureKind::FreeText,
                    },
                    Some(interests) => StepResult::PassToNext(StepValue::Text(interests.clone())),
                })
            }
            2 => {
                if fields.interests.is_none() {
                    if let StepValue::Text(answer) = &previous {
                        fields.interests = Some(answer.clone());
                    }
                }
                let agency = fields.agency.as_deref().unwrap_or_default();
                let interests = fields.interests.as_deref().unwrap_or_default();
                Ok(StepResult::AwaitInput {
                    prompt: OutgoingMessage::expecting(format!(
                        "Please confirm your RSVP. Your agency is: {agency} and your topics of \
                         interest are: {interests}. Is this correct?"
                    )),
                    capture: CaptureKind::YesNo,
                })
            }
            3 => {
                if previous != StepValue::Confirmation(true) {
                    return Ok(StepResult::EndFrame(None));
                }
                match &fields.attendee {
                    Some(attendee) => turn.record(SideEffect::RecordRegistration(AttendeeRecord {
                        email: attendee.email.clone(),
                        name: attendee.registered_name(),
                        agency: fields.agency.clone(),
                        interests: fields.interests.clone(),
                        rsvp: RsvpStatus::Yes,
                    })),
                    None => warn!(
                        "registration confirmed without an attendee identity; no record committed"
                    ),
                }
                Ok(StepResult::EndFrame(Some(StepValue::Completed(CompletionTag::Registered))))
            }
            _ => Err(EngineError::StepIndexOutOfRange {
                interaction: InteractionId::Registration,
                index,
            }),
        }
    }
}
