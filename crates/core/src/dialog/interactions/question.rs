use async_trait::async_trait;
use tracing::warn;

use crate::dialog::capture::CaptureKind;
use crate::dialog::engine::{InteractionDefinition, StepContext};
use crate::dialog::interactions::question_fields;
use crate::dialog::stack::{FrameData, InteractionId};
use crate::dialog::step::{
    CompletionTag, OutgoingMessage, SideEffect, StepResult, StepValue, TurnOutcome,
};
use crate::domain::QuestionRecord;
use crate::errors::EngineError;

/// The question-submission waterfall: capture the question (unless it
/// arrived with the intent), confirm, submit.
pub struct QuestionSubmissionInteraction;

#[async_trait]
impl InteractionDefinition for QuestionSubmissionInteraction {
    fn id(&self) -> InteractionId {
        InteractionId::QuestionSubmission
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
        _ctx: &StepContext<'_>,
    ) -> Result<StepResult, EngineError> {
        let fields = question_fields(frame)?;
        match index {
            0 => Ok(match &fields.question {
                None => StepResult::AwaitInput {
                    prompt: OutgoingMessage::expecting("What's your question?"),
                    capture: CaptureKind::FreeText,
                },
                Some(question) => StepResult::PassToNext(StepValue::Text(question.clone())),
            }),
            1 => {
                if fields.question.is_none() {
                    if let StepValue::Text(answer) = &previous {
                        fields.question = Some(answer.clone());
                    }
                }
                let question = fields.question.as_deref().unwrap_or_default();
                Ok(StepResult::AwaitInput {
                    prompt: OutgoingMessage::expecting(format!(
                        "Do you wish to send your question: {question}?"
                    )),
                    capture: CaptureKind::YesNo,
                })
            }
            2 => {
                if previous != StepValue::Confirmation(true) {
                    return Ok(StepResult::EndFrame(None));
                }
                match (&fields.attendee, &fields.question) {
                    (Some(attendee), Some(question)) => {
                        turn.record(SideEffect::RecordQuestion(QuestionRecord {
                            email: attendee.email.clone(),
                            question: question.clone(),
                        }));
                    }
                    _ => warn!("question confirmed without identity or text; no record committed"),
                }
                Ok(StepResult::EndFrame(Some(StepValue::Completed(CompletionTag::QuestionSent))))
            }
            _ => Err(EngineError::StepIndexOutOfRange {
                interaction: InteractionId::QuestionSubmission,
                index,
            }),
        }
    }
}
