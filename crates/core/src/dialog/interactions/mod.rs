pub mod cancellation;
pub mod question;
pub mod registration;
pub mod root;

pub use cancellation::CancellationInteraction;
pub use question::QuestionSubmissionInteraction;
pub use registration::RegistrationInteraction;
pub use root::RootInteraction;

use crate::dialog::stack::{
    CancellationFields, FrameData, InteractionId, QuestionFields, RegistrationFields, RootFields,
};
use crate::errors::EngineError;

fn root_fields(data: &mut FrameData) -> Result<&mut RootFields, EngineError> {
    match data {
        FrameData::Root(fields) => Ok(fields),
        _ => Err(EngineError::FrameMismatch { expected: InteractionId::Root }),
    }
}

fn registration_fields(data: &mut FrameData) -> Result<&mut RegistrationFields, EngineError> {
    match data {
        FrameData::Registration(fields) => Ok(fields),
        _ => Err(EngineError::FrameMismatch { expected: InteractionId::Registration }),
    }
}

fn cancellation_fields(data: &mut FrameData) -> Result<&mut CancellationFields, EngineError> {
    match data {
        FrameData::Cancellation(fields) => Ok(fields),
        _ => Err(EngineError::FrameMismatch { expected: InteractionId::Cancellation }),
    }
}

fn question_fields(data: &mut FrameData) -> Result<&mut QuestionFields, EngineError> {
    match data {
        FrameData::QuestionSubmission(fields) => Ok(fields),
        _ => Err(EngineError::FrameMismatch { expected: InteractionId::QuestionSubmission }),
    }
}
