use thiserror::Error;

use crate::dialog::stack::InteractionId;
use crate::dialog::store::StoreError;

/// Internal contract violations in the dialog engine. These are faults, not
/// user-facing failures: the dispatcher resets the session to a fresh root
/// frame rather than continuing in an undefined state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("popped an empty dialog stack")]
    EmptyStackPop,
    #[error("step index {index} out of range for {interaction:?}")]
    StepIndexOutOfRange { interaction: InteractionId, index: usize },
    #[error("frame state does not belong to {expected:?}")]
    FrameMismatch { expected: InteractionId },
    #[error("synchronous step chain exceeded {0} steps in one turn")]
    ChainOverflow(usize),
}

/// Turn-level failures surfaced by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("session store failure: {0}")]
    SessionStore(#[from] StoreError),
}

impl DispatchError {
    pub fn user_message(&self) -> &'static str {
        "Something went wrong on our side. Let's start over - how can I help you?"
    }
}

#[cfg(test)]
mod tests {
    use super::{DispatchError, EngineError};
    use crate::dialog::stack::InteractionId;

    #[test]
    fn engine_errors_render_their_context() {
        let error =
            EngineError::StepIndexOutOfRange { interaction: InteractionId::Registration, index: 7 };
        assert!(error.to_string().contains("Registration"));
        assert!(error.to_string().contains('7'));
    }

    #[test]
    fn dispatch_error_has_a_user_safe_message() {
        let error = DispatchError::Engine(EngineError::EmptyStackPop);
        assert!(error.user_message().contains("start over"));
    }
}
