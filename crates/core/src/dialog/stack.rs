use serde::{Deserialize, Serialize};

use crate::dialog::capture::CaptureKind;
use crate::domain::AttendeeIdentity;
use crate::errors::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionId {
    Root,
    Registration,
    Cancellation,
    QuestionSubmission,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootFields {
    /// Set once the first pass through the waterfall completes; switches the
    /// idle prompt from the greeting to the shorter restart message.
    pub restarted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFields {
    pub attendee: Option<AttendeeIdentity>,
    pub agency: Option<String>,
    pub interests: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationFields {
    pub attendee: Option<AttendeeIdentity>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFields {
    pub attendee: Option<AttendeeIdentity>,
    pub question: Option<String>,
}

/// Per-frame state: one typed field struct per interaction, so each step
/// can rely on which fields exist instead of probing a generic bag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "interaction", rename_all = "snake_case")]
pub enum FrameData {
    Root(RootFields),
    Registration(RegistrationFields),
    Cancellation(CancellationFields),
    QuestionSubmission(QuestionFields),
}

impl FrameData {
    pub fn interaction(&self) -> InteractionId {
        match self {
            Self::Root(_) => InteractionId::Root,
            Self::Registration(_) => InteractionId::Registration,
            Self::Cancellation(_) => InteractionId::Cancellation,
            Self::QuestionSubmission(_) => InteractionId::QuestionSubmission,
        }
    }
}

/// One in-progress interaction's saved position and partial data.
/// `pending` records which declared capture behavior is outstanding; only
/// the top frame may carry one between turns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogFrame {
    pub data: FrameData,
    pub step_index: usize,
    pub pending: Option<CaptureKind>,
}

impl DialogFrame {
    pub fn new(data: FrameData) -> Self {
        Self { data, step_index: 0, pending: None }
    }

    pub fn root() -> Self {
        Self::new(FrameData::Root(RootFields::default()))
    }

    pub fn interaction(&self) -> InteractionId {
        self.data.interaction()
    }
}

/// The conversation call stack, most-recent-last. Pushing begins a nested
/// interaction; popping resumes the caller with the child's result. The
/// root frame is created on first contact and never popped by its own steps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogStack {
    frames: Vec<DialogFrame>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: DialogFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Result<DialogFrame, EngineError> {
        self.frames.pop().ok_or(EngineError::EmptyStackPop)
    }

    pub fn top(&self) -> Option<&DialogFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DialogFrame> {
        self.frames.last_mut()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Abandon every nested interaction, keeping only the bottom (root)
    /// frame. Returns how many frames were dropped.
    pub fn unwind_to_root(&mut self) -> usize {
        let dropped = self.frames.len().saturating_sub(1);
        self.frames.truncate(1);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::{DialogFrame, DialogStack, FrameData, InteractionId, RegistrationFields};
    use crate::dialog::capture::CaptureKind;
    use crate::domain::AttendeeIdentity;
    use crate::errors::EngineError;

    fn registration_frame() -> DialogFrame {
        DialogFrame::new(FrameData::Registration(RegistrationFields {
            attendee: Some(AttendeeIdentity {
                email: "ada@example.com".to_string(),
                display_name: "Ada Li".to_string(),
            }),
            agency: Some("Acme".to_string()),
            interests: None,
        }))
    }

    #[test]
    fn push_pop_and_top_behave_like_a_stack() {
        let mut stack = DialogStack::new();
        stack.push(DialogFrame::root());
        stack.push(registration_frame());

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top().map(DialogFrame::interaction), Some(InteractionId::Registration));

        let popped = stack.pop().expect("pop registration");
        assert_eq!(popped.interaction(), InteractionId::Registration);
        assert_eq!(stack.top().map(DialogFrame::interaction), Some(InteractionId::Root));
    }

    #[test]
    fn popping_an_empty_stack_is_an_internal_fault() {
        let mut stack = DialogStack::new();
        assert_eq!(stack.pop(), Err(EngineError::EmptyStackPop));
    }

    #[test]
    fn unwind_to_root_drops_every_nested_frame() {
        let mut stack = DialogStack::new();
        stack.push(DialogFrame::root());
        stack.push(registration_frame());
        stack.push(registration_frame());

        let dropped = stack.unwind_to_root();

        assert_eq!(dropped, 2);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().map(DialogFrame::interaction), Some(InteractionId::Root));
    }

    #[test]
    fn stack_round_trips_through_serde() {
        let mut stack = DialogStack::new();
        let mut root = DialogFrame::root();
        root.step_index = 2;
        stack.push(root);
        let mut child = registration_frame();
        child.step_index = 1;
        child.pending = Some(CaptureKind::FreeText);
        stack.push(child);

        let json = serde_json::to_string(&stack).expect("serialize stack");
        let restored: DialogStack = serde_json::from_str(&json).expect("deserialize stack");

        assert_eq!(restored, stack);
    }
}
