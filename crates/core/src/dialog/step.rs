use serde::{Deserialize, Serialize};

use crate::dialog::capture::CaptureKind;
use crate::dialog::stack::DialogFrame;
use crate::domain::{AttendeeIdentity, AttendeeRecord, QuestionRecord};

/// Literal result tag a completed interaction hands back to the root, which
/// keys its confirmation message on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTag {
    Registered,
    Cancelled,
    QuestionSent,
}

/// The value delivered to a step as "the previous step's result" — user
/// text resolved by a capture, a yes/no answer, a finished child's tag, or
/// the global-cancel marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepValue {
    None,
    Text(String),
    Confirmation(bool),
    Completed(CompletionTag),
    CancelledByUser,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputHint {
    ExpectingInput,
    IgnoringInput,
}

/// One outgoing activity. `speak` carries the voice variant; `input_hint`
/// tells richer channels whether a reply is now expected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    pub speak: String,
    pub input_hint: InputHint,
}

impl OutgoingMessage {
    pub fn expecting(text: impl Into<String>) -> Self {
        let text = text.into();
        Self { speak: text.clone(), text, input_hint: InputHint::ExpectingInput }
    }

    pub fn ignoring(text: impl Into<String>) -> Self {
        let text = text.into();
        Self { speak: text.clone(), text, input_hint: InputHint::IgnoringInput }
    }

    pub fn with_speak(mut self, speak: impl Into<String>) -> Self {
        self.speak = speak.into();
        self
    }
}

/// Tagged outcome of invoking one step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// Render the prompt, mark the declared capture outstanding, end the turn.
    AwaitInput { prompt: OutgoingMessage, capture: CaptureKind },
    /// Advance the cursor and run the next step in the same frame, same turn.
    PassToNext(StepValue),
    /// Push a nested interaction; the parent resumes with its result.
    BeginChild(DialogFrame),
    /// Pop this frame and deliver the value to the parent's current step.
    EndFrame(Option<StepValue>),
    /// Root only: rewind to step 0 and re-run the idle prompt, same turn.
    RestartRoot,
}

/// A side effect a step commits. Effects accumulate during the turn and are
/// executed fire-and-forget after synchronous chaining completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SideEffect {
    RecordRegistration(AttendeeRecord),
    RecordCancellation { attendee: AttendeeIdentity },
    RecordQuestion(QuestionRecord),
}

/// Everything one turn produced: the outgoing message batch and the side
/// effects to hand to the persistence/notification collaborators.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    pub messages: Vec<OutgoingMessage>,
    pub effects: Vec<SideEffect>,
}

impl TurnOutcome {
    pub fn say(&mut self, message: OutgoingMessage) {
        self.messages.push(message);
    }

    pub fn record(&mut self, effect: SideEffect) {
        self.effects.push(effect);
    }
}
