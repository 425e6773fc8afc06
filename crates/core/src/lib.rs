pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod nlu;
pub mod notify;

pub use config::{AppConfig, ConfigError, ConfigOverrides, EventConfig, LoadOptions};
pub use dialog::capture::CaptureKind;
pub use dialog::dispatcher::TurnDispatcher;
pub use dialog::engine::{DialogEngine, InteractionDefinition, StepContext};
pub use dialog::stack::{DialogFrame, DialogStack, FrameData, InteractionId};
pub use dialog::step::{
    CompletionTag, InputHint, OutgoingMessage, SideEffect, StepResult, StepValue, TurnOutcome,
};
pub use dialog::store::{
    AttendeeDirectory, InMemoryAttendeeDirectory, InMemoryQuestionInbox, InMemorySessionStore,
    QuestionInbox, SessionStore, StoreError,
};
pub use domain::{
    AttendeeIdentity, AttendeeRecord, QuestionRecord, RsvpStatus, SessionKey, TurnInput,
    UserProfile,
};
pub use errors::{DispatchError, EngineError};
pub use nlu::{ClassificationResult, ClassifyError, Intent, IntentClassifier};
pub use notify::{InMemoryNotificationSink, NotificationEvent, NotificationSink, NotifyError};
