use async_trait::async_trait;

use crate::config::EventConfig;
use crate::dialog::capture::{self, CaptureOutcome};
use crate::dialog::interactions::{
    CancellationInteraction, QuestionSubmissionInteraction, RegistrationInteraction,
    RootInteraction,
};
use crate::dialog::interruption::{self, Interruption};
use crate::dialog::stack::{DialogFrame, DialogStack, FrameData, InteractionId};
use crate::dialog::step::{StepResult, StepValue, TurnOutcome};
use crate::domain::{TurnInput, UserProfile};
use crate::errors::EngineError;
use crate::nlu::IntentClassifier;

/// Everything a step may consult while it runs. Collaborator access is
/// injected per turn; steps never reach for globals.
pub struct StepContext<'a> {
    pub profile: &'a UserProfile,
    pub classifier: &'a dyn IntentClassifier,
    pub event: &'a EventConfig,
    pub min_confidence: f64,
}

/// One named, ordered sequence of steps. Implementations own the typed
/// field struct carried by their frames and are invoked one step at a time
/// by the engine's trampoline.
#[async_trait]
pub trait InteractionDefinition: Send + Sync {
    fn id(&self) -> InteractionId;
    fn step_count(&self) -> usize;
    async fn run_step(
        &self,
        index: usize,
        frame: &mut FrameData,
        previous: StepValue,
        turn: &mut TurnOutcome,
        ctx: &StepContext<'_>,
    ) -> Result<StepResult, EngineError>;
}

/// Upper bound on synchronous step chaining within one turn. The deepest
/// legitimate chain (capture -> confirm -> commit -> root confirmation ->
/// restart -> idle prompt) is far below this.
const MAX_CHAINED_STEPS: usize = 32;

/// The dialog state machine: resolves the active frame's step, evaluates
/// step results in a loop until the turn suspends, and enforces the stack
/// invariants. Holds no per-session state; everything lives on the stack
/// passed in.
pub struct DialogEngine {
    root: RootInteraction,
    registration: RegistrationInteraction,
    cancellation: CancellationInteraction,
    question: QuestionSubmissionInteraction,
    event: EventConfig,
    min_confidence: f64,
}

impl DialogEngine {
    pub fn new(event: EventConfig, min_confidence: f64) -> Self {
        Self {
            root: RootInteraction,
            registration: RegistrationInteraction,
            cancellation: CancellationInteraction,
            question: QuestionSubmissionInteraction,
            event,
            min_confidence,
        }
    }

    fn definition(&self, id: InteractionId) -> &dyn InteractionDefinition {
        match id {
            InteractionId::Root => &self.root,
            InteractionId::Registration => &self.registration,
            InteractionId::Cancellation => &self.cancellation,
            InteractionId::QuestionSubmission => &self.question,
        }
    }

    /// Process one incoming turn against the session's stack. The stack is
    /// mutated in place; the caller persists it afterwards.
    pub async fn apply_turn(
        &self,
        stack: &mut DialogStack,
        input: &TurnInput,
        classifier: &dyn IntentClassifier,
    ) -> Result<TurnOutcome, EngineError> {
        let mut outcome = TurnOutcome::default();
        let ctx = StepContext {
            profile: &input.profile,
            classifier,
            event: &self.event,
            min_confidence: self.min_confidence,
        };

        // An empty stack means a fresh session: the first turn starts the
        // root interaction, its text serving only as the trigger.
        if stack.is_empty() {
            stack.push(DialogFrame::root());
            self.pump(stack, StepValue::None, &mut outcome, &ctx).await?;
            return Ok(outcome);
        }

        // Global commands win before any frame sees the text.
        match interruption::detect(&input.text) {
            Some(Interruption::Help) => {
                outcome.say(interruption::help_message());
                return Ok(outcome);
            }
            Some(Interruption::Cancel) => {
                outcome.say(interruption::cancel_acknowledgement());
                let dropped = stack.unwind_to_root();
                let root = stack.top_mut().ok_or(EngineError::EmptyStackPop)?;
                root.pending = None;
                if dropped == 0 {
                    // No nested interaction: the root was awaiting its own
                    // idle prompt. Re-ask it.
                    if let FrameData::Root(fields) = &mut root.data {
                        fields.restarted = true;
                    }
                    root.step_index = 0;
                    self.pump(stack, StepValue::None, &mut outcome, &ctx).await?;
                } else {
                    self.pump(stack, StepValue::CancelledByUser, &mut outcome, &ctx).await?;
                }
                return Ok(outcome);
            }
            None => {}
        }

        let carried = {
            let top = stack.top_mut().ok_or(EngineError::EmptyStackPop)?;
            match top.pending {
                Some(kind) => match capture::resolve(kind, &input.text) {
                    CaptureOutcome::Captured(value) => {
                        // A completed capture resumes the waterfall at the
                        // step after the one that prompted.
                        top.pending = None;
                        top.step_index += 1;
                        value
                    }
                    CaptureOutcome::Reprompt(message) => {
                        outcome.say(message);
                        return Ok(outcome);
                    }
                },
                None => StepValue::Text(input.text.clone()),
            }
        };

        self.pump(stack, carried, &mut outcome, &ctx).await?;
        Ok(outcome)
    }

    /// The trampoline: evaluate step results synchronously, chaining across
    /// frames within the same turn, until a step suspends for input.
    async fn pump(
        &self,
        stack: &mut DialogStack,
        first: StepValue,
        outcome: &mut TurnOutcome,
        ctx: &StepContext<'_>,
    ) -> Result<(), EngineError> {
        let mut carried = first;

        for _ in 0..MAX_CHAINED_STEPS {
            let (id, index) = {
                let top = stack.top().ok_or(EngineError::EmptyStackPop)?;
                (top.interaction(), top.step_index)
            };
            let definition = self.definition(id);
            if index >= definition.step_count() {
                return Err(EngineError::StepIndexOutOfRange { interaction: id, index });
            }

            let result = {
                let top = stack.top_mut().ok_or(EngineError::EmptyStackPop)?;
                definition.run_step(index, &mut top.data, carried, outcome, ctx).await?
            };

            match result {
                StepResult::AwaitInput { prompt, capture } => {
                    outcome.say(prompt);
                    let top = stack.top_mut().ok_or(EngineError::EmptyStackPop)?;
                    top.pending = Some(capture);
                    return Ok(());
                }
                StepResult::PassToNext(value) => {
                    let step_count = definition.step_count();
                    let top = stack.top_mut().ok_or(EngineError::EmptyStackPop)?;
                    top.step_index += 1;
                    if top.step_index >= step_count {
                        // Running off the end of the waterfall ends the frame
                        // with the value it was carrying.
                        carried = self.close_frame(stack, Some(value))?;
                    } else {
                        carried = value;
                    }
                }
                StepResult::BeginChild(child) => {
                    let top = stack.top_mut().ok_or(EngineError::EmptyStackPop)?;
                    top.step_index += 1;
                    stack.push(child);
                    carried = StepValue::None;
                }
                StepResult::EndFrame(value) => {
                    carried = self.close_frame(stack, value)?;
                }
                StepResult::RestartRoot => {
                    let top = stack.top_mut().ok_or(EngineError::EmptyStackPop)?;
                    top.step_index = 0;
                    carried = StepValue::None;
                }
            }
        }

        Err(EngineError::ChainOverflow(MAX_CHAINED_STEPS))
    }

    /// Pop the finished frame and decide what its parent receives. The root
    /// is never popped by its own steps; if it somehow was, recover by
    /// starting a fresh root rather than leaving the session dead.
    fn close_frame(
        &self,
        stack: &mut DialogStack,
        value: Option<StepValue>,
    ) -> Result<StepValue, EngineError> {
        stack.pop()?;
        if stack.is_empty() {
            stack.push(DialogFrame::root());
            return Ok(StepValue::None);
        }
        Ok(value.unwrap_or(StepValue::None))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::DialogEngine;
    use crate::config::EventConfig;
    use crate::dialog::stack::{DialogStack, InteractionId};
    use crate::dialog::step::{InputHint, SideEffect, TurnOutcome};
    use crate::domain::{SessionKey, TurnInput, UserProfile};
    use crate::nlu::{ClassificationResult, ClassifyError, Intent, IntentClassifier};

    struct TableClassifier {
        table: HashMap<String, ClassificationResult>,
        configured: bool,
    }

    impl TableClassifier {
        fn new(entries: Vec<(&str, Intent, f64)>) -> Self {
            let table = entries
                .into_iter()
                .map(|(text, intent, confidence)| {
                    (text.to_string(), ClassificationResult::new(intent, confidence))
                })
                .collect();
            Self { table, configured: true }
        }

        fn unconfigured() -> Self {
            Self { table: HashMap::new(), configured: false }
        }
    }

    #[async_trait]
    impl IntentClassifier for TableClassifier {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
            Ok(self
                .table
                .get(text)
                .cloned()
                .unwrap_or_else(|| ClassificationResult::new(Intent::Unknown, 0.2)))
        }
    }

    fn engine() -> DialogEngine {
        DialogEngine::new(event_fixture(), 0.5)
    }

    fn event_fixture() -> EventConfig {
        EventConfig {
            name: "the Horizon Symposium".to_string(),
            venue: "Meridian Conference Center".to_string(),
            schedule: "April 8th, 12:30pm to 5pm".to_string(),
            attendees_url: "https://example.com/attendees".to_string(),
            calendar_url: "https://example.com/event.ics".to_string(),
        }
    }

    fn turn(text: &str) -> TurnInput {
        TurnInput {
            session: SessionKey("conv-1".to_string()),
            text: text.to_string(),
            profile: UserProfile {
                address: "ada@example.com".to_string(),
                display_name: "Ada Li (Contracting)".to_string(),
            },
        }
    }

    fn rsvp_classifier() -> TableClassifier {
        TableClassifier::new(vec![
            ("rsvp", Intent::Rsvp, 0.9),
            ("cancel my rsvp", Intent::CancelRsvp, 0.9),
            ("question for the organizers", Intent::Question, 0.9),
        ])
    }

    async fn run_turns(
        engine: &DialogEngine,
        classifier: &dyn IntentClassifier,
        stack: &mut DialogStack,
        texts: &[&str],
    ) -> Vec<TurnOutcome> {
        let mut outcomes = Vec::new();
        for text in texts {
            let outcome =
                engine.apply_turn(stack, &turn(text), classifier).await.expect("apply turn");
            outcomes.push(outcome);
        }
        outcomes
    }

    #[tokio::test]
    async fn first_contact_starts_the_root_and_greets_by_name() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        let outcome =
            engine.apply_turn(&mut stack, &turn("hi"), &classifier).await.expect("apply turn");

        assert_eq!(stack.len(), 1);
        assert_eq!(outcome.messages.len(), 1);
        assert!(outcome.messages[0].text.contains("Ada Li"));
        assert_eq!(outcome.messages[0].input_hint, InputHint::ExpectingInput);
    }

    #[tokio::test]
    async fn full_registration_collects_exactly_the_supplied_fields() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        let outcomes = run_turns(
            &engine,
            &classifier,
            &mut stack,
            &["hello", "rsvp", "Acme", "AI, Robotics", "yes"],
        )
        .await;

        let last = outcomes.last().expect("final outcome");
        assert_eq!(last.effects.len(), 1);
        match &last.effects[0] {
            SideEffect::RecordRegistration(record) => {
                assert_eq!(record.email, "ada@example.com");
                assert_eq!(record.name, "Ada Li");
                assert_eq!(record.agency.as_deref(), Some("Acme"));
                assert_eq!(record.interests.as_deref(), Some("AI, Robotics"));
            }
            other => panic!("unexpected effect: {other:?}"),
        }
        // Confirmation message plus the restarted idle prompt, one batch.
        assert!(last.messages[0].text.contains("You are registered"));
        assert!(last.messages[1].text.contains("anything else"));
        assert_eq!(stack.len(), 1);
    }

    #[tokio::test]
    async fn step_index_is_monotonic_within_an_uninterrupted_interaction() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        run_turns(&engine, &classifier, &mut stack, &["hello", "rsvp"]).await;
        let mut last_index = stack.top().expect("registration frame").step_index;
        assert_eq!(stack.top().expect("frame").interaction(), InteractionId::Registration);

        for text in ["Acme", "AI"] {
            engine.apply_turn(&mut stack, &turn(text), &classifier).await.expect("apply turn");
            if stack.top().expect("frame").interaction() == InteractionId::Registration {
                let index = stack.top().expect("frame").step_index;
                assert!(index >= last_index, "step index regressed: {index} < {last_index}");
                last_index = index;
            }
        }
    }

    #[tokio::test]
    async fn exactly_one_frame_awaits_input_between_turns() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        run_turns(&engine, &classifier, &mut stack, &["hello", "rsvp", "Acme"]).await;

        // Only the top frame may carry an outstanding capture.
        assert!(stack.top().expect("top frame").pending.is_some());
        let mut probe = stack.clone();
        probe.pop().expect("top frame");
        while let Ok(frame) = probe.pop() {
            assert!(frame.pending.is_none(), "non-top frame left awaiting input");
        }
    }

    #[tokio::test]
    async fn cancel_during_a_nested_interaction_returns_to_the_root() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        run_turns(&engine, &classifier, &mut stack, &["hello", "rsvp"]).await;
        assert_eq!(stack.len(), 2);

        let outcome =
            engine.apply_turn(&mut stack, &turn("cancel"), &classifier).await.expect("apply turn");

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().expect("root").interaction(), InteractionId::Root);
        assert!(outcome.effects.is_empty());
        assert!(outcome.messages[0].text.contains("Cancelling"));
        // The root re-prompts within the same turn.
        assert_eq!(outcome.messages.last().expect("prompt").input_hint, InputHint::ExpectingInput);
    }

    #[tokio::test]
    async fn cancel_with_only_the_root_active_restarts_the_idle_prompt() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        run_turns(&engine, &classifier, &mut stack, &["hello"]).await;
        let outcome =
            engine.apply_turn(&mut stack, &turn("cancel"), &classifier).await.expect("apply turn");

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().expect("root").step_index, 0);
        assert!(outcome.messages.last().expect("prompt").text.contains("anything else"));
    }

    #[tokio::test]
    async fn help_changes_no_state_at_all() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        run_turns(&engine, &classifier, &mut stack, &["hello", "rsvp", "Acme"]).await;
        let before = stack.clone();

        let outcome =
            engine.apply_turn(&mut stack, &turn("help"), &classifier).await.expect("apply turn");

        assert_eq!(stack, before);
        assert_eq!(outcome.messages.len(), 1);
        assert!(outcome.effects.is_empty());
    }

    #[tokio::test]
    async fn low_confidence_classification_falls_through_to_didnt_understand() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        run_turns(&engine, &classifier, &mut stack, &["hello"]).await;
        let outcome = engine
            .apply_turn(&mut stack, &turn("mumble mumble"), &classifier)
            .await
            .expect("apply turn");

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().expect("root").step_index, 0);
        assert!(outcome.messages[0].text.contains("didn't get that"));
        assert!(outcome.effects.is_empty());
    }

    #[tokio::test]
    async fn declining_the_confirmation_commits_nothing() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        let outcomes =
            run_turns(&engine, &classifier, &mut stack, &["hello", "rsvp", "Acme", "AI", "no"])
                .await;

        let last = outcomes.last().expect("final outcome");
        assert!(last.effects.is_empty());
        // No completion confirmation, just the restarted idle prompt.
        assert!(last.messages.iter().all(|message| !message.text.contains("registered")));
        assert_eq!(stack.len(), 1);
    }

    #[tokio::test]
    async fn unparseable_confirmation_answer_reprompts_without_advancing() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        run_turns(&engine, &classifier, &mut stack, &["hello", "rsvp", "Acme", "AI"]).await;
        let before = stack.clone();

        let outcome = engine
            .apply_turn(&mut stack, &turn("banana"), &classifier)
            .await
            .expect("apply turn");

        assert_eq!(stack, before);
        assert!(outcome.messages[0].text.contains("yes or no"));
    }

    #[tokio::test]
    async fn cancellation_interaction_flows_to_its_confirmation() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        let outcomes =
            run_turns(&engine, &classifier, &mut stack, &["hello", "cancel my rsvp", "yes"]).await;

        let last = outcomes.last().expect("final outcome");
        assert_eq!(last.effects.len(), 1);
        assert!(matches!(last.effects[0], SideEffect::RecordCancellation { .. }));
        assert!(last.messages[0].text.contains("Not Going"));
        assert_eq!(stack.len(), 1);
    }

    #[tokio::test]
    async fn question_submission_flows_to_its_confirmation() {
        let engine = engine();
        let classifier = rsvp_classifier();
        let mut stack = DialogStack::new();

        let outcomes = run_turns(
            &engine,
            &classifier,
            &mut stack,
            &["hello", "question for the organizers", "Is there parking?", "yes"],
        )
        .await;

        let last = outcomes.last().expect("final outcome");
        match &last.effects[0] {
            SideEffect::RecordQuestion(record) => {
                assert_eq!(record.question, "Is there parking?");
                assert_eq!(record.email, "ada@example.com");
            }
            other => panic!("unexpected effect: {other:?}"),
        }
        assert!(last.messages[0].text.contains("sent your question"));
    }

    #[tokio::test]
    async fn unconfigured_classifier_always_selects_registration() {
        let engine = engine();
        let classifier = TableClassifier::unconfigured();
        let mut stack = DialogStack::new();

        let outcomes = run_turns(&engine, &classifier, &mut stack, &["hello", "anything"]).await;

        // Intro emits the configuration notice and falls straight through to
        // the registration waterfall's first prompt.
        assert!(outcomes[0].messages.iter().any(|message| message.text.contains("not configured")));
        assert_eq!(
            stack.top().expect("frame").interaction(),
            InteractionId::Registration
        );
    }
}
