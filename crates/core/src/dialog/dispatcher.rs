use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dialog::engine::DialogEngine;
use crate::dialog::stack::DialogStack;
use crate::dialog::step::{OutgoingMessage, SideEffect, TurnOutcome};
use crate::dialog::store::{AttendeeDirectory, QuestionInbox, SessionStore};
use crate::domain::{RsvpStatus, TurnInput};
use crate::errors::DispatchError;
use crate::nlu::IntentClassifier;
use crate::notify::{NotificationEvent, NotificationSink};

/// Per-turn orchestration around the engine: load the session's stack, run
/// the turn, execute the committed side effects fire-and-forget, persist the
/// stack exactly once, and hand the message batch back to the transport.
///
/// Collaborators are injected at construction so tests substitute in-memory
/// doubles. Turns for one session must arrive in order; the transport owns
/// that guarantee.
pub struct TurnDispatcher {
    engine: DialogEngine,
    classifier: Arc<dyn IntentClassifier>,
    sessions: Arc<dyn SessionStore>,
    attendees: Arc<dyn AttendeeDirectory>,
    questions: Arc<dyn QuestionInbox>,
    notifications: Arc<dyn NotificationSink>,
}

impl TurnDispatcher {
    pub fn new(
        engine: DialogEngine,
        classifier: Arc<dyn IntentClassifier>,
        sessions: Arc<dyn SessionStore>,
        attendees: Arc<dyn AttendeeDirectory>,
        questions: Arc<dyn QuestionInbox>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self { engine, classifier, sessions, attendees, questions, notifications }
    }

    pub async fn handle_turn(
        &self,
        input: &TurnInput,
    ) -> Result<Vec<OutgoingMessage>, DispatchError> {
        let correlation_id = Uuid::new_v4().to_string();
        let mut stack = self.sessions.load(&input.session).await?.unwrap_or_default();

        let outcome = match self
            .engine
            .apply_turn(&mut stack, input, self.classifier.as_ref())
            .await
        {
            Ok(outcome) => outcome,
            Err(fault) => {
                // Stack invariant violations are not recoverable in place:
                // reset the session to a fresh root frame instead of
                // continuing in an undefined state.
                error!(
                    event_name = "dialog.engine.fault",
                    correlation_id = %correlation_id,
                    session_key = %input.session,
                    error = %fault,
                    "dialog engine fault; resetting session to a fresh root frame"
                );
                stack = DialogStack::default();
                self.engine.apply_turn(&mut stack, input, self.classifier.as_ref()).await?
            }
        };

        self.execute_effects(&outcome, &correlation_id).await;
        self.sessions.save(&input.session, &stack).await?;

        info!(
            event_name = "dialog.turn.completed",
            correlation_id = %correlation_id,
            session_key = %input.session,
            frames = stack.len(),
            messages = outcome.messages.len(),
            effects = outcome.effects.len(),
            "turn processed"
        );

        Ok(outcome.messages)
    }

    /// Side effects are decoupled from conversational success: every failure
    /// here is logged and swallowed, never surfaced into the reply.
    async fn execute_effects(&self, outcome: &TurnOutcome, correlation_id: &str) {
        for effect in &outcome.effects {
            match effect {
                SideEffect::RecordRegistration(record) => {
                    if let Err(failure) = self.attendees.upsert(record.clone()).await {
                        warn!(
                            correlation_id,
                            error = %failure,
                            "attendee upsert failed; registration reply unaffected"
                        );
                    }
                    self.notify(NotificationEvent::Registration(record.clone()), correlation_id)
                        .await;
                }
                SideEffect::RecordCancellation { attendee } => {
                    match self.attendees.find(&attendee.email).await {
                        Ok(Some(mut record)) => {
                            record.rsvp = RsvpStatus::No;
                            let name = record.name.clone();
                            if let Err(failure) = self.attendees.replace(record).await {
                                warn!(
                                    correlation_id,
                                    error = %failure,
                                    "attendee replace failed; cancellation reply unaffected"
                                );
                            }
                            self.notify(
                                NotificationEvent::Cancellation {
                                    email: attendee.email.clone(),
                                    name,
                                },
                                correlation_id,
                            )
                            .await;
                        }
                        Ok(None) => {
                            warn!(
                                correlation_id,
                                email = %attendee.email,
                                "no attendee record found to cancel"
                            );
                        }
                        Err(failure) => {
                            warn!(
                                correlation_id,
                                error = %failure,
                                "attendee lookup failed; cancellation reply unaffected"
                            );
                        }
                    }
                }
                SideEffect::RecordQuestion(record) => {
                    if let Err(failure) = self.questions.submit(record.clone()).await {
                        warn!(
                            correlation_id,
                            error = %failure,
                            "question submit failed; reply unaffected"
                        );
                    }
                    self.notify(NotificationEvent::Question(record.clone()), correlation_id).await;
                }
            }
        }
    }

    async fn notify(&self, event: NotificationEvent, correlation_id: &str) {
        let kind = event.kind();
        if let Err(failure) = self.notifications.notify(event).await {
            warn!(correlation_id, kind, error = %failure, "notification delivery failed");
        }
    }
}
