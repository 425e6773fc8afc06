use crate::dialog::step::OutgoingMessage;

/// A global command recognized independent of the active frame. Detection is
/// plain keyword matching on the raw turn text, never a classifier call:
/// interruption must win even while a child interaction owns the vocabulary,
/// and must work when no classifier is configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interruption {
    Cancel,
    Help,
}

pub fn detect(text: &str) -> Option<Interruption> {
    match normalize_command(text).as_str() {
        "cancel" | "quit" => Some(Interruption::Cancel),
        "help" | "?" => Some(Interruption::Help),
        _ => None,
    }
}

pub fn help_message() -> OutgoingMessage {
    OutgoingMessage::expecting(
        "I can register your RSVP, cancel an existing RSVP, or pass a question to the \
         organizers. Answer the open question to continue, or say \"cancel\" to abandon \
         what we're doing.",
    )
}

pub fn cancel_acknowledgement() -> OutgoingMessage {
    OutgoingMessage::ignoring("Cancelling all in-progress tasks.")
}

fn normalize_command(text: &str) -> String {
    text.trim().trim_end_matches(['.', '!']).trim().to_ascii_lowercase()
}
