use serde::{Deserialize, Serialize};

use crate::dialog::step::{OutgoingMessage, StepValue};

/// The reusable input-capture behaviors a prompting step declares. The kind
/// is persisted on the frame so the next turn knows how to interpret the
/// user's answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    FreeText,
    YesNo,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured(StepValue),
    /// The answer did not parse; re-ask without advancing the step cursor.
    Reprompt(OutgoingMessage),
}

pub fn resolve(kind: CaptureKind, text: &str) -> CaptureOutcome {
    match kind {
        CaptureKind::FreeText => CaptureOutcome::Captured(StepValue::Text(text.trim().to_string())),
        CaptureKind::YesNo => match parse_yes_no(text) {
            Some(confirmed) => CaptureOutcome::Captured(StepValue::Confirmation(confirmed)),
            None => {
                CaptureOutcome::Reprompt(OutgoingMessage::expecting("Please answer yes or no."))
            }
        },
    }
}

fn parse_yes_no(text: &str) -> Option<bool> {
    match normalize_answer(text).as_str() {
        "yes" | "y" | "yeah" | "yep" | "sure" | "ok" | "okay" | "confirm" => Some(true),
        "no" | "n" | "nope" | "negative" => Some(false),
        _ => None,
    }
}

fn normalize_answer(text: &str) -> String {
    text.trim().trim_end_matches(['.', '!']).trim().to_ascii_lowercase()
}
