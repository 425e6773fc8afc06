use async_trait::async_trait;

use usher_core::nlu::{ClassificationResult, ClassifyError, Intent, IntentClassifier};

/// Deterministic phrase-table recognizer. Phrases match on word boundaries
/// ("hi" never fires inside "this") and rules are checked in order, so
/// cancellation phrases win over the plain RSVP vocabulary they contain.
/// An exact utterance match scores higher than an embedded phrase; anything
/// unmatched comes back as `Unknown` with low confidence so the root falls
/// through to its "didn't understand" reply.
#[derive(Clone, Debug, Default)]
pub struct KeywordClassifier;

const EXACT_MATCH_CONFIDENCE: f64 = 0.95;
const PHRASE_MATCH_CONFIDENCE: f64 = 0.75;
const UNKNOWN_CONFIDENCE: f64 = 0.1;

const RULES: &[(Intent, &[&str])] = &[
    (
        Intent::CancelRsvp,
        &[
            "cancel my rsvp",
            "cancel rsvp",
            "cancel my registration",
            "not going",
            "can't make it",
            "cannot make it",
            "withdraw my rsvp",
        ],
    ),
    (
        Intent::Question,
        &["question", "ask the organizers", "something to ask"],
    ),
    (
        Intent::Participants,
        &["who's attending", "who is attending", "who else is going", "attendees", "participants"],
    ),
    (
        Intent::AddToCalendar,
        &["add the event to my calendar", "add to my calendar", "calendar file", "calendar", "ics"],
    ),
    (
        Intent::EventDetails,
        &[
            "when and where",
            "where is the event",
            "when is the event",
            "event details",
            "what time",
            "location",
            "venue",
        ],
    ),
    (
        Intent::Greeting,
        &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"],
    ),
    (
        Intent::Rsvp,
        &["rsvp", "register", "sign me up", "count me in", "i'll be there", "attend"],
    ),
];

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn recognize(&self, text: &str) -> ClassificationResult {
        let tokens = tokenize(text);

        for (intent, phrases) in RULES {
            for phrase in *phrases {
                let phrase_tokens = tokenize(phrase);
                if tokens == phrase_tokens {
                    return self.enrich(*intent, EXACT_MATCH_CONFIDENCE, text);
                }
                if contains_phrase(&tokens, &phrase_tokens) {
                    return self.enrich(*intent, PHRASE_MATCH_CONFIDENCE, text);
                }
            }
        }

        ClassificationResult::new(Intent::Unknown, UNKNOWN_CONFIDENCE)
    }

    fn enrich(&self, intent: Intent, confidence: f64, text: &str) -> ClassificationResult {
        let result = ClassificationResult::new(intent, confidence);
        if intent == Intent::Question {
            if let Some(question) = inline_question(text) {
                return result.with_entity("question", question);
            }
        }
        result
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        Ok(self.recognize(text))
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_alphanumeric() || character == '\'' {
            sanitized.push(character.to_ascii_lowercase());
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(str::to_string).collect()
}

fn contains_phrase(tokens: &[String], phrase_tokens: &[String]) -> bool {
    if phrase_tokens.is_empty() || phrase_tokens.len() > tokens.len() {
        return false;
    }
    tokens.windows(phrase_tokens.len()).any(|window| window == phrase_tokens)
}

/// `question: how long is lunch?` carries the question inline; capture it so
/// the submission waterfall can skip its first prompt.
fn inline_question(text: &str) -> Option<String> {
    let (prefix, rest) = text.split_once(':')?;
    if !prefix.to_ascii_lowercase().contains("question") {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}
