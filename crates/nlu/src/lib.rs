//! Intent classification providers for the dialog engine.
//!
//! The engine consumes classification through the `IntentClassifier` seam in
//! `usher-core` and never depends on a concrete provider. This crate ships:
//!
//! - `KeywordClassifier` - deterministic phrase-table recognizer covering
//!   the event-bot vocabulary (RSVP, cancellation, questions, and the
//!   informational asks)
//! - `UnconfiguredClassifier` - the degraded provider; the engine detects it
//!   via `is_configured()` and routes every request down the registration
//!   path after telling the user why
//!
//! The classifier is strictly a translator: it never commits records or
//! decides conversation flow. Those are the engine's calls.

pub mod keyword;
pub mod unconfigured;

pub use keyword::KeywordClassifier;
pub use unconfigured::UnconfiguredClassifier;
