//! Channel transport seam for the dialog engine.
//!
//! The engine is transport-agnostic: it consumes `{text, user identity,
//! display name}` turns and produces outgoing message batches. This crate
//! owns the boundary:
//!
//! - `TurnEnvelope` - one delivered turn plus its transport envelope id
//! - `ChannelTransport` - connect / read / deliver / acknowledge seam, with
//!   a noop implementation for preview and test runs
//! - `ChannelRunner` - the pump loop: read an envelope, acknowledge it,
//!   hand the turn to the dispatcher, deliver the reply batch, and keep
//!   going on per-turn failures; reconnects with capped backoff
//!
//! Ordering is the transport's contract: turns for one session must be
//! delivered in arrival order, and duplicates suppressed upstream.

pub mod envelope;
pub mod transport;

pub use envelope::TurnEnvelope;
pub use transport::{
    ChannelRunner, ChannelTransport, NoopChannelTransport, ReconnectPolicy, TransportError,
};
