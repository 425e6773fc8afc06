use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use usher_core::{OutgoingMessage, SessionKey, TurnDispatcher};

use crate::envelope::TurnEnvelope;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport delivery failed: {0}")]
    Deliver(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// The raw send/receive primitive the engine never sees past. Implementations
/// wrap a concrete chat surface; the noop variant lets the server boot with
/// no channel credentials.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<TurnEnvelope>, TransportError>;
    async fn deliver(
        &self,
        session: &SessionKey,
        messages: &[OutgoingMessage],
    ) -> Result<(), TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopChannelTransport;

#[async_trait]
impl ChannelTransport for NoopChannelTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<TurnEnvelope>, TransportError> {
        Ok(None)
    }

    async fn deliver(
        &self,
        _session: &SessionKey,
        _messages: &[OutgoingMessage],
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// The pump loop: one envelope at a time, acknowledged on receipt, dispatched
/// to the engine, reply batch delivered back. Per-turn failures are logged
/// and the loop continues; transport failures reconnect with capped backoff
/// and degrade without crashing once retries are exhausted.
pub struct ChannelRunner {
    transport: Arc<dyn ChannelTransport>,
    dispatcher: Arc<TurnDispatcher>,
    reconnect_policy: ReconnectPolicy,
}

impl ChannelRunner {
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        dispatcher: Arc<TurnDispatcher>,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "channel transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "channel retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening channel transport connection");
        self.transport.connect().await?;
        info!(attempt, "channel transport connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "channel transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            info!(
                event_name = "ingress.channel.envelope_received",
                envelope_id = %envelope.envelope_id,
                correlation_id = %envelope.envelope_id,
                session_key = %envelope.turn.session,
                "received turn envelope"
            );

            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    event_name = "ingress.channel.ack_failed",
                    envelope_id = %envelope.envelope_id,
                    session_key = %envelope.turn.session,
                    error = %error,
                    "failed to acknowledge turn envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.channel.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    session_key = %envelope.turn.session,
                    "acknowledged turn envelope"
                );
            }

            let replies = match self.dispatcher.handle_turn(&envelope.turn).await {
                Ok(replies) => replies,
                Err(error) => {
                    warn!(
                        envelope_id = %envelope.envelope_id,
                        session_key = %envelope.turn.session,
                        error = %error,
                        "turn dispatch failed; continuing channel loop"
                    );
                    vec![OutgoingMessage::ignoring(error.user_message())]
                }
            };

            if let Err(error) = self.transport.deliver(&envelope.turn.session, &replies).await {
                warn!(
                    envelope_id = %envelope.envelope_id,
                    session_key = %envelope.turn.session,
                    error = %error,
                    "reply delivery failed; continuing channel loop"
                );
            }
        }
    }
}
