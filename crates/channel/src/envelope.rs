use usher_core::{SessionKey, TurnInput, UserProfile};

/// One incoming turn with the transport's envelope id, used for
/// acknowledgement and as the correlation id in ingress logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnEnvelope {
    pub envelope_id: String,
    pub turn: TurnInput,
}

impl TurnEnvelope {
    pub fn new(
        envelope_id: impl Into<String>,
        session: impl Into<String>,
        text: impl Into<String>,
        address: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            envelope_id: envelope_id.into(),
            turn: TurnInput {
                session: SessionKey(session.into()),
                text: text.into(),
                profile: UserProfile {
                    address: address.into(),
                    display_name: display_name.into(),
                },
            },
        }
    }
}
