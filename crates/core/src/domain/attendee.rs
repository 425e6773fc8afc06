use serde::{Deserialize, Serialize};

/// Stable per-conversation identity supplied by the channel transport.
/// All dialog state is keyed and isolated by this value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl std::fmt::Display for SessionKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub address: String,
    pub display_name: String,
}

/// One incoming user turn as delivered by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnInput {
    pub session: SessionKey,
    pub text: String,
    pub profile: UserProfile,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeIdentity {
    pub email: String,
    pub display_name: String,
}

impl AttendeeIdentity {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self { email: profile.address.clone(), display_name: profile.display_name.clone() }
    }

    /// Directory display names often carry an org suffix, e.g. `Ada Li (Contracting)`.
    /// The stored name drops the suffix at the first `(`; a name without one
    /// is used unmodified.
    pub fn registered_name(&self) -> String {
        match self.display_name.find('(') {
            Some(position) => {
                let prefix = self.display_name[..position].trim_end();
                if prefix.is_empty() {
                    self.display_name.clone()
                } else {
                    prefix.to_string()
                }
            }
            None => self.display_name.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Yes,
    No,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl std::str::FromStr for RsvpStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(format!("unsupported rsvp status `{other}`")),
        }
    }
}

/// The committed payload of a completed registration. Handed to the
/// directory and notification collaborators; not retained by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeRecord {
    pub email: String,
    pub name: String,
    pub agency: Option<String>,
    pub interests: Option<String>,
    pub rsvp: RsvpStatus,
}
