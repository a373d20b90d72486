//! Conversation message types
//!
//! A collaboration is an ordered log of [`Message`]s. Each message is tagged
//! with the [`Speaker`] that produced it: the user who seeded the run, one of
//! the configured participants, or the orchestrator itself when it records a
//! diagnostic.
//!
//! Messages serialize as `{"role": ..., "message": ..., "sequence": ...}`,
//! the transcript shape consumed by presentation layers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Label of the sentinel speaker that seeds every run
pub const USER_LABEL: &str = "user";

/// Label of the orchestrator's own diagnostic entries
pub const SYSTEM_LABEL: &str = "System";

/// Identity of a configured participant (its unique name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a participant identity from its configured name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The participant's name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Producer of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Speaker {
    /// The user who submitted the initial request
    User,

    /// A configured participant
    Participant(ParticipantId),

    /// The orchestrator (diagnostic entries only)
    System,
}

impl Speaker {
    /// Wire label for this speaker
    pub fn label(&self) -> &str {
        match self {
            Speaker::User => USER_LABEL,
            Speaker::Participant(id) => id.as_str(),
            Speaker::System => SYSTEM_LABEL,
        }
    }

    /// Parse a wire label. Anything that is not a reserved label names a participant.
    pub fn from_label(label: &str) -> Self {
        match label {
            USER_LABEL => Speaker::User,
            SYSTEM_LABEL => Speaker::System,
            other => Speaker::Participant(ParticipantId::new(other)),
        }
    }

    /// The participant identity, if this speaker is a participant
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Speaker::Participant(id) => Some(id),
            _ => None,
        }
    }

    /// Returns true if this speaker is the given participant
    pub fn is_participant(&self, id: &ParticipantId) -> bool {
        self.participant() == Some(id)
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Speaker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Speaker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Speaker::from_label(&label))
    }
}

/// One entry in a conversation log
///
/// Messages are immutable once appended; `sequence` is the position assigned
/// by the log at insertion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message
    #[serde(rename = "role")]
    pub speaker: Speaker,

    /// Free-form text payload
    #[serde(rename = "message")]
    pub content: String,

    /// Insertion position in the log
    pub sequence: u64,
}

impl Message {
    /// Create a new message
    pub fn new(speaker: Speaker, content: impl Into<String>, sequence: u64) -> Self {
        Self {
            speaker,
            content: content.into(),
            sequence,
        }
    }

    /// Returns true if the content contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.content.contains(needle)
    }
}
