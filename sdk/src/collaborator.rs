//! Collaborator traits
//!
//! The orchestrator depends on two opaque collaborators:
//!
//! - [`AgentInvoker`]: given a participant and a (reduced) history, produces
//!   that participant's next message.
//! - [`PolicyEvaluator`]: given a history and a [`Criterion`], produces a raw
//!   [`Decision`]. Turn selection and termination both go through it.
//!
//! Both are long-latency calls that may fail. Implementations shared between
//! concurrent runs must tolerate concurrent calls, hence `Send + Sync`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{InvocationError, PolicyError};
use crate::types::{Message, ParticipantId};

/// Produces the next message for a participant
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Invoke `participant` with the given history and return its reply text.
    ///
    /// The orchestrator assigns speaker and sequence when it appends the reply.
    async fn invoke(
        &self,
        participant: &ParticipantId,
        history: &[Message],
    ) -> Result<String, InvocationError>;
}

/// What a policy evaluation is asked to decide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Name the participant who acts next
    NextSpeaker,

    /// Decide whether the approver signed off on the work
    Approval,
}

impl Criterion {
    /// Short human-readable description of the criterion
    pub fn description(&self) -> &'static str {
        match self {
            Criterion::NextSpeaker => "choose the next participant",
            Criterion::Approval => "determine whether the work is approved",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::NextSpeaker => write!(f, "next_speaker"),
            Criterion::Approval => write!(f, "approval"),
        }
    }
}

/// Raw, untrusted output of a classification
///
/// Callers must validate a decision before acting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision(String);

impl Decision {
    /// Wrap raw classifier output
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classifies a conversation history against a criterion
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    /// Classify `history` against `criterion`
    async fn classify(
        &self,
        history: &[Message],
        criterion: Criterion,
    ) -> Result<Decision, PolicyError>;
}
