//! Run status, stop reasons and the outcome returned to callers

use sdk::errors::{InvocationError, PolicyError};
use sdk::types::{Message, ParticipantId};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::policy::SelectionError;

/// Lifecycle status of a collaboration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The loop is still stepping
    Running,

    /// The approver signed off
    Terminated,

    /// Turn selection or an agent invocation failed
    Failed,

    /// The turn budget ran out before approval
    BudgetExhausted,

    /// The caller cancelled the run
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Terminated => write!(f, "terminated"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::BudgetExhausted => write!(f, "budget exhausted"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Why a run stopped without approval
///
/// These never escape a run as `Err`; they end up in
/// [`CollaborationOutcome::stop_reason`] and in the trailing diagnostic message.
#[derive(Debug, Error)]
pub enum CollaborationError {
    #[error("turn selection failed: {0}")]
    Selection(#[source] PolicyError),

    #[error("turn selection chose {0}, who spoke last")]
    SelfSuccession(ParticipantId),

    #[error("turn selection named an unknown participant: '{0}'")]
    UnknownParticipant(String),

    #[error("{participant} failed: {source}")]
    Invocation {
        participant: ParticipantId,
        #[source]
        source: InvocationError,
    },

    #[error("{participant} did not reply within {}s", .timeout.as_secs_f64())]
    InvocationTimeout {
        participant: ParticipantId,
        timeout: Duration,
    },

    #[error("termination check failed: {0}")]
    TerminationCheck(#[source] PolicyError),

    #[error("turn budget of {limit} exhausted")]
    BudgetExceeded { limit: usize },

    #[error("cancelled by caller")]
    Cancelled,
}

impl CollaborationError {
    /// Terminal status a run ends in when stopped by this error
    pub fn terminal_status(&self) -> RunStatus {
        match self {
            CollaborationError::BudgetExceeded { .. } => RunStatus::BudgetExhausted,
            CollaborationError::Cancelled => RunStatus::Cancelled,
            _ => RunStatus::Failed,
        }
    }
}

impl From<SelectionError> for CollaborationError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::Evaluator(source) => CollaborationError::Selection(source),
            SelectionError::UnknownParticipant(raw) => CollaborationError::UnknownParticipant(raw),
            SelectionError::SelfSuccession(id) => CollaborationError::SelfSuccession(id),
        }
    }
}

/// Result of one collaboration run
#[derive(Debug, Serialize)]
pub struct CollaborationOutcome {
    /// Unique id of the run (also recorded on its tracing span)
    pub run_id: String,

    /// Terminal status
    pub status: RunStatus,

    /// Number of agent messages produced
    pub turns: usize,

    /// Every message after the user seed, including the trailing diagnostic
    pub transcript: Vec<Message>,

    /// Why the run stopped, if not by approval
    #[serde(serialize_with = "serialize_reason")]
    pub stop_reason: Option<CollaborationError>,
}

impl CollaborationOutcome {
    /// Returns true if the approver signed off
    pub fn is_approved(&self) -> bool {
        self.status == RunStatus::Terminated
    }
}

fn serialize_reason<S>(reason: &Option<CollaborationError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match reason {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}
