//! Turn Selection Policy
//!
//! Picks the participant who acts next. The choice comes from the
//! [`PolicyEvaluator`] and is validated here: it must name a member of the
//! participant set, and it may never name the speaker of the last message.

use sdk::collaborator::{Criterion, Decision, PolicyEvaluator};
use sdk::errors::PolicyError;
use sdk::types::{Message, ParticipantId};
use std::sync::Arc;
use thiserror::Error;

use crate::participants::ParticipantSet;

/// Why a next speaker could not be selected
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("turn selection failed: {0}")]
    Evaluator(#[from] PolicyError),

    #[error("turn selection named an unknown participant: '{0}'")]
    UnknownParticipant(String),

    #[error("turn selection chose {0}, who spoke last")]
    SelfSuccession(ParticipantId),
}

/// Chooses the next participant from a (reduced) history
pub struct TurnSelectionPolicy {
    participants: Arc<ParticipantSet>,
    evaluator: Arc<dyn PolicyEvaluator>,
}

impl TurnSelectionPolicy {
    pub fn new(participants: Arc<ParticipantSet>, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        Self {
            participants,
            evaluator,
        }
    }

    /// Ask the evaluator for the next speaker and validate the answer
    ///
    /// # Errors
    ///
    /// - [`SelectionError::Evaluator`] if the history is empty or the evaluator fails
    /// - [`SelectionError::UnknownParticipant`] if the decision names no participant
    /// - [`SelectionError::SelfSuccession`] if the decision names the last speaker
    pub async fn next_speaker(&self, history: &[Message]) -> Result<ParticipantId, SelectionError> {
        let last = history.last().ok_or(PolicyError::EmptyHistory)?;
        let decision = self
            .evaluator
            .classify(history, Criterion::NextSpeaker)
            .await?;

        tracing::debug!(decision = %decision, "Turn selection decision");
        self.validate(last, &decision)
    }

    /// Validate a raw decision against the last message
    pub fn validate(
        &self,
        last: &Message,
        decision: &Decision,
    ) -> Result<ParticipantId, SelectionError> {
        let chosen = self
            .participants
            .resolve(decision.as_str())
            .ok_or_else(|| SelectionError::UnknownParticipant(decision.as_str().to_string()))?;

        if last.speaker.is_participant(&chosen.id) {
            return Err(SelectionError::SelfSuccession(chosen.id.clone()));
        }

        Ok(chosen.id.clone())
    }
}
