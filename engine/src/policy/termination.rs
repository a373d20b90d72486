//! Termination Policy
//!
//! Decides after each agent reply whether the collaboration is complete. Only
//! the approver can end a run, never before every stage has spoken in stage
//! order at least once, and only when the classifier answers with the
//! approval token.

use sdk::collaborator::{Criterion, Decision, PolicyEvaluator};
use sdk::errors::PolicyError;
use sdk::types::{Message, ParticipantId};
use std::sync::Arc;

use crate::participants::ParticipantSet;

/// How far a run has walked through the stage order
///
/// Stage `i` only counts once stage `i - 1` has been seen, so a selector that
/// skips a stage never completes the cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleProgress {
    stages_seen: usize,
}

impl CycleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `speaker` produced a message
    pub fn observe(&mut self, participants: &ParticipantSet, speaker: &ParticipantId) {
        let expected = participants.iter().nth(self.stages_seen);
        if expected.is_some_and(|p| &p.id == speaker) {
            self.stages_seen += 1;
        }
    }

    /// Number of stages completed in order
    pub fn stages_seen(&self) -> usize {
        self.stages_seen
    }

    /// Returns true once every stage has spoken in order
    pub fn is_complete(&self, participants: &ParticipantSet) -> bool {
        self.stages_seen >= participants.len()
    }
}

/// Decides whether a run should stop
pub struct TerminationPolicy {
    participants: Arc<ParticipantSet>,
    evaluator: Arc<dyn PolicyEvaluator>,
    approval_token: String,
}

impl TerminationPolicy {
    pub fn new(
        participants: Arc<ParticipantSet>,
        evaluator: Arc<dyn PolicyEvaluator>,
        approval_token: impl Into<String>,
    ) -> Self {
        Self {
            participants,
            evaluator,
            approval_token: approval_token.into(),
        }
    }

    /// Returns true if the approval check applies to this history
    ///
    /// The last message must come from the approver and the run must have
    /// completed one full cycle through the stages.
    pub fn is_eligible(&self, history: &[Message], progress: &CycleProgress) -> bool {
        if !progress.is_complete(&self.participants) {
            return false;
        }
        history
            .last()
            .and_then(|m| m.speaker.participant())
            .is_some_and(|id| self.participants.is_approver(id))
    }

    /// Returns true if the decision carries the approval token
    pub fn is_approval(&self, decision: &Decision) -> bool {
        decision.as_str().contains(&self.approval_token)
    }

    /// Decide whether to stop after the latest message
    ///
    /// `progress` covers the whole run, not just the reduced `history`.
    pub async fn should_terminate(
        &self,
        history: &[Message],
        progress: &CycleProgress,
    ) -> Result<bool, PolicyError> {
        if !self.is_eligible(history, progress) {
            return Ok(false);
        }

        let decision = self
            .evaluator
            .classify(history, Criterion::Approval)
            .await?;

        tracing::debug!(decision = %decision, "Termination decision");
        Ok(self.is_approval(&decision))
    }
}
