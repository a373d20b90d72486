//! Deterministic policy evaluator
//!
//! Answers both criteria from the stage order alone, without any I/O:
//! the next speaker is the stage after the last speaker, and the work is
//! approved when the last message contains the approval token.

use async_trait::async_trait;
use sdk::collaborator::{Criterion, Decision, PolicyEvaluator};
use sdk::errors::PolicyError;
use sdk::types::Message;

use super::CONTINUE_DECISION;
use crate::participants::ParticipantSet;

/// Rule-based [`PolicyEvaluator`]
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    participants: ParticipantSet,
    approval_token: String,
}

impl RuleEvaluator {
    pub fn new(participants: ParticipantSet, approval_token: impl Into<String>) -> Self {
        Self {
            participants,
            approval_token: approval_token.into(),
        }
    }
}

#[async_trait]
impl PolicyEvaluator for RuleEvaluator {
    async fn classify(
        &self,
        history: &[Message],
        criterion: Criterion,
    ) -> Result<Decision, PolicyError> {
        let last = history.last().ok_or(PolicyError::EmptyHistory)?;

        match criterion {
            Criterion::NextSpeaker => self
                .participants
                .stage_after(&last.speaker)
                .map(|next| Decision::new(next.id.as_str()))
                .ok_or_else(|| {
                    PolicyError::Unavailable(format!("no stage follows {}", last.speaker))
                }),
            Criterion::Approval => {
                if last.contains(&self.approval_token) {
                    Ok(Decision::new(self.approval_token.as_str()))
                } else {
                    Ok(Decision::new(CONTINUE_DECISION))
                }
            }
        }
    }
}
