//! LLM-backed policy evaluator
//!
//! Renders a classification prompt for the requested [`Criterion`] around the
//! last message of the history (the `RESPONSE`) and returns the model's reply
//! verbatim as the [`Decision`]. Validation is left to the policies.

use async_trait::async_trait;
use sdk::collaborator::{Criterion, Decision, PolicyEvaluator};
use sdk::errors::PolicyError;
use sdk::types::Message;
use std::sync::Arc;

use crate::llm::{ChatMessage, LLMError, LLMProvider};
use crate::participants::ParticipantSet;

/// [`PolicyEvaluator`] that asks an LLM to classify the conversation
pub struct LlmPolicyEvaluator {
    provider: Arc<dyn LLMProvider>,
    participants: ParticipantSet,
    approval_token: String,
}

impl LlmPolicyEvaluator {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        participants: ParticipantSet,
        approval_token: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            participants,
            approval_token: approval_token.into(),
        }
    }

    /// Prompt asking for the next participant's name
    pub fn selection_prompt(&self, last: &Message) -> String {
        let stages: Vec<_> = self.participants.iter().collect();

        let roster = stages
            .iter()
            .map(|participant| format!("- {}", participant.id))
            .collect::<Vec<_>>()
            .join("\n");

        let mut rules = vec![format!(
            "- If RESPONSE is user input, it is {}'s turn.",
            self.participants.first().id
        )];
        rules.extend(
            stages
                .windows(2)
                .map(|pair| format!("- If RESPONSE is by {}, it is {}'s turn.", pair[0].id, pair[1].id)),
        );
        if let Some(reviewed) = stages.len().checked_sub(2).and_then(|i| stages.get(i)) {
            rules.push(format!(
                "- If RESPONSE is by {} and contains criticism, it is {}'s turn.",
                self.participants.approver().id,
                reviewed.id
            ));
        }

        format!(
            "Examine the provided RESPONSE and choose the next participant.\n\
             State only the name of the chosen participant without explanation.\n\
             Never choose the participant named in the RESPONSE.\n\n\
             Choose only from these participants:\n\
             {}\n\n\
             Rules:\n\
             {}\n\n\
             RESPONSE:\n{}",
            roster,
            rules.join("\n"),
            render_response(last)
        )
    }

    /// Prompt asking whether the approver signed off
    pub fn termination_prompt(&self, last: &Message) -> String {
        let approver = &self.participants.approver().display_name;
        let token = &self.approval_token;
        format!(
            "Examine the RESPONSE and determine whether the {approver} has approved the work.\n\
             If the work is approved, respond with a single word without explanation: {token}.\n\
             If the {approver} is still providing feedback or criticism, it is not approved.\n\
             If the {approver} says \"{token}\", it is approved.\n\n\
             RESPONSE:\n{}",
            render_response(last)
        )
    }
}

/// `<speaker>: <content>`
fn render_response(message: &Message) -> String {
    format!("{}: {}", message.speaker, message.content)
}

#[async_trait]
impl PolicyEvaluator for LlmPolicyEvaluator {
    async fn classify(
        &self,
        history: &[Message],
        criterion: Criterion,
    ) -> Result<Decision, PolicyError> {
        let last = history.last().ok_or(PolicyError::EmptyHistory)?;

        let prompt = match criterion {
            Criterion::NextSpeaker => self.selection_prompt(last),
            Criterion::Approval => self.termination_prompt(last),
        };

        tracing::debug!(
            provider = self.provider.name(),
            criterion = %criterion,
            question = criterion.description(),
            "Classifying conversation"
        );

        let reply = self
            .provider
            .generate(&[ChatMessage::user(prompt)])
            .await
            .map_err(|e| match e {
                LLMError::Timeout => PolicyError::Timeout,
                other => PolicyError::Provider(other.to_string()),
            })?;

        Ok(Decision::new(reply.trim()))
    }
}
