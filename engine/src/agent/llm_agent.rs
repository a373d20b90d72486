//! LLM-backed agent invoker
//!
//! Builds a chat request for one participant from the reduced history:
//!
//! 1. A system message carrying the participant's instructions
//! 2. The participant's own earlier messages as `assistant` turns
//! 3. Everyone else's messages as `user` turns, prefixed with the speaker
//!    label so the model can tell the other participants apart

use async_trait::async_trait;
use sdk::collaborator::AgentInvoker;
use sdk::errors::InvocationError;
use sdk::types::{Message, ParticipantId};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::llm::{ChatMessage, LLMError, LLMProvider};
use crate::participants::ParticipantSet;

/// [`AgentInvoker`] that plays every participant through one LLM provider
pub struct LlmAgentInvoker {
    provider: Arc<dyn LLMProvider>,
    participants: ParticipantSet,
}

impl LlmAgentInvoker {
    pub fn new(provider: Arc<dyn LLMProvider>, participants: ParticipantSet) -> Self {
        Self {
            provider,
            participants,
        }
    }

    /// Chat request for `participant` given the reduced history
    pub fn build_request(
        &self,
        participant: &ParticipantId,
        history: &[Message],
    ) -> Result<Vec<ChatMessage>, InvocationError> {
        let persona = self
            .participants
            .get(participant)
            .ok_or_else(|| InvocationError::UnknownParticipant(participant.to_string()))?;

        let mut request = Vec::with_capacity(history.len() + 1);
        request.push(ChatMessage::system(persona.instructions.as_str()));
        for message in history {
            if message.speaker.is_participant(participant) {
                request.push(ChatMessage::assistant(message.content.as_str()));
            } else {
                request.push(ChatMessage::user(format!(
                    "{}: {}",
                    message.speaker, message.content
                )));
            }
        }
        Ok(request)
    }
}

fn invocation_error(err: LLMError) -> InvocationError {
    match err {
        LLMError::Timeout => InvocationError::Timeout,
        other => InvocationError::Provider(other.to_string()),
    }
}

#[async_trait]
impl AgentInvoker for LlmAgentInvoker {
    async fn invoke(
        &self,
        participant: &ParticipantId,
        history: &[Message],
    ) -> Result<String, InvocationError> {
        let request = self.build_request(participant, history)?;

        let start = Instant::now();
        let reply = self
            .provider
            .generate(&request)
            .await
            .map_err(invocation_error)?;

        debug!(
            participant = %participant,
            provider = self.provider.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = reply.len(),
            "Agent replied"
        );

        if reply.trim().is_empty() {
            return Err(InvocationError::EmptyReply(participant.to_string()));
        }
        Ok(reply)
    }
}
