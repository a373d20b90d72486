//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use roundtable_engine::orchestrator::{CollaborationSettings, Orchestrator};
use roundtable_engine::participants::ParticipantSet;
use roundtable_engine::policy::RuleEvaluator;
use sdk::collaborator::{AgentInvoker, Criterion, Decision, PolicyEvaluator};
use sdk::errors::{InvocationError, PolicyError};
use sdk::types::{Message, ParticipantId};

pub const TOKEN: &str = "%APPR%";
pub const ANALYST: &str = "BusinessAnalyst";
pub const ENGINEER: &str = "SoftwareEngineer";
pub const OWNER: &str = "ProductOwner";

pub fn team() -> ParticipantSet {
    ParticipantSet::default_team(TOKEN).unwrap()
}

pub fn settings(max_turns: usize) -> CollaborationSettings {
    CollaborationSettings {
        max_turns,
        ..CollaborationSettings::default()
    }
}

pub fn rules() -> Arc<RuleEvaluator> {
    Arc::new(RuleEvaluator::new(team(), TOKEN))
}

pub fn orchestrator(
    invoker: Arc<dyn AgentInvoker>,
    evaluator: Arc<dyn PolicyEvaluator>,
    settings: CollaborationSettings,
) -> Orchestrator {
    Orchestrator::new(team(), invoker, evaluator, settings).unwrap()
}

/// Per-participant queues of replies; records every call
///
/// Once a participant's queue is empty it answers `"<name> reply"`.
#[derive(Default)]
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, InvocationError>>>>,
    calls: Mutex<Vec<(ParticipantId, Vec<Message>)>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, participant: &str, content: &str) -> Self {
        self.push(participant, Ok(content.to_string()))
    }

    pub fn fail(self, participant: &str, error: InvocationError) -> Self {
        self.push(participant, Err(error))
    }

    fn push(self, participant: &str, reply: Result<String, InvocationError>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(participant.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Histories passed to each invocation, in call order
    pub fn calls(&self) -> Vec<(ParticipantId, Vec<Message>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        participant: &ParticipantId,
        history: &[Message],
    ) -> Result<String, InvocationError> {
        self.calls
            .lock()
            .unwrap()
            .push((participant.clone(), history.to_vec()));

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(participant.as_str())
            .and_then(|queue| queue.pop_front());
        next.unwrap_or_else(|| Ok(format!("{} reply", participant)))
    }
}

/// Answers `NextSpeaker` from a script, falling back to the stage rules
pub struct ScriptedEvaluator {
    speakers: Mutex<VecDeque<String>>,
    fallback: RuleEvaluator,
}

impl ScriptedEvaluator {
    pub fn new(speakers: &[&str]) -> Self {
        Self {
            speakers: Mutex::new(speakers.iter().map(|s| s.to_string()).collect()),
            fallback: RuleEvaluator::new(team(), TOKEN),
        }
    }
}

#[async_trait]
impl PolicyEvaluator for ScriptedEvaluator {
    async fn classify(
        &self,
        history: &[Message],
        criterion: Criterion,
    ) -> Result<Decision, PolicyError> {
        if criterion == Criterion::NextSpeaker {
            let scripted = self.speakers.lock().unwrap().pop_front();
            if let Some(name) = scripted {
                return Ok(Decision::new(name));
            }
        }
        self.fallback.classify(history, criterion).await
    }
}

/// Stage rules for selection; every approval check fails
pub struct BrokenApprovalEvaluator {
    fallback: RuleEvaluator,
}

impl BrokenApprovalEvaluator {
    pub fn new() -> Self {
        Self {
            fallback: RuleEvaluator::new(team(), TOKEN),
        }
    }
}

#[async_trait]
impl PolicyEvaluator for BrokenApprovalEvaluator {
    async fn classify(
        &self,
        history: &[Message],
        criterion: Criterion,
    ) -> Result<Decision, PolicyError> {
        match criterion {
            Criterion::Approval => Err(PolicyError::Provider("classifier offline".to_string())),
            Criterion::NextSpeaker => self.fallback.classify(history, criterion).await,
        }
    }
}

/// Hangs forever when `stuck` is invoked; replies immediately otherwise
pub struct HangingInvoker {
    stuck: String,
    pub entered: Arc<Notify>,
}

impl HangingInvoker {
    pub fn new(stuck: &str) -> Self {
        Self {
            stuck: stuck.to_string(),
            entered: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl AgentInvoker for HangingInvoker {
    async fn invoke(
        &self,
        participant: &ParticipantId,
        _history: &[Message],
    ) -> Result<String, InvocationError> {
        if participant.as_str() == self.stuck {
            self.entered.notify_one();
            std::future::pending::<()>().await;
        }
        Ok(format!("{} reply", participant))
    }
}

/// Sleeps before every reply
pub struct SlowInvoker(pub Duration);

#[async_trait]
impl AgentInvoker for SlowInvoker {
    async fn invoke(
        &self,
        participant: &ParticipantId,
        _history: &[Message],
    ) -> Result<String, InvocationError> {
        tokio::time::sleep(self.0).await;
        Ok(format!("{} reply", participant))
    }
}

pub fn speakers(transcript: &[Message]) -> Vec<&str> {
    transcript.iter().map(|m| m.speaker.label()).collect()
}
