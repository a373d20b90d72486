//! Orchestration Loop
//!
//! Drives one collaboration from the user's request to a terminal state:
//!
//! 1. Seed the message log with the user input
//! 2. Ask the turn selection policy for the next speaker (reduced history)
//! 3. Invoke that participant with the reduced history
//! 4. Append the reply and count the turn
//! 5. Ask the termination policy whether the approver signed off
//! 6. Stop at the turn budget if the run has not terminated
//!
//! Every external call is raced against the caller's cancellation token and
//! bounded by the configured call timeout. Failures never escape a run: they
//! become a terminal [`RunStatus`] plus a trailing `System` diagnostic in the
//! returned transcript.
//!
//! # Limits
//!
//! - At most `max_turns` agent messages per run
//! - `call_timeout` per selection, invocation and termination call

pub mod outcome;

pub use outcome::{CollaborationError, CollaborationOutcome, RunStatus};

use sdk::collaborator::{AgentInvoker, PolicyEvaluator};
use sdk::errors::{EngineError, PolicyError};
use sdk::types::{ParticipantId, Speaker};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::conversation::{HistoryReducer, MessageLog};
use crate::participants::ParticipantSet;
use crate::policy::{CycleProgress, TerminationPolicy, TurnSelectionPolicy};

/// Default maximum number of agent turns per run
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Default approval token
pub const DEFAULT_APPROVAL_TOKEN: &str = "%APPR%";

/// Default timeout for each external call in seconds
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;

/// Prefix of the diagnostic message appended when a run stops without approval
pub const DIAGNOSTIC_PREFIX: &str = "Collaboration stopped";

/// Settings fixed for the lifetime of an orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaborationSettings {
    /// Messages exposed to agents and policies
    pub history_window: usize,

    /// Maximum agent turns before the run is stopped
    pub max_turns: usize,

    /// Literal the approver uses to sign off
    pub approval_token: String,

    /// Bound on each external call
    pub call_timeout: Duration,
}

impl Default for CollaborationSettings {
    fn default() -> Self {
        Self {
            history_window: crate::conversation::reducer::DEFAULT_TARGET_COUNT,
            max_turns: DEFAULT_MAX_TURNS,
            approval_token: DEFAULT_APPROVAL_TOKEN.to_string(),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

impl CollaborationSettings {
    /// Validate the settings
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the history window, the turn budget
    /// or the call timeout is zero, or if the approval token is blank.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.history_window == 0 {
            return Err(EngineError::Config(
                "history_window must be at least 1".to_string(),
            ));
        }
        if self.max_turns == 0 {
            return Err(EngineError::Config(
                "max_turns must be at least 1".to_string(),
            ));
        }
        if self.approval_token.trim().is_empty() {
            return Err(EngineError::Config(
                "approval_token must not be empty".to_string(),
            ));
        }
        if self.call_timeout.is_zero() {
            return Err(EngineError::Config(
                "call_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// State owned by a single run
struct ConversationState {
    log: MessageLog,
    turn_count: usize,
    cycle: CycleProgress,
    status: RunStatus,
}

impl ConversationState {
    fn seeded(input: &str) -> Self {
        let mut log = MessageLog::new();
        log.append(Speaker::User, input);
        Self {
            log,
            turn_count: 0,
            cycle: CycleProgress::new(),
            status: RunStatus::Running,
        }
    }
}

/// What a completed step means for the loop
enum StepOutcome {
    Continue,
    Approved,
}

/// Result of an external call raced against cancellation and the call timeout
enum Guarded<T> {
    Done(T),
    TimedOut,
    Cancelled,
}

/// Runs collaborations between a fixed set of participants
///
/// Holds no per-run state, so one orchestrator can serve many concurrent runs.
pub struct Orchestrator {
    participants: Arc<ParticipantSet>,
    invoker: Arc<dyn AgentInvoker>,
    selection: TurnSelectionPolicy,
    termination: TerminationPolicy,
    reducer: HistoryReducer,
    settings: CollaborationSettings,
}

impl Orchestrator {
    /// Create an orchestrator
    ///
    /// The evaluator serves both turn selection and termination.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the settings are invalid.
    pub fn new(
        participants: ParticipantSet,
        invoker: Arc<dyn AgentInvoker>,
        evaluator: Arc<dyn PolicyEvaluator>,
        settings: CollaborationSettings,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        let reducer = HistoryReducer::new(settings.history_window)?;
        let participants = Arc::new(participants);

        Ok(Self {
            selection: TurnSelectionPolicy::new(Arc::clone(&participants), Arc::clone(&evaluator)),
            termination: TerminationPolicy::new(
                Arc::clone(&participants),
                evaluator,
                settings.approval_token.clone(),
            ),
            participants,
            invoker,
            reducer,
            settings,
        })
    }

    pub fn participants(&self) -> &ParticipantSet {
        &self.participants
    }

    pub fn settings(&self) -> &CollaborationSettings {
        &self.settings
    }

    /// Run a collaboration to completion
    pub async fn run_collaboration(&self, input: &str) -> CollaborationOutcome {
        self.run_collaboration_with_cancel(input, &CancellationToken::new())
            .await
    }

    /// Run a collaboration that stops promptly once `cancel` fires
    ///
    /// A cancelled run returns its partial transcript with [`RunStatus::Cancelled`].
    pub async fn run_collaboration_with_cancel(
        &self,
        input: &str,
        cancel: &CancellationToken,
    ) -> CollaborationOutcome {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("collaboration", run_id = %run_id);
        self.drive(run_id, input, cancel).instrument(span).await
    }

    async fn drive(
        &self,
        run_id: String,
        input: &str,
        cancel: &CancellationToken,
    ) -> CollaborationOutcome {
        let start = Instant::now();
        let mut state = ConversationState::seeded(input);

        info!(
            participants = self.participants.len(),
            max_turns = self.settings.max_turns,
            "Starting collaboration"
        );

        let stop_reason = loop {
            if cancel.is_cancelled() {
                break Some(CollaborationError::Cancelled);
            }
            match self.step(&mut state, cancel).await {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Approved) => break None,
                Err(reason) => break Some(reason),
            }
        };

        state.status = match &stop_reason {
            None => RunStatus::Terminated,
            Some(reason) => reason.terminal_status(),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &stop_reason {
            None => info!(turns = state.turn_count, elapsed_ms, "Collaboration approved"),
            Some(reason) => {
                match state.status {
                    RunStatus::Failed => warn!(
                        turns = state.turn_count,
                        elapsed_ms,
                        error = %reason,
                        "Collaboration failed"
                    ),
                    _ => info!(
                        turns = state.turn_count,
                        elapsed_ms,
                        status = %state.status,
                        "Collaboration stopped"
                    ),
                }
                state
                    .log
                    .append(Speaker::System, format!("{}: {}", DIAGNOSTIC_PREFIX, reason));
            }
        }

        CollaborationOutcome {
            run_id,
            status: state.status,
            turns: state.turn_count,
            transcript: state.log.into_transcript(),
            stop_reason,
        }
    }

    /// Take one agent turn
    async fn step(
        &self,
        state: &mut ConversationState,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, CollaborationError> {
        // Select
        let history = self.reducer.reduce(state.log.messages());
        let selected = self
            .guard(cancel, self.selection.next_speaker(history))
            .await;
        let speaker = match selected {
            Guarded::Done(result) => result?,
            Guarded::TimedOut => return Err(CollaborationError::Selection(PolicyError::Timeout)),
            Guarded::Cancelled => return Err(CollaborationError::Cancelled),
        };

        debug!(
            turn = state.turn_count + 1,
            participant = %speaker,
            "Invoking participant"
        );

        // Invoke
        let history = self.reducer.reduce(state.log.messages());
        let invoked = self.guard(cancel, self.invoker.invoke(&speaker, history)).await;
        let reply = match invoked {
            Guarded::Done(Ok(reply)) => reply,
            Guarded::Done(Err(source)) => {
                return Err(CollaborationError::Invocation {
                    participant: speaker,
                    source,
                })
            }
            Guarded::TimedOut => {
                return Err(CollaborationError::InvocationTimeout {
                    participant: speaker,
                    timeout: self.settings.call_timeout,
                })
            }
            Guarded::Cancelled => return Err(CollaborationError::Cancelled),
        };

        self.record_turn(state, speaker, reply);

        // Check for approval
        let history = self.reducer.reduce(state.log.messages());
        let checked = self
            .guard(
                cancel,
                self.termination.should_terminate(history, &state.cycle),
            )
            .await;
        let approved = match checked {
            Guarded::Done(Ok(approved)) => approved,
            Guarded::Done(Err(e)) => {
                let err = CollaborationError::TerminationCheck(e);
                warn!(error = %err, "Continuing after failed termination check");
                false
            }
            Guarded::TimedOut => {
                let err = CollaborationError::TerminationCheck(PolicyError::Timeout);
                warn!(error = %err, "Continuing after failed termination check");
                false
            }
            Guarded::Cancelled => return Err(CollaborationError::Cancelled),
        };

        if approved {
            return Ok(StepOutcome::Approved);
        }
        if state.turn_count >= self.settings.max_turns {
            return Err(CollaborationError::BudgetExceeded {
                limit: self.settings.max_turns,
            });
        }
        Ok(StepOutcome::Continue)
    }

    fn record_turn(&self, state: &mut ConversationState, speaker: ParticipantId, reply: String) {
        state.cycle.observe(&self.participants, &speaker);
        let message = state.log.append(Speaker::Participant(speaker), reply);
        state.turn_count += 1;
        debug!(
            turn = state.turn_count,
            stages_seen = state.cycle.stages_seen(),
            sequence = message.sequence,
            chars = message.content.len(),
            "Recorded reply"
        );
    }

    /// Await `fut` unless the run is cancelled or the call timeout elapses first
    async fn guard<F, T>(&self, cancel: &CancellationToken, fut: F) -> Guarded<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Guarded::Cancelled,
            result = tokio::time::timeout(self.settings.call_timeout, fut) => match result {
                Ok(value) => Guarded::Done(value),
                Err(_) => Guarded::TimedOut,
            },
        }
    }
}
