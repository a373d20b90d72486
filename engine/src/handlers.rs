//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - run: Run one collaboration and print its transcript
//! - participants: List the configured participants
//! - config show / config path: Inspect configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use sdk::collaborator::PolicyEvaluator;
use sdk::errors::{EngineError, RoundtableErrorExt};
use sdk::types::Speaker;

use crate::agent::LlmAgentInvoker;
use crate::config::{Config, PolicyMode};
use crate::llm::{self, LLMProvider};
use crate::orchestrator::{CollaborationOutcome, Orchestrator, RunStatus};
use crate::participants::ParticipantSet;
use crate::policy::{LlmPolicyEvaluator, RuleEvaluator};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Wire the configured participants, invoker and evaluator into an orchestrator
pub fn build_orchestrator(config: &Config, provider: Arc<dyn LLMProvider>) -> Result<Orchestrator> {
    let participants = config
        .participant_set()
        .context("Invalid participant configuration")?;
    let token = config.collaboration.approval_token.clone();

    let evaluator: Arc<dyn PolicyEvaluator> = match config.collaboration.policy {
        PolicyMode::Rule => Arc::new(RuleEvaluator::new(participants.clone(), token)),
        PolicyMode::Llm => Arc::new(LlmPolicyEvaluator::new(
            Arc::clone(&provider),
            participants.clone(),
            token,
        )),
    };
    let invoker = Arc::new(LlmAgentInvoker::new(provider, participants.clone()));

    let orchestrator = Orchestrator::new(
        participants,
        invoker,
        evaluator,
        config.collaboration_settings(),
    )
    .context("Invalid collaboration settings")?;
    Ok(orchestrator)
}

/// Run one collaboration
///
/// Fails before the run starts when the provider is unreachable.
/// Ctrl-C cancels the run; the partial transcript is still printed.
/// Returns the run's terminal status so the caller can pick an exit code.
pub async fn handle_run(input: String, config: &Config, format: OutputFormat) -> Result<RunStatus> {
    let provider = llm::build_provider(&config.llm).context("Failed to create LLM provider")?;
    llm::ensure_healthy(provider.as_ref()).await?;

    let orchestrator = build_orchestrator(config, provider)?;

    if let OutputFormat::Text = format {
        println!("Collaborating on: {}", input);
        println!();
    }

    let cancel = tokio_util::sync::CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling collaboration");
                cancel.cancel();
            }
        })
    };

    let outcome = orchestrator
        .run_collaboration_with_cancel(&input, &cancel)
        .await;
    interrupt.abort();

    match format {
        OutputFormat::Text => print!("{}", format_outcome(&outcome, orchestrator.participants())),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }

    Ok(outcome.status)
}

/// Hint for the first [`EngineError`] in `err`'s cause chain
pub fn error_hint(err: &anyhow::Error) -> Option<&str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<EngineError>())
        .map(|engine_err| engine_err.user_hint())
}

/// Render an outcome as `[Speaker]` blocks followed by a status footer
pub fn format_outcome(outcome: &CollaborationOutcome, participants: &ParticipantSet) -> String {
    let mut out = String::new();

    for message in &outcome.transcript {
        let name = match &message.speaker {
            Speaker::Participant(id) => participants
                .get(id)
                .map(|p| p.display_name.as_str())
                .unwrap_or_else(|| id.as_str()),
            other => other.label(),
        };
        out.push_str(&format!("[{}]\n{}\n\n", name, message.content));
    }

    let footer = match outcome.status {
        RunStatus::Terminated => format!("✓ Approved after {} turns", outcome.turns),
        RunStatus::BudgetExhausted => {
            format!("⚠ Turn budget exhausted after {} turns", outcome.turns)
        }
        RunStatus::Cancelled => format!("⚠ Cancelled after {} turns", outcome.turns),
        RunStatus::Failed | RunStatus::Running => {
            let reason = outcome
                .stop_reason
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            format!("✗ Failed after {} turns: {}", outcome.turns, reason)
        }
    };
    out.push_str(&footer);
    out.push('\n');
    out.push_str(&format!("  Run: {}\n", outcome.run_id));
    out
}

/// List participants in stage order
pub fn handle_participants(config: &Config, format: OutputFormat) -> Result<()> {
    let participants = config
        .participant_set()
        .context("Invalid participant configuration")?;

    match format {
        OutputFormat::Text => {
            println!("Participants (stage order):");
            for (index, participant) in participants.iter().enumerate() {
                let marker = if participants.is_approver(&participant.id) {
                    " (approver)"
                } else {
                    ""
                };
                println!(
                    "  {}. {} [{}]{}",
                    index + 1,
                    participant.display_name,
                    participant.id,
                    marker
                );
            }
        }
        OutputFormat::Json => {
            let list: Vec<_> = participants
                .iter()
                .map(|p| {
                    json!({
                        "name": p.id.as_str(),
                        "display_name": p.display_name,
                        "approver": participants.is_approver(&p.id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
    }
    Ok(())
}

/// Show the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", config.to_toml()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Print the configuration file location
pub fn handle_config_path(path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => {
            let output = json!({
                "path": path.display().to_string(),
                "exists": path.exists(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
