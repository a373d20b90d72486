//! Example running the default three-role team against a local Ollama
//!
//! Prerequisites:
//! - Ollama must be installed and running (https://ollama.ai)
//! - A model must be pulled (e.g., `ollama pull llama3.1:8b`)
//!
//! Run with: cargo run --example ollama_collaboration_example

use std::sync::Arc;

use roundtable_engine::agent::LlmAgentInvoker;
use roundtable_engine::handlers::format_outcome;
use roundtable_engine::llm::{LLMProvider, OllamaProvider};
use roundtable_engine::orchestrator::{CollaborationSettings, Orchestrator, DEFAULT_APPROVAL_TOKEN};
use roundtable_engine::participants::ParticipantSet;
use roundtable_engine::policy::RuleEvaluator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Roundtable Collaboration Example ===\n");

    let provider = Arc::new(OllamaProvider::new("http://localhost:11434", "llama3.1:8b"));
    if !provider.check_health().await {
        eprintln!("✗ Ollama is not reachable at http://localhost:11434");
        eprintln!("\nMake sure Ollama is running:");
        eprintln!("  1. Install Ollama from https://ollama.ai");
        eprintln!("  2. Pull a model: ollama pull llama3.1:8b");
        return Err("Ollama unavailable".into());
    }

    let team = ParticipantSet::default_team(DEFAULT_APPROVAL_TOKEN)?;
    let settings = CollaborationSettings {
        max_turns: 7,
        ..CollaborationSettings::default()
    };

    let orchestrator = Orchestrator::new(
        team.clone(),
        Arc::new(LlmAgentInvoker::new(provider, team.clone())),
        Arc::new(RuleEvaluator::new(team, DEFAULT_APPROVAL_TOKEN)),
        settings,
    )?;

    let request = "Build a todo app with add, complete and delete actions";
    println!("Request: {}\n", request);

    let outcome = orchestrator.run_collaboration(request).await;
    print!("{}", format_outcome(&outcome, orchestrator.participants()));

    Ok(())
}
