// Roundtable collaboration orchestrator
// Main entry point for the roundtable binary

use anyhow::Context;
use clap::Parser;
use roundtable_engine::cli::{Cli, Command, ConfigAction};
use roundtable_engine::config::Config;
use roundtable_engine::handlers::{
    error_hint, handle_config_path, handle_config_show, handle_participants, handle_run,
    OutputFormat,
};
use roundtable_engine::orchestrator::RunStatus;
use roundtable_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {:#}", err);
        if let Some(hint) = error_hint(&err) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let config = if cli.config.is_some() {
        Config::load_from_path(&config_path)
    } else {
        Config::load_or_create()
    }
    .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::debug!("Roundtable v{} ({} - {})", version, commit, timestamp);

    // Handle commands
    match cli.command {
        Command::Run { input } => {
            tracing::info!(
                provider = %config.llm.default_provider,
                policy = %config.collaboration.policy,
                "Running collaboration"
            );
            let status = handle_run(input, &config, format).await?;
            if status == RunStatus::Failed {
                std::process::exit(1);
            }
            Ok(())
        }

        Command::Participants => handle_participants(&config, format),

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(&config_path, format),
        },
    }
}
