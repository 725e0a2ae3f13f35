// Parley
// Main entry point for the interactive chat binary

use clap::Parser;
use parley_engine::agent::TurnProcessor;
use parley_engine::cli::Cli;
use parley_engine::config::Config;
use parley_engine::console::SessionLoop;
use parley_engine::llm::openai::OpenAIClient;
use parley_engine::llm::ModelClient;
use parley_engine::secrets::Credentials;
use parley_engine::telemetry::init_telemetry_with_level;
use parley_engine::tools::{light_capabilities, CapabilityRegistry};
use sdk::errors::{EngineError, ParleyErrorExt};
use std::sync::Arc;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load_or_default(),
    }
    .unwrap_or_else(|e| fail(&e));

    if let Some(model) = cli.model.as_deref().filter(|m| !m.trim().is_empty()) {
        config.llm.model = model.trim().to_string();
    }
    if let Some(level) = &cli.log {
        config.core.log_level = level.clone();
    }
    if let Err(e) = config.validate() {
        fail(&e);
    }

    init_telemetry_with_level(&config.core.log_level);
    tracing::info!("Parley v{}", env!("CARGO_PKG_VERSION"));

    let credentials = Credentials::from_env().unwrap_or_else(|e| fail(&e));

    let registry = Arc::new(
        CapabilityRegistry::builder()
            .register_all(light_capabilities())?
            .build(),
    );

    let client: Arc<dyn ModelClient> = Arc::new(OpenAIClient::new(credentials, &config.llm)?);
    tracing::info!(
        "Using {} backend with model {} ({} capabilities)",
        client.name(),
        client.model(),
        registry.len()
    );

    let processor = TurnProcessor::new(client).with_max_tool_rounds(config.agent.max_tool_rounds);
    let mut session = SessionLoop::new(config.agent.system_preamble.clone(), registry, processor);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    session.run(stdin, &mut stdout, &mut stderr).await?;

    tracing::info!("Session ended after {} turns", session.state().len());
    Ok(())
}

/// Print a startup diagnostic and exit non-zero
fn fail(err: &EngineError) -> ! {
    eprintln!("Error: {}", err);
    eprintln!("{}", err.user_hint());
    std::process::exit(1);
}
