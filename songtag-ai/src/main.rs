//! songtag-ai - filename-driven audio tagger
//!
//! Scans an input folder for MP3 and Opus files, asks an LLM backend for the
//! metadata each filename implies, and writes tagged copies to an output
//! folder. Sources are never modified.
//!
//! Exit status: 0 when the run completes, 1 on a configuration or startup
//! error, 130 when the operator quits an interactive session.

use anyhow::{Context, Result};
use clap::Parser;
use songtag_ai::services::{
    BatchOrchestrator, InferenceClient, InferenceOptions, Reconciler, RunOutcome,
};
use songtag_ai::{CliArgs, RunConfig};
use songtag_common::config::{default_config_path, load_toml_config};
use songtag_common::logging::init_logging;
use tracing::{error, info, warn};

/// Exit status for an operator quit
const EXIT_ABORTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let loaded = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load configuration file")?,
        None => None,
    };
    let config_found = loaded.is_some();
    let mut toml = loaded.unwrap_or_default();
    if args.log_file.is_some() {
        toml.logging.file = args.log_file.clone();
    }
    init_logging(&toml.logging).context("Failed to initialize logging")?;

    info!("Starting songtag-ai v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) if config_found => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file not found at {}, using defaults", path.display()),
        None => {}
    }

    let config = RunConfig::resolve(&args, &toml).inspect_err(|e| error!("{}", e))?;
    config.validate().inspect_err(|e| error!("{}", e))?;

    let transport = config
        .build_transport()
        .inspect_err(|e| error!("Failed to initialize backend: {}", e))?;

    if config.health_check {
        info!("Checking {} backend at {}", transport.name(), config.base_url);
        transport.health_check().await.inspect_err(|e| {
            error!(
                "Backend {} not reachable at {}: {}",
                transport.name(),
                config.base_url,
                e
            )
        })?;
    }

    let options = InferenceOptions {
        use_existing_context: config.use_existing_context,
        ..InferenceOptions::new(config.model.clone())
    };
    let client = InferenceClient::new(transport, options);
    let reconciler = Reconciler::stdio(config.interactive);

    let mut orchestrator = BatchOrchestrator::new(config, client, reconciler).with_progress_bar();
    match orchestrator.run().await.inspect_err(|e| error!("{}", e))? {
        RunOutcome::Completed(stats) => {
            stats.log_summary();
            match &toml.logging.file {
                Some(path) => println!("Process completed! Check {} for details.", path.display()),
                None => println!("Process completed!"),
            }
            Ok(())
        }
        RunOutcome::Aborted(_) => std::process::exit(EXIT_ABORTED),
    }
}
