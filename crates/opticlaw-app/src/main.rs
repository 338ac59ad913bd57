//! OptiClaw application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Ingest the given messages (or the demo pair)
//! 4. Dispatch for the configured window and print each reply

mod cli;

use std::time::Duration;

use clap::Parser;
use opticlaw_core::config::OptiClawConfig;
use opticlaw_core::types::EventEnvelope;
use opticlaw_runtime::OptiClawApp;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = OptiClawConfig::load_or_default(&config_file).with_env_overrides();

    // Tracing. RUST_LOG wins over the flag and the config value.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting OptiClaw v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let app = OptiClawApp::new(config);

    for text in args.messages_or_demo() {
        let event = EventEnvelope::new(&args.source, &args.user, &args.thread, text)
            .with_priority(args.priority);
        match app.ingest(event) {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Duplicate message skipped"),
            Err(e) => {
                tracing::error!(error = %e, "Message rejected");
                return Err(e.into());
            }
        }
    }

    app.run(Duration::from_millis(args.window_ms)).await;

    for reply in app.take_responses() {
        println!("{}", reply);
    }

    Ok(())
}
