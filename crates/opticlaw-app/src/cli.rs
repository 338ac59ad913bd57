//! CLI argument definitions for the OptiClaw binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use opticlaw_core::types::Priority;
use std::path::PathBuf;

/// OptiClaw: an event-driven agent runtime that triages, plans and executes requests.
#[derive(Parser, Debug)]
#[command(name = "opticlaw", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Source channel the messages are attributed to.
    #[arg(long = "source", default_value = "local")]
    pub source: String,

    #[arg(long = "user", default_value = "cli")]
    pub user: String,

    #[arg(long = "thread", default_value = "main")]
    pub thread: String,

    /// Priority of every message (user_blocking, interactive, background, maintenance).
    #[arg(short = 'p', long = "priority", default_value = "interactive")]
    pub priority: Priority,

    /// How long to dispatch events before shutting down, in milliseconds.
    #[arg(short = 'w', long = "window-ms", default_value_t = 200)]
    pub window_ms: u64,

    /// Messages to ingest. A demo pair is used when none are given.
    pub messages: Vec<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > OPTICLAW_CONFIG env var > ~/.opticlaw/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("OPTICLAW_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter directive.
    ///
    /// Priority: --log-level flag > config file value > "info".
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if !config_level.trim().is_empty() {
            return config_level.to_string();
        }
        "info".to_string()
    }

    /// Messages to ingest, falling back to the demo pair.
    pub fn messages_or_demo(&self) -> Vec<String> {
        if !self.messages.is_empty() {
            return self.messages.clone();
        }
        vec![
            "/status".to_string(),
            "Build a clean prototype and run shell workflow".to_string(),
        ]
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".opticlaw").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".opticlaw").join("config.toml");
    }
    PathBuf::from("config.toml")
}
