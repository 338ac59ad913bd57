use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OptiClawError, Result};

/// Top-level configuration for the OptiClaw runtime.
///
/// Loaded from `~/.opticlaw/config.toml` by default. Each section corresponds
/// to one stage of the event pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptiClawConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub decomposer: DecomposerConfig,
    #[serde(default)]
    pub connectors: ConnectorConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl OptiClawConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OptiClawConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| OptiClawError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply `OPTICLAW_OLLAMA_URL` / `OPTICLAW_OLLAMA_MODEL` overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("OPTICLAW_OLLAMA_URL").ok(),
            std::env::var("OPTICLAW_OLLAMA_MODEL").ok(),
        )
    }

    fn with_overrides(mut self, ollama_url: Option<String>, ollama_model: Option<String>) -> Self {
        if let Some(url) = ollama_url.filter(|u| !u.trim().is_empty()) {
            self.decomposer.ollama_url = Some(url);
        }
        if let Some(model) = ollama_model.filter(|m| !m.trim().is_empty()) {
            self.decomposer.ollama_model = model;
        }
        self
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Source allow-list and trust tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Event sources admitted by the router.
    pub allowed_sources: Vec<String>,
    /// Minimum trust tier for the `tool.execute` capability.
    pub tool_trust_tier: u8,
    /// Trust tier granted to each plan-and-execute cycle.
    pub default_trust_tier: u8,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_sources: ["telegram", "slack", "discord", "local"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tool_trust_tier: 1,
            default_trust_tier: 1,
        }
    }
}

/// Event admission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Maximum number of event ids remembered for deduplication.
    pub dedupe_cache_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            dedupe_cache_size: 10_000,
        }
    }
}

/// Plan construction and per-cycle budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Maximum number of decomposed steps turned into nodes.
    pub max_steps: usize,
    /// Passed to the model router for every plan.
    pub requires_privacy: bool,
    /// Cost budget for one plan-and-execute cycle.
    pub budget_cost: f64,
    /// Time budget in milliseconds for one plan-and-execute cycle.
    pub budget_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_steps: 6,
            requires_privacy: true,
            budget_cost: 0.05,
            budget_ms: 25_000,
        }
    }
}

/// Step decomposition collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposerConfig {
    /// Ollama base URL. When unset the local heuristic is used.
    pub ollama_url: Option<String>,
    /// Ollama model name.
    pub ollama_model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self {
            ollama_url: None,
            ollama_model: "qwen2.5:3b".to_string(),
            timeout_secs: 15,
        }
    }
}

/// How the shell connector treats an admitted command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellMode {
    /// Report the command without running it.
    #[default]
    Sandbox,
    /// Run the command through `sh -c`.
    Execute,
}

/// Tool connector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub shell_mode: ShellMode,
    /// Timeout for one shell command in seconds.
    pub shell_timeout_secs: u64,
    /// Instructions containing any of these fragments are refused.
    pub shell_denylist: Vec<String>,
    /// Captured output is truncated to this many characters.
    pub max_output_chars: usize,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            shell_mode: ShellMode::Sandbox,
            shell_timeout_secs: 30,
            shell_denylist: ["rm -rf", "mkfs", "shutdown", "reboot", "dd if=", ":(){"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_output_chars: 2000,
        }
    }
}

/// In-memory memory sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Episodic records retained before the oldest is dropped.
    pub max_episodic: usize,
    /// Salience below which semantic and procedural records are compacted away.
    pub compact_threshold: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_episodic: 500,
            compact_threshold: 0.15,
        }
    }
}
