//! Step decomposition collaborators.
//!
//! Turns a goal into an ordered list of short textual steps. Remote
//! implementations must bound their own latency and fall back to the local
//! heuristic on any failure, so decomposition itself never errors.

mod heuristic;
mod ollama;

use std::sync::Arc;

use async_trait::async_trait;
use opticlaw_core::config::DecomposerConfig;

pub use heuristic::HeuristicDecomposer;
pub use ollama::OllamaDecomposer;

/// Ordered steps for one goal, tagged with the model that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    pub steps: Vec<String>,
    pub used_model: String,
}

/// Reasons a remote decomposition is discarded in favour of the heuristic.
#[derive(Debug, thiserror::Error)]
pub enum DecomposeError {
    #[error("decomposition request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed decomposition response: {0}")]
    Malformed(String),
    #[error("decomposition returned no steps")]
    EmptySteps,
}

impl From<serde_json::Error> for DecomposeError {
    fn from(err: serde_json::Error) -> Self {
        DecomposeError::Malformed(err.to_string())
    }
}

#[async_trait]
pub trait StepDecomposer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Decompose `goal` into ordered steps. May return an empty list.
    async fn decompose(&self, goal: &str) -> PlanDraft;
}

/// Pick the decomposer named by the configuration.
///
/// An Ollama URL selects [`OllamaDecomposer`]; otherwise the deterministic
/// [`HeuristicDecomposer`] is used.
pub fn build_decomposer(config: &DecomposerConfig) -> Arc<dyn StepDecomposer> {
    match config.ollama_url.as_deref() {
        Some(url) => {
            tracing::info!(
                url = %url,
                model = %config.ollama_model,
                "Using Ollama step decomposer"
            );
            Arc::new(OllamaDecomposer::new(
                url,
                &config.ollama_model,
                std::time::Duration::from_secs(config.timeout_secs),
            ))
        }
        None => Arc::new(HeuristicDecomposer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_decomposer_defaults_to_heuristic() {
        let decomposer = build_decomposer(&DecomposerConfig::default());
        assert_eq!(decomposer.name(), "heuristic");
    }

    #[test]
    fn test_build_decomposer_with_url_uses_ollama() {
        let config = DecomposerConfig {
            ollama_url: Some("http://127.0.0.1:11434".to_string()),
            ..DecomposerConfig::default()
        };
        assert_eq!(build_decomposer(&config).name(), "ollama");
    }
}
