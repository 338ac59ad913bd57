use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{DecomposeError, HeuristicDecomposer, PlanDraft, StepDecomposer};

/// Steps kept from a model response.
const MAX_MODEL_STEPS: usize = 6;

/// Decomposition through a local Ollama `/api/generate` endpoint.
///
/// Any failure (network, timeout, bad status, malformed or empty response)
/// falls back to [`HeuristicDecomposer`].
pub struct OllamaDecomposer {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaDecomposer {
    /// Create a decomposer for the Ollama server at `base_url`.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    fn build_body(&self, goal: &str) -> serde_json::Value {
        let prompt = format!(
            "Decompose the goal into 3-6 concise executable steps. \
             Return strict JSON object with key 'steps' as array of strings.\nGoal: {}",
            goal
        );
        json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
        })
    }

    async fn request_steps(&self, goal: &str) -> Result<Vec<String>, DecomposeError> {
        let body: serde_json::Value = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.timeout)
            .json(&self.build_body(goal))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let response_text = body
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        parse_steps(response_text)
    }
}

/// Parse the model's `{"steps": [...]}` payload into trimmed, non-empty steps.
fn parse_steps(response_text: &str) -> Result<Vec<String>, DecomposeError> {
    if response_text.trim().is_empty() {
        return Err(DecomposeError::EmptySteps);
    }
    let parsed: serde_json::Value = serde_json::from_str(response_text)?;
    let steps: Vec<String> = parsed
        .get("steps")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DecomposeError::Malformed("missing 'steps' array".to_string()))?
        .iter()
        .map(|s| match s {
            serde_json::Value::String(text) => text.trim().to_string(),
            other => other.to_string().trim().to_string(),
        })
        .filter(|s| !s.is_empty())
        .take(MAX_MODEL_STEPS)
        .collect();

    if steps.is_empty() {
        return Err(DecomposeError::EmptySteps);
    }
    Ok(steps)
}

#[async_trait]
impl StepDecomposer for OllamaDecomposer {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn decompose(&self, goal: &str) -> PlanDraft {
        match self.request_steps(goal).await {
            Ok(steps) => PlanDraft {
                steps,
                used_model: format!("ollama:{}", self.model),
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    model = %self.model,
                    "Ollama decomposition failed, using heuristic"
                );
                HeuristicDecomposer.decompose(goal).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps_valid() {
        let steps = parse_steps(r#"{"steps": [" Inspect logs ", "Run tests", ""]}"#).unwrap();
        assert_eq!(steps, vec!["Inspect logs", "Run tests"]);
    }

    #[test]
    fn test_parse_steps_truncates_to_six() {
        let steps = parse_steps(r#"{"steps": ["1","2","3","4","5","6","7","8"]}"#).unwrap();
        assert_eq!(steps.len(), 6);
        assert_eq!(steps.last().unwrap(), "6");
    }

    #[test]
    fn test_parse_steps_stringifies_non_strings() {
        let steps = parse_steps(r#"{"steps": [42, "go"]}"#).unwrap();
        assert_eq!(steps, vec!["42", "go"]);
    }

    #[test]
    fn test_parse_steps_errors() {
        assert!(matches!(parse_steps(""), Err(DecomposeError::EmptySteps)));
        assert!(matches!(
            parse_steps(r#"{"steps": []}"#),
            Err(DecomposeError::EmptySteps)
        ));
        assert!(matches!(
            parse_steps(r#"{"plan": ["a"]}"#),
            Err(DecomposeError::Malformed(_))
        ));
        assert!(matches!(
            parse_steps("not json"),
            Err(DecomposeError::Malformed(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let d = OllamaDecomposer::new("http://localhost:11434/", "m", Duration::from_secs(1));
        assert_eq!(d.base_url, "http://localhost:11434");
        assert_eq!(d.build_body("x")["stream"], false);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back_to_heuristic() {
        // Port 9 (discard) is not served locally; the connect fails fast.
        let d = OllamaDecomposer::new("http://127.0.0.1:9", "m", Duration::from_millis(500));
        let draft = d.decompose("run echo hi").await;
        assert_eq!(draft.used_model, "heuristic");
        assert_eq!(draft, HeuristicDecomposer.decompose("run echo hi").await);
    }
}
