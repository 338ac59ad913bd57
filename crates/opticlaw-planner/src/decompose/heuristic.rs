use async_trait::async_trait;

use super::{PlanDraft, StepDecomposer};

/// Deterministic, zero-cost decomposition used when no model endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicDecomposer;

impl HeuristicDecomposer {
    pub fn steps_for(goal: &str) -> Vec<String> {
        let cleaned = goal.trim();
        if cleaned.is_empty() {
            return vec!["Clarify user intent".to_string()];
        }

        let candidates: Vec<&str> = cleaned
            .split(['.', ';'])
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        let first = candidates.first().copied().unwrap_or(cleaned);

        let mut steps = vec![format!("Understand: {}", first)];
        steps.extend(
            candidates
                .iter()
                .skip(1)
                .take(2)
                .map(|c| format!("Subtask: {}", c)),
        );

        let lowered = cleaned.to_ascii_lowercase();
        if let Some(pos) = lowered.find("run ") {
            let command = cleaned[pos + "run ".len()..].trim();
            if !command.is_empty() {
                steps.push(format!("Execute command: {}", command));
            }
        }
        if lowered.contains("email") {
            steps.push("Prepare email action safely".to_string());
        }
        steps.push("Summarize outcome for user".to_string());
        steps
    }
}

#[async_trait]
impl StepDecomposer for HeuristicDecomposer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn decompose(&self, goal: &str) -> PlanDraft {
        PlanDraft {
            steps: Self::steps_for(goal),
            used_model: "heuristic".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_goal_asks_for_clarification() {
        assert_eq!(HeuristicDecomposer::steps_for("  "), vec!["Clarify user intent"]);
    }

    #[test]
    fn test_single_sentence_goal() {
        let steps = HeuristicDecomposer::steps_for("Tidy the backlog");
        assert_eq!(
            steps,
            vec!["Understand: Tidy the backlog", "Summarize outcome for user"]
        );
    }

    #[test]
    fn test_at_most_two_subtasks() {
        let steps = HeuristicDecomposer::steps_for("Plan trip. Book hotel; Pack bags. Call mom.");
        assert_eq!(
            steps,
            vec![
                "Understand: Plan trip",
                "Subtask: Book hotel",
                "Subtask: Pack bags",
                "Summarize outcome for user",
            ]
        );
    }

    #[test]
    fn test_run_phrase_adds_command_step_preserving_case() {
        let steps = HeuristicDecomposer::steps_for("Please Run echo OK");
        assert!(steps.contains(&"Execute command: echo OK".to_string()));
    }

    #[test]
    fn test_email_mention_adds_email_step() {
        let steps = HeuristicDecomposer::steps_for("email the team about the outage");
        assert!(steps.contains(&"Prepare email action safely".to_string()));
        assert_eq!(steps.last().unwrap(), "Summarize outcome for user");
    }

    #[tokio::test]
    async fn test_decompose_tags_heuristic_model() {
        let draft = HeuristicDecomposer.decompose("run ls").await;
        assert_eq!(draft.used_model, "heuristic");
        assert_eq!(draft.steps[1], "Execute command: ls");
    }
}
