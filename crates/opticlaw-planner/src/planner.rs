//! Task graph construction.
//!
//! Classifies each decomposed step into a node kind, chains the nodes
//! linearly, skips repeated tool instructions and guarantees a closing
//! message node.

use std::collections::HashSet;
use std::sync::Arc;

use opticlaw_core::config::PlannerConfig;
use opticlaw_core::types::{EventEnvelope, ModelSelection, NodeKind, TaskGraph, TaskNode};
use regex::Regex;

use crate::decompose::StepDecomposer;
use crate::model_router::ModelRouter;

const COMMAND_MARKER: &str = "execute command:";
const RUN_MARKER: &str = "run ";
const NO_COMMAND: &str = "echo 'No command specified'";
const DRAFT_EMAIL: &str = "to=draft@example.com;subject=Draft;body=Generated draft email action";
const RESPOND_NODE_ID: &str = "respond";
const RESPOND_INSTRUCTION: &str = "Summarize outcome for user";

/// Builds a [`TaskGraph`] and [`ModelSelection`] for an accepted event.
pub struct PlannerEngine {
    router: ModelRouter,
    decomposer: Arc<dyn StepDecomposer>,
    config: PlannerConfig,
    email_pattern: Regex,
}

impl PlannerEngine {
    /// Create a planner over the given router and step decomposer.
    pub fn new(
        router: ModelRouter,
        decomposer: Arc<dyn StepDecomposer>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            router,
            decomposer,
            config,
            email_pattern: Regex::new(
                r"(?i)to=\s*([^;]+?)\s*;\s*subject=\s*([^;]*?)\s*;\s*body=\s*(.+)",
            )
            .expect("Invalid email regex"),
        }
    }

    /// Decompose the event text into a task graph and pick a model for it.
    pub async fn build_plan(
        &self,
        event: &EventEnvelope,
        budget_cost: f64,
    ) -> (TaskGraph, ModelSelection) {
        let complexity = complexity_of(&event.text);
        let model = self
            .router
            .select(complexity, self.config.requires_privacy, budget_cost);
        let draft = self.decomposer.decompose(&event.text).await;

        tracing::debug!(
            event_id = %event.event_id,
            decomposer = %self.decomposer.name(),
            used_model = %draft.used_model,
            steps = draft.steps.len(),
            "Goal decomposed"
        );

        let mut nodes: Vec<TaskNode> = Vec::new();
        let mut seen_tool_instructions: HashSet<String> = HashSet::new();

        for (idx, step) in draft.steps.iter().take(self.config.max_steps).enumerate() {
            let (kind, instruction) = self.classify_step(step, &event.text);

            if kind == NodeKind::Tool && !seen_tool_instructions.insert(instruction.clone()) {
                tracing::debug!(instruction = %instruction, "Skipping repeated tool instruction");
                continue;
            }

            let node = TaskNode::new(format!("step_{}", idx + 1), kind, instruction);
            nodes.push(chain(node, nodes.last()));
        }

        if !nodes.iter().any(|n| n.kind == NodeKind::Message) {
            let node = TaskNode::new(RESPOND_NODE_ID, NodeKind::Message, RESPOND_INSTRUCTION);
            nodes.push(chain(node, nodes.last()));
        }

        let graph = TaskGraph::new(event.text.clone(), nodes);
        tracing::info!(
            task_id = %graph.task_id,
            nodes = graph.nodes.len(),
            model = %model.label(),
            "Plan built"
        );
        (graph, model)
    }

    /// Decide a step's node kind and the instruction its handler receives.
    fn classify_step(&self, step: &str, goal: &str) -> (NodeKind, String) {
        let lower = step.to_lowercase();
        if lower.contains(COMMAND_MARKER) || lower.contains(RUN_MARKER) {
            (NodeKind::Tool, extract_command(step, goal))
        } else if lower.contains("email") {
            (NodeKind::Tool, self.extract_email_instruction(goal))
        } else if lower.contains("summarize") || lower.contains("respond") {
            (NodeKind::Message, step.to_string())
        } else {
            (NodeKind::Reason, step.to_string())
        }
    }

    /// Normalize a `to=;subject=;body=` goal, or draft a placeholder.
    fn extract_email_instruction(&self, goal: &str) -> String {
        match self.email_pattern.captures(goal) {
            Some(caps) => format!(
                "to={};subject={};body={}",
                &caps[1],
                &caps[2],
                caps[3].trim()
            ),
            None => DRAFT_EMAIL.to_string(),
        }
    }
}

/// Word count over 20, clamped to `[0.1, 1.0]`.
fn complexity_of(text: &str) -> f64 {
    (text.split_whitespace().count() as f64 / 20.0).clamp(0.1, 1.0)
}

/// Make `node` depend on the node before it, if any.
fn chain(node: TaskNode, previous: Option<&TaskNode>) -> TaskNode {
    match previous {
        Some(prev) => node.with_deps([prev.node_id.clone()]),
        None => node,
    }
}

/// Text following `marker` (ASCII case-insensitive), with original casing.
fn after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.to_ascii_lowercase()
        .find(marker)
        .map(|pos| text[pos + marker.len()..].trim())
        .filter(|rest| !rest.is_empty())
}

/// Command for a tool step: an explicit `execute command:` wins, then the
/// goal's `run ...` phrase, then the step's own `run ...` phrase.
fn extract_command(step: &str, goal: &str) -> String {
    let lower_step = step.to_ascii_lowercase();
    if lower_step.contains(COMMAND_MARKER) {
        return after_marker(step, COMMAND_MARKER)
            .unwrap_or(NO_COMMAND)
            .to_string();
    }
    after_marker(goal, RUN_MARKER)
        .or_else(|| after_marker(step, RUN_MARKER))
        .unwrap_or(NO_COMMAND)
        .to_string()
}
