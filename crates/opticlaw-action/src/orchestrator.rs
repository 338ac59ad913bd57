//! Task graph execution.
//!
//! Runs nodes in their stored order, checking dependencies incrementally and
//! enforcing the tool capability before each connector call. The first
//! failing tool node ends the run; everything produced so far is returned.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use opticlaw_core::policy::{CapabilityToken, PolicyGate};
use opticlaw_core::types::{ExecutionContext, NodeKind, TaskGraph, TaskNode};

use crate::connector::{ConnectorKind, ConnectorRegistry, ConnectorResult};
use crate::error::ActionError;

/// Capability every tool node must hold.
pub const TOOL_CAPABILITY: &str = "tool.execute";

pub struct ToolOrchestrator {
    policy: Arc<PolicyGate>,
    registry: ConnectorRegistry,
    tool_trust_tier: u8,
}

impl ToolOrchestrator {
    /// Create an orchestrator. Tool nodes require `tool_trust_tier`.
    pub fn new(policy: Arc<PolicyGate>, registry: ConnectorRegistry, tool_trust_tier: u8) -> Self {
        Self {
            policy,
            registry,
            tool_trust_tier,
        }
    }

    /// Execute `graph` under `context`, returning one output per node run.
    ///
    /// A connector failure appends its detail and stops early without error.
    /// Dependency violations and capability denials abort the whole run.
    pub async fn execute(
        &self,
        graph: &TaskGraph,
        context: &ExecutionContext,
    ) -> Result<Vec<String>, ActionError> {
        let mut outputs = Vec::with_capacity(graph.nodes.len());
        let mut completed: HashSet<&str> = HashSet::new();

        for node in &graph.nodes {
            if node.deps.iter().any(|dep| !completed.contains(dep.as_str())) {
                tracing::warn!(
                    task_id = %graph.task_id,
                    node_id = %node.node_id,
                    deps = ?node.deps,
                    "Node has unresolved dependencies"
                );
                return Err(ActionError::UnresolvedDependency {
                    node_id: node.node_id.clone(),
                });
            }

            match node.kind {
                NodeKind::Tool => {
                    let capability = CapabilityToken::new(TOOL_CAPABILITY, self.tool_trust_tier);
                    self.policy
                        .enforce_capability(context.trust_tier, &capability)?;

                    let result = self.run_tool(graph, node, context).await?;
                    outputs.push(result.detail);
                    if !result.success {
                        tracing::warn!(
                            task_id = %graph.task_id,
                            node_id = %node.node_id,
                            "Tool node failed, stopping execution"
                        );
                        break;
                    }
                }
                kind => {
                    tracing::debug!(node_id = %node.node_id, kind = %kind, "Node recorded");
                    outputs.push(format!("[{}] {}", kind, node.instruction));
                }
            }

            completed.insert(node.node_id.as_str());
        }

        tracing::info!(
            task_id = %graph.task_id,
            request_id = %context.request_id,
            outputs = outputs.len(),
            completed = completed.len(),
            "Task graph executed"
        );
        Ok(outputs)
    }

    /// Dispatch one tool node, bounded by the context's time budget.
    async fn run_tool(
        &self,
        graph: &TaskGraph,
        node: &TaskNode,
        context: &ExecutionContext,
    ) -> Result<ConnectorResult, ActionError> {
        let kind = Self::pick_connector(&graph.goal, &node.instruction);
        let connector = self
            .registry
            .get(kind)
            .ok_or(ActionError::ConnectorNotRegistered(kind))?;

        tracing::debug!(
            node_id = %node.node_id,
            connector = %kind,
            instruction = %node.instruction,
            "Dispatching tool node"
        );

        let budget = Duration::from_millis(context.budget_ms);
        match tokio::time::timeout(budget, connector.run(&node.instruction)).await {
            Ok(result) => Ok(result),
            Err(_) => Ok(ConnectorResult::failed(format!(
                "[{}] exceeded budget of {}ms: {}",
                kind, context.budget_ms, node.instruction
            ))),
        }
    }

    /// Email when the goal or instruction carries an email marker, else shell.
    pub fn pick_connector(goal: &str, instruction: &str) -> ConnectorKind {
        let lowered = format!("{} {}", goal, instruction).to_lowercase();
        if lowered.contains("email") || lowered.contains("to=") {
            ConnectorKind::Email
        } else {
            ConnectorKind::Shell
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::Connector;
    use async_trait::async_trait;
    use opticlaw_core::config::ConnectorConfig;
    use opticlaw_core::error::PermissionDenied;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Shell stand-in that fails on a chosen instruction and counts calls.
    struct ScriptedShell {
        fail_on: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for ScriptedShell {
        fn kind(&self) -> ConnectorKind {
            ConnectorKind::Shell
        }

        async fn run(&self, instruction: &str) -> ConnectorResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if instruction == self.fail_on {
                ConnectorResult::failed(format!("failed: {}", instruction))
            } else {
                ConnectorResult::ok(format!("ran: {}", instruction))
            }
        }
    }

    struct SlowShell;

    #[async_trait]
    impl Connector for SlowShell {
        fn kind(&self) -> ConnectorKind {
            ConnectorKind::Shell
        }

        async fn run(&self, _instruction: &str) -> ConnectorResult {
            tokio::time::sleep(Duration::from_secs(60)).await;
            ConnectorResult::ok("too late")
        }
    }

    fn default_orchestrator() -> ToolOrchestrator {
        let mut registry = ConnectorRegistry::new();
        registry.register_defaults(&ConnectorConfig::default());
        ToolOrchestrator::new(Arc::new(PolicyGate::default()), registry, 1)
    }

    fn orchestrator_with(connector: Arc<dyn Connector>) -> ToolOrchestrator {
        let mut registry = ConnectorRegistry::new();
        registry.register(connector);
        ToolOrchestrator::new(Arc::new(PolicyGate::default()), registry, 1)
    }

    fn chained(nodes: Vec<TaskNode>) -> Vec<TaskNode> {
        let mut out: Vec<TaskNode> = Vec::new();
        for node in nodes {
            let node = match out.last() {
                Some(prev) => node.with_deps([prev.node_id.clone()]),
                None => node,
            };
            out.push(node);
        }
        out
    }

    // =========================================================================
    // Output collection
    // =========================================================================

    #[tokio::test]
    async fn test_non_tool_nodes_are_formatted() {
        let graph = TaskGraph::new(
            "think",
            chained(vec![
                TaskNode::new("step_1", NodeKind::Reason, "Understand: think"),
                TaskNode::new("respond", NodeKind::Message, "Summarize outcome for user"),
            ]),
        );
        let outputs = default_orchestrator()
            .execute(&graph, &ExecutionContext::new(0))
            .await
            .unwrap();
        assert_eq!(
            outputs,
            vec![
                "[reason] Understand: think",
                "[message] Summarize outcome for user",
            ]
        );
    }

    #[tokio::test]
    async fn test_tool_node_uses_shell_connector() {
        let graph = TaskGraph::new(
            "run echo ok",
            chained(vec![
                TaskNode::new("step_1", NodeKind::Tool, "echo ok"),
                TaskNode::new("respond", NodeKind::Message, "Summarize outcome for user"),
            ]),
        );
        let outputs = default_orchestrator()
            .execute(&graph, &ExecutionContext::new(1))
            .await
            .unwrap();
        assert_eq!(outputs[0], "[shell-sandbox] executed: echo ok");
        assert_eq!(outputs.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_second_node_stops_execution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orchestrator = orchestrator_with(Arc::new(ScriptedShell {
            fail_on: "false",
            calls: Arc::clone(&calls),
        }));
        let graph = TaskGraph::new(
            "run things",
            chained(vec![
                TaskNode::new("step_1", NodeKind::Reason, "Understand: run things"),
                TaskNode::new("step_2", NodeKind::Tool, "false"),
                TaskNode::new("step_3", NodeKind::Tool, "echo never"),
                TaskNode::new("respond", NodeKind::Message, "Summarize outcome for user"),
            ]),
        );

        let outputs = orchestrator
            .execute(&graph, &ExecutionContext::new(1))
            .await
            .unwrap();

        assert_eq!(outputs, vec!["[reason] Understand: run things", "failed: false"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connector_over_budget_is_a_failure() {
        let orchestrator = orchestrator_with(Arc::new(SlowShell));
        let graph = TaskGraph::new(
            "run slow",
            chained(vec![
                TaskNode::new("step_1", NodeKind::Tool, "slow"),
                TaskNode::new("respond", NodeKind::Message, "Summarize outcome for user"),
            ]),
        );
        let ctx = ExecutionContext::new(1).with_budget(500, 0.05);
        let outputs = orchestrator.execute(&graph, &ctx).await.unwrap();
        assert_eq!(outputs, vec!["[shell] exceeded budget of 500ms: slow"]);
    }

    // =========================================================================
    // Fatal errors
    // =========================================================================

    #[tokio::test]
    async fn test_insufficient_tier_aborts_run() {
        let graph = TaskGraph::new(
            "run echo ok",
            chained(vec![
                TaskNode::new("step_1", NodeKind::Reason, "Understand"),
                TaskNode::new("step_2", NodeKind::Tool, "echo ok"),
            ]),
        );
        let err = default_orchestrator()
            .execute(&graph, &ExecutionContext::new(0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::PermissionDenied(PermissionDenied::InsufficientTier {
                required: 1,
                actual: 0,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_forward_dependency_is_rejected() {
        let graph = TaskGraph::new(
            "goal",
            vec![
                TaskNode::new("step_1", NodeKind::Reason, "a").with_deps(["step_2"]),
                TaskNode::new("step_2", NodeKind::Reason, "b"),
            ],
        );
        let err = default_orchestrator()
            .execute(&graph, &ExecutionContext::new(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::UnresolvedDependency { ref node_id } if node_id == "step_1"
        ));
    }

    #[tokio::test]
    async fn test_unknown_dependency_id_is_rejected() {
        // A node depending on a missing id fails even after successful nodes.
        let graph = TaskGraph::new(
            "goal",
            vec![
                TaskNode::new("step_1", NodeKind::Reason, "a"),
                TaskNode::new("step_2", NodeKind::Message, "b").with_deps(["ghost"]),
            ],
        );
        let err = default_orchestrator()
            .execute(&graph, &ExecutionContext::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::UnresolvedDependency { .. }));
    }

    #[tokio::test]
    async fn test_missing_connector_is_reported() {
        let orchestrator = ToolOrchestrator::new(
            Arc::new(PolicyGate::default()),
            ConnectorRegistry::new(),
            1,
        );
        let graph = TaskGraph::new("run ls", vec![TaskNode::new("step_1", NodeKind::Tool, "ls")]);
        let err = orchestrator
            .execute(&graph, &ExecutionContext::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::ConnectorNotRegistered(ConnectorKind::Shell)));
    }

    // =========================================================================
    // Connector selection
    // =========================================================================

    #[test]
    fn test_pick_connector() {
        assert_eq!(ToolOrchestrator::pick_connector("run ls", "ls"), ConnectorKind::Shell);
        assert_eq!(
            ToolOrchestrator::pick_connector("Send an EMAIL", "draft"),
            ConnectorKind::Email
        );
        assert_eq!(
            ToolOrchestrator::pick_connector("notify", "to=a@b.c;subject=x;body=y"),
            ConnectorKind::Email
        );
    }

    #[tokio::test]
    async fn test_email_goal_routes_to_email_connector() {
        let graph = TaskGraph::new(
            "email to=ana@example.com;subject=Hi;body=Yo",
            vec![TaskNode::new(
                "step_1",
                NodeKind::Tool,
                "to=ana@example.com;subject=Hi;body=Yo",
            )],
        );
        let outputs = default_orchestrator()
            .execute(&graph, &ExecutionContext::new(1))
            .await
            .unwrap();
        assert_eq!(
            outputs,
            vec!["[email-oauth] prepared action: to=ana@example.com;subject=Hi;body=Yo"]
        );
    }
}
