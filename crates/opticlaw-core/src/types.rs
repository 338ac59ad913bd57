//! Core types and value objects shared by every OptiClaw crate.
//!
//! Defines inbound events, per-cycle execution contexts, task graphs,
//! triage and model-selection results, and memory records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Dispatch priority of an inbound event. Lower rank is dispatched first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    UserBlocking,
    #[default]
    Interactive,
    Background,
    Maintenance,
}

impl Priority {
    /// Queue rank: `UserBlocking` = 0 through `Maintenance` = 3.
    pub fn rank(self) -> u8 {
        match self {
            Priority::UserBlocking => 0,
            Priority::Interactive => 1,
            Priority::Background => 2,
            Priority::Maintenance => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::UserBlocking => write!(f, "user_blocking"),
            Priority::Interactive => write!(f, "interactive"),
            Priority::Background => write!(f, "background"),
            Priority::Maintenance => write!(f, "maintenance"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_blocking" => Ok(Priority::UserBlocking),
            "interactive" => Ok(Priority::Interactive),
            "background" => Ok(Priority::Background),
            "maintenance" => Ok(Priority::Maintenance),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Outcome of triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    FastReply,
    PlanAndExecute,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::FastReply => write!(f, "fast_reply"),
            Decision::PlanAndExecute => write!(f, "plan_and_execute"),
        }
    }
}

/// Kind of a task graph node; selects the handler that interprets its instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Reason,
    Tool,
    Message,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Reason => write!(f, "reason"),
            NodeKind::Tool => write!(f, "tool"),
            NodeKind::Message => write!(f, "message"),
        }
    }
}

/// Tier of a memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Episodic,
    Semantic,
    Procedural,
}

// =============================================================================
// Events
// =============================================================================

/// One inbound request.
///
/// Created by an external producer, admitted by the router, dispatched by the
/// bus exactly once and dropped after handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: String,
    pub source: String,
    pub user_id: String,
    pub thread_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub priority: Priority,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl EventEnvelope {
    /// Create an interactive-priority event with a fresh identifier.
    pub fn new(
        source: impl Into<String>,
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            source: source.into(),
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
            priority: Priority::default(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    /// Set the dispatch priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Per-cycle authorization and budget, owned by a single plan-and-execute cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub request_id: Uuid,
    pub trust_tier: u8,
    pub budget_ms: u64,
    pub budget_cost: f64,
}

impl ExecutionContext {
    /// Create a context with a fresh request id and the default budget.
    pub fn new(trust_tier: u8) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            trust_tier,
            budget_ms: 25_000,
            budget_cost: 0.05,
        }
    }

    /// Set the time and cost budgets.
    pub fn with_budget(mut self, budget_ms: u64, budget_cost: f64) -> Self {
        self.budget_ms = budget_ms;
        self.budget_cost = budget_cost;
        self
    }
}

/// A single step of a task graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub node_id: String,
    pub kind: NodeKind,
    pub instruction: String,
    /// Reserved for approval gating; not enforced yet.
    pub requires_approval: bool,
    /// Ids of nodes that must complete before this one; all appear earlier in the graph.
    pub deps: Vec<String>,
}

impl TaskNode {
    /// Create a node with no dependencies.
    pub fn new(node_id: impl Into<String>, kind: NodeKind, instruction: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            instruction: instruction.into(),
            requires_approval: false,
            deps: Vec::new(),
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }
}

/// An ordered plan whose node sequence is already a valid topological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGraph {
    pub task_id: Uuid,
    pub goal: String,
    pub nodes: Vec<TaskNode>,
}

impl TaskGraph {
    /// Create a graph for `goal` with a fresh task id.
    pub fn new(goal: impl Into<String>, nodes: Vec<TaskNode>) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            goal: goal.into(),
            nodes,
        }
    }

    /// Nodes of the given kind, in graph order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &TaskNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }
}

// =============================================================================
// Decisions and descriptors
// =============================================================================

/// Result of the triage rule cascade. `reason` is diagnostic only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageResult {
    pub decision: Decision,
    pub confidence: f64,
    pub reason: &'static str,
}

/// Execution-tier descriptor chosen by the model router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub provider: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelSelection {
    pub fn new(provider: &str, model: &str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }

    /// `provider:model`, used to label replies.
    pub fn label(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

// =============================================================================
// Memory
// =============================================================================

/// A record handed to the memory sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub memory_type: MemoryType,
    pub content: String,
    pub salience: f64,
    pub entities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Create a record stamped with the current time.
    pub fn new(memory_type: MemoryType, content: impl Into<String>, salience: f64) -> Self {
        Self {
            memory_type,
            content: content.into(),
            salience,
            entities: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
