//! Tool execution for OptiClaw.
//!
//! Runs a task graph node by node, enforcing capability requirements and
//! dispatching tool nodes to pluggable connectors.

pub mod connector;
pub mod error;
pub mod orchestrator;

pub use connector::{
    Connector, ConnectorKind, ConnectorRegistry, ConnectorResult, EmailConnector, ShellConnector,
};
pub use error::ActionError;
pub use orchestrator::ToolOrchestrator;
