//! Connector registry and trait definition.
//!
//! A connector fulfils one tool instruction and reports a success flag plus
//! a detail string. Connectors apply their own safety checks and timeouts
//! and never raise: every problem becomes a failed [`ConnectorResult`].

pub mod email;
pub mod shell;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use opticlaw_core::config::ConnectorConfig;

pub use email::EmailConnector;
pub use shell::ShellConnector;

/// The closed set of connector kinds a tool node can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    Shell,
    Email,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorKind::Shell => write!(f, "shell"),
            ConnectorKind::Email => write!(f, "email"),
        }
    }
}

/// Outcome of one connector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorResult {
    pub success: bool,
    pub detail: String,
}

impl ConnectorResult {
    /// Successful run with the given detail.
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            success: true,
            detail: detail.into(),
        }
    }

    /// Failed run; `detail` says why.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: detail.into(),
        }
    }
}

#[async_trait]
pub trait Connector: Send + Sync {
    fn kind(&self) -> ConnectorKind;

    /// Fulfil `instruction`. Must not hang and must not panic.
    async fn run(&self, instruction: &str) -> ConnectorResult;
}

/// Connectors keyed by kind, looked up explicitly by the orchestrator.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<ConnectorKind, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector, replacing any previous one of the same kind.
    pub fn register(&mut self, connector: Arc<dyn Connector>) {
        self.connectors.insert(connector.kind(), connector);
    }

    /// Register the built-in shell and email connectors.
    pub fn register_defaults(&mut self, config: &ConnectorConfig) {
        self.register(Arc::new(ShellConnector::from_config(config)));
        self.register(Arc::new(EmailConnector::new()));
    }

    /// Look up the connector registered for `kind`.
    pub fn get(&self, kind: ConnectorKind) -> Option<Arc<dyn Connector>> {
        self.connectors.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}
