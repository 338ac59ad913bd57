//! Error types for graph execution.

use opticlaw_core::error::PermissionDenied;

use crate::connector::ConnectorKind;

/// Fatal errors from [`ToolOrchestrator::execute`](crate::ToolOrchestrator::execute).
///
/// Connector failures are not here: they end the graph early but still
/// return the collected outputs.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Unresolved dependency for node {node_id}")]
    UnresolvedDependency { node_id: String },
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    #[error("Connector not registered: {0}")]
    ConnectorNotRegistered(ConnectorKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_display() {
        let err = ActionError::UnresolvedDependency {
            node_id: "step_2".to_string(),
        };
        assert_eq!(err.to_string(), "Unresolved dependency for node step_2");

        let err = ActionError::ConnectorNotRegistered(ConnectorKind::Email);
        assert_eq!(err.to_string(), "Connector not registered: email");
    }

    #[test]
    fn test_action_error_from_permission_denied() {
        let denied = PermissionDenied::InsufficientTier {
            capability: "tool.execute".to_string(),
            required: 1,
            actual: 0,
        };
        let err: ActionError = denied.clone().into();
        assert!(matches!(err, ActionError::PermissionDenied(ref d) if *d == denied));
        assert_eq!(err.to_string(), denied.to_string());
    }
}
