//! Error types for event handling.

use opticlaw_action::ActionError;
use opticlaw_core::error::PermissionDenied;

/// Errors that end the handling of one event.
///
/// None of these leave the bus or the dedupe cache in a bad state; the
/// dispatch loop logs them and moves on to the next event.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    #[error("Action failed: {0}")]
    Action(#[from] ActionError),
    #[error("Runtime is shutting down")]
    ShuttingDown,
}

/// Convenience result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
