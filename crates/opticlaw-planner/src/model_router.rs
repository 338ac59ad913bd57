//! Budget-aware model selection.

use opticlaw_core::types::ModelSelection;

/// Maps task complexity, privacy requirement and budget to an execution tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRouter;

impl ModelRouter {
    pub fn new() -> Self {
        Self
    }

    /// Pick a model tier for a request of the given complexity.
    ///
    /// Only complex requests with enough cost budget reach the cloud tier.
    pub fn select(
        &self,
        complexity: f64,
        requires_privacy: bool,
        budget_cost: f64,
    ) -> ModelSelection {
        if requires_privacy && complexity <= 0.4 {
            return ModelSelection::new("local", "tiny", 256, 0.1);
        }
        if complexity <= 0.6 {
            return ModelSelection::new("local", "medium", 512, 0.2);
        }
        if budget_cost >= 0.03 {
            return ModelSelection::new("cloud", "frontier", 1024, 0.2);
        }
        ModelSelection::new("local", "medium", 768, 0.15)
    }
}
