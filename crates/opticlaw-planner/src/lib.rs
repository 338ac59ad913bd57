//! Triage and planning for OptiClaw.
//!
//! Decides cheaply whether an event gets a fast reply, and otherwise turns
//! its text into a linear task graph plus a model selection.

pub mod decompose;
pub mod model_router;
pub mod planner;
pub mod triage;

pub use decompose::{
    build_decomposer, HeuristicDecomposer, OllamaDecomposer, PlanDraft, StepDecomposer,
};
pub use model_router::ModelRouter;
pub use planner::PlannerEngine;
pub use triage::TriageEngine;
