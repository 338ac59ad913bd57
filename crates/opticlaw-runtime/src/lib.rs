//! Event runtime for OptiClaw.
//!
//! Admission (policy and dedupe), the priority event bus, the in-memory
//! memory sink, and the application that wires triage, planning and tool
//! execution into one dispatch loop.

pub mod app;
pub mod bus;
pub mod error;
pub mod memory;
pub mod router;

pub use app::OptiClawApp;
pub use bus::EventBus;
pub use error::RuntimeError;
pub use memory::{MemoryService, RetrievalSlice};
pub use router::{DedupeCache, EventRouter};
