pub mod config;
pub mod error;
pub mod policy;
pub mod types;

pub use config::OptiClawConfig;
pub use error::{OptiClawError, PermissionDenied, Result};
pub use policy::{CapabilityToken, PolicyGate};
pub use types::*;
