//! Source allow-listing and trust-tier capability checks.

use std::collections::HashSet;

use crate::config::PolicyConfig;
use crate::error::PermissionDenied;

/// A named permission and the minimum trust tier that may exercise it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityToken {
    pub name: String,
    pub trust_tier_required: u8,
}

impl CapabilityToken {
    /// Create a token for capability `name`.
    pub fn new(name: impl Into<String>, trust_tier_required: u8) -> Self {
        Self {
            name: name.into(),
            trust_tier_required,
        }
    }
}

/// Stateless authorization gate. Both checks are deterministic and do no I/O.
#[derive(Debug, Clone)]
pub struct PolicyGate {
    allowed_sources: HashSet<String>,
}

impl PolicyGate {
    /// Create a gate that admits exactly the given sources.
    pub fn new<I, S>(allowed_sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_sources: allowed_sources.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a gate from the `[policy]` config section.
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.allowed_sources.iter().cloned())
    }

    /// Reject events from sources outside the allow-list.
    pub fn validate_source(&self, source: &str) -> Result<(), PermissionDenied> {
        if self.allowed_sources.contains(source) {
            Ok(())
        } else {
            Err(PermissionDenied::UnsupportedSource(source.to_string()))
        }
    }

    /// Check that `trust_tier` is high enough for `capability`.
    pub fn enforce_capability(
        &self,
        trust_tier: u8,
        capability: &CapabilityToken,
    ) -> Result<(), PermissionDenied> {
        if trust_tier >= capability.trust_tier_required {
            Ok(())
        } else {
            Err(PermissionDenied::InsufficientTier {
                capability: capability.name.clone(),
                required: capability.trust_tier_required,
                actual: trust_tier,
            })
        }
    }
}

impl Default for PolicyGate {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}
