//! Event admission: source policy plus bounded duplicate suppression.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use opticlaw_core::error::PermissionDenied;
use opticlaw_core::policy::PolicyGate;
use opticlaw_core::types::EventEnvelope;

/// Bounded set of admitted event ids, evicted oldest-first.
///
/// A duplicate hit does not refresh an id's position, so under any traffic
/// pattern eviction follows insertion order.
#[derive(Debug)]
pub struct DedupeCache {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl DedupeCache {
    /// Capacities below 1 are clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: VecDeque::with_capacity(capacity.min(1024)),
            members: HashSet::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Record `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.members.contains(id) {
            return false;
        }
        self.order.push_back(id.to_string());
        self.members.insert(id.to_string());
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Admits events whose source is allowed and whose id has not been seen.
pub struct EventRouter {
    policy: Arc<PolicyGate>,
    seen: Mutex<DedupeCache>,
}

impl EventRouter {
    /// Create a router remembering the last `dedupe_cache_size` event ids.
    pub fn new(policy: Arc<PolicyGate>, dedupe_cache_size: usize) -> Self {
        Self {
            policy,
            seen: Mutex::new(DedupeCache::new(dedupe_cache_size)),
        }
    }

    /// `Ok(true)` if admitted, `Ok(false)` for a duplicate.
    ///
    /// A disallowed source is an error and leaves the cache untouched.
    pub fn accept(&self, event: &EventEnvelope) -> Result<bool, PermissionDenied> {
        if let Err(denied) = self.policy.validate_source(&event.source) {
            tracing::warn!(
                event_id = %event.event_id,
                source = %event.source,
                "Event rejected by policy"
            );
            return Err(denied);
        }

        let admitted = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(&event.event_id);

        if admitted {
            tracing::debug!(event_id = %event.event_id, source = %event.source, "Event admitted");
        } else {
            tracing::debug!(event_id = %event.event_id, "Duplicate event dropped");
        }
        Ok(admitted)
    }

    /// Number of ids currently remembered.
    pub fn seen_len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
