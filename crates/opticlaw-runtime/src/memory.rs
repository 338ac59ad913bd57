//! In-memory hierarchical memory sink.
//!
//! Episodic records live in a bounded ring (oldest dropped first). Semantic
//! and procedural records are kept until compaction removes low-salience
//! entries.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use opticlaw_core::config::MemoryConfig;
use opticlaw_core::types::{MemoryRecord, MemoryType};

/// Matches for one query, per tier. Episodic matches are newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalSlice {
    pub episodic: Vec<MemoryRecord>,
    pub semantic: Vec<MemoryRecord>,
    pub procedural: Vec<MemoryRecord>,
}

impl RetrievalSlice {
    pub fn is_empty(&self) -> bool {
        self.episodic.is_empty() && self.semantic.is_empty() && self.procedural.is_empty()
    }
}

#[derive(Default)]
struct Tiers {
    episodic: VecDeque<MemoryRecord>,
    semantic: Vec<MemoryRecord>,
    procedural: Vec<MemoryRecord>,
}

pub struct MemoryService {
    tiers: Mutex<Tiers>,
    max_episodic: usize,
}

impl MemoryService {
    /// Create an empty store keeping at most `max_episodic` episodic records.
    pub fn new(max_episodic: usize) -> Self {
        Self {
            tiers: Mutex::new(Tiers::default()),
            max_episodic: max_episodic.max(1),
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(config.max_episodic)
    }

    fn tiers(&self) -> MutexGuard<'_, Tiers> {
        self.tiers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `record` in its tier, evicting the oldest episodic record when full.
    pub fn store(&self, record: MemoryRecord) {
        let mut tiers = self.tiers();
        match record.memory_type {
            MemoryType::Episodic => {
                tiers.episodic.push_back(record);
                while tiers.episodic.len() > self.max_episodic {
                    tiers.episodic.pop_front();
                }
            }
            MemoryType::Semantic => tiers.semantic.push(record),
            MemoryType::Procedural => tiers.procedural.push(record),
        }
    }

    /// Case-insensitive substring search, at most `limit` records per tier.
    pub fn retrieve(&self, query: &str, limit: usize) -> RetrievalSlice {
        let query = query.to_lowercase();
        let matches = |r: &&MemoryRecord| r.content.to_lowercase().contains(&query);
        let tiers = self.tiers();

        RetrievalSlice {
            episodic: tiers.episodic.iter().rev().filter(matches).take(limit).cloned().collect(),
            semantic: tiers.semantic.iter().filter(matches).take(limit).cloned().collect(),
            procedural: tiers.procedural.iter().filter(matches).take(limit).cloned().collect(),
        }
    }

    /// Drop semantic and procedural records below `threshold`.
    /// Returns how many records were removed.
    pub fn compact(&self, threshold: f64) -> usize {
        let mut tiers = self.tiers();
        let before = tiers.semantic.len() + tiers.procedural.len();
        tiers.semantic.retain(|r| r.salience >= threshold);
        tiers.procedural.retain(|r| r.salience >= threshold);
        let removed = before - tiers.semantic.len() - tiers.procedural.len();
        if removed > 0 {
            tracing::debug!(removed, threshold, "Memory compacted");
        }
        removed
    }

    /// Number of records held in one tier.
    pub fn len(&self, memory_type: MemoryType) -> usize {
        let tiers = self.tiers();
        match memory_type {
            MemoryType::Episodic => tiers.episodic.len(),
            MemoryType::Semantic => tiers.semantic.len(),
            MemoryType::Procedural => tiers.procedural.len(),
        }
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}
