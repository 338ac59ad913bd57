//! Cheap fast-reply vs plan-and-execute triage.
//!
//! A fixed rule cascade, first match wins. No external calls, no state.

use opticlaw_core::types::{Decision, EventEnvelope, TriageResult};

/// Normalized texts answered without planning.
const SIMPLE_INTENTS: [&str; 4] = ["help", "status", "ping", "hello"];

/// Prefix marking a slash command.
const COMMAND_PREFIX: char = '/';

/// Substrings suggesting the request needs tools.
const TOOLING_KEYWORDS: [&str; 5] = ["build", "refactor", "email", "calendar", "run"];

/// Messages shorter than this many words are answered directly.
const SHORT_MESSAGE_WORDS: usize = 8;

/// Deterministic triage over an event's text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriageEngine;

impl TriageEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classify an event by its text.
    pub fn classify(&self, event: &EventEnvelope) -> TriageResult {
        self.classify_text(&event.text)
    }

    /// Run the rule cascade over `text`; the first matching rule wins.
    pub fn classify_text(&self, text: &str) -> TriageResult {
        let normalized = text.trim().to_lowercase();

        if SIMPLE_INTENTS.contains(&normalized.as_str()) || normalized.starts_with(COMMAND_PREFIX) {
            return TriageResult {
                decision: Decision::FastReply,
                confidence: 0.98,
                reason: "rule_match",
            };
        }

        if TOOLING_KEYWORDS.iter().any(|kw| normalized.contains(kw)) {
            return TriageResult {
                decision: Decision::PlanAndExecute,
                confidence: 0.86,
                reason: "tooling_likely",
            };
        }

        if normalized.split_whitespace().count() < SHORT_MESSAGE_WORDS {
            return TriageResult {
                decision: Decision::FastReply,
                confidence: 0.8,
                reason: "short_message",
            };
        }

        TriageResult {
            decision: Decision::PlanAndExecute,
            confidence: 0.62,
            reason: "default_complex",
        }
    }
}
