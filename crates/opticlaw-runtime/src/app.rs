//! Application runtime: admission, dispatch, triage, planning, execution.
//!
//! Events are admitted by the router at ingest time, queued on the bus and
//! handled one at a time. Cheap requests get a canned reply; everything else
//! is planned into a task graph and executed through the tool orchestrator.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use opticlaw_action::{ConnectorRegistry, ToolOrchestrator};
use opticlaw_core::config::OptiClawConfig;
use opticlaw_core::policy::PolicyGate;
use opticlaw_core::types::{Decision, EventEnvelope, ExecutionContext, MemoryRecord, MemoryType};
use opticlaw_planner::{build_decomposer, ModelRouter, PlannerEngine, TriageEngine};

use crate::bus::EventBus;
use crate::error::{Result, RuntimeError};
use crate::memory::MemoryService;
use crate::router::EventRouter;

const HELP_REPLY: &str = "OptiClaw: say what you need, I can plan and execute tasks efficiently.";
const STATUS_REPLY: &str = "OptiClaw is event-driven, awake on demand, and currently healthy.";

pub struct OptiClawApp {
    config: OptiClawConfig,
    bus: EventBus,
    router: EventRouter,
    triage: TriageEngine,
    planner: PlannerEngine,
    orchestrator: ToolOrchestrator,
    memory: MemoryService,
    responses: Mutex<Vec<String>>,
}

impl OptiClawApp {
    /// Build the app with the default connectors for `config`.
    pub fn new(config: OptiClawConfig) -> Self {
        Self::with_connectors(config, None)
    }

    /// Build the app with a custom connector set instead of the defaults.
    pub fn with_connectors(config: OptiClawConfig, registry: Option<ConnectorRegistry>) -> Self {
        let policy = Arc::new(PolicyGate::from_config(&config.policy));
        let registry = registry.unwrap_or_else(|| {
            let mut registry = ConnectorRegistry::new();
            registry.register_defaults(&config.connectors);
            registry
        });

        let planner = PlannerEngine::new(
            ModelRouter::new(),
            build_decomposer(&config.decomposer),
            config.planner.clone(),
        );
        let orchestrator =
            ToolOrchestrator::new(Arc::clone(&policy), registry, config.policy.tool_trust_tier);

        Self {
            bus: EventBus::new(),
            router: EventRouter::new(policy, config.router.dedupe_cache_size),
            triage: TriageEngine::new(),
            planner,
            orchestrator,
            memory: MemoryService::from_config(&config.memory),
            responses: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Admit `event` and queue it. `Ok(false)` means it was a duplicate.
    pub fn ingest(&self, event: EventEnvelope) -> Result<bool> {
        if self.bus.is_stopped() {
            return Err(RuntimeError::ShuttingDown);
        }
        if !self.router.accept(&event)? {
            return Ok(false);
        }
        self.bus.publish(event);
        Ok(true)
    }

    /// Admit `event` now and queue it after `delay`.
    pub fn schedule_once(&self, delay: Duration, event: EventEnvelope) -> Result<bool> {
        if self.bus.is_stopped() {
            return Err(RuntimeError::ShuttingDown);
        }
        if !self.router.accept(&event)? {
            return Ok(false);
        }
        self.bus.schedule_once(delay, event);
        Ok(true)
    }

    /// Produce the reply for one admitted event.
    pub async fn handle_event(&self, event: &EventEnvelope) -> Result<String> {
        self.memory.store(MemoryRecord::new(
            MemoryType::Episodic,
            format!("in:{}", event.text),
            0.7,
        ));

        let triage = self.triage.classify(event);
        tracing::info!(
            event_id = %event.event_id,
            decision = %triage.decision,
            reason = triage.reason,
            confidence = triage.confidence,
            "Event triaged"
        );

        if triage.decision == Decision::FastReply {
            let reply = fast_reply(&event.text);
            self.memory.store(MemoryRecord::new(
                MemoryType::Episodic,
                format!("out:{}", reply),
                0.5,
            ));
            return Ok(reply);
        }

        let context = ExecutionContext::new(self.config.policy.default_trust_tier)
            .with_budget(self.config.planner.budget_ms, self.config.planner.budget_cost);
        let (graph, model) = self.planner.build_plan(event, context.budget_cost).await;
        let outputs = self.orchestrator.execute(&graph, &context).await?;
        let reply = format!("[{}] {}", model.label(), outputs.join(" | "));

        self.memory.store(MemoryRecord::new(
            MemoryType::Procedural,
            format!("plan:{}", graph.goal),
            0.4,
        ));
        self.memory.store(MemoryRecord::new(
            MemoryType::Episodic,
            format!("out:{}", reply),
            0.6,
        ));
        self.memory.compact(self.config.memory.compact_threshold);

        Ok(reply)
    }

    /// Dispatch queued events for `window`, then stop the bus.
    ///
    /// Replies go to the response log. A failed event is logged and produces
    /// no reply; the loop carries on with the next one. The event in flight
    /// when the window closes is allowed to finish.
    pub async fn run(&self, window: Duration) {
        let dispatch = self.bus.run(move |event: EventEnvelope| async move {
            match self.handle_event(&event).await {
                Ok(reply) => {
                    tracing::debug!(event_id = %event.event_id, "Reply produced");
                    self.responses
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(reply);
                }
                Err(e) => {
                    tracing::warn!(event_id = %event.event_id, error = %e, "Event handling failed");
                }
            }
        });
        let deadline = async {
            tokio::time::sleep(window).await;
            self.bus.stop();
        };
        tokio::join!(dispatch, deadline);
    }

    /// Stop dispatching. Later ingests fail with `ShuttingDown`.
    pub fn stop(&self) {
        self.bus.stop();
    }

    /// Replies produced so far, in dispatch order.
    pub fn responses(&self) -> Vec<String> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the reply log.
    pub fn take_responses(&self) -> Vec<String> {
        std::mem::take(&mut *self.responses.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn memory(&self) -> &MemoryService {
        &self.memory
    }

    pub fn config(&self) -> &OptiClawConfig {
        &self.config
    }

    /// Events admitted but not yet dispatched.
    pub fn pending(&self) -> usize {
        self.bus.len()
    }
}

impl Default for OptiClawApp {
    fn default() -> Self {
        Self::new(OptiClawConfig::default())
    }
}

fn fast_reply(text: &str) -> String {
    match text.trim().to_lowercase().as_str() {
        "help" | "/help" => HELP_REPLY.to_string(),
        "status" | "/status" | "ping" => STATUS_REPLY.to_string(),
        _ => format!("Got it: {}", text),
    }
}
