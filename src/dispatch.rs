//! Dispatch coordination: invoke the selected agent, fall back on failure
//!
//! The coordinator is the engine's only suspension point. Each attempt runs
//! the external [`AgentInvoker`] capability under an urgency-derived timeout;
//! expiry cancels the in-flight invocation. Every attempt, winner or loser,
//! emits exactly one [`OutcomeEvent`] to the outcome sink so failing agents
//! are penalized even when a fallback eventually succeeds. Whether one agent
//! id is backed by one worker or a pool is the invoker's concern; the
//! coordinator stays agnostic.

use crate::config::RouterConfig;
use crate::error::{AttemptFailure, FailureKind, RouterError, RouterResult};
use crate::handoff::HandoffPackage;
use crate::profile::TaskProfile;
use crate::selection::{SelectionResult, Strategy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome classification for a dispatched task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowSignal {
    /// Success
    #[serde(rename = "FLOW")]
    Flow,
    /// Failure
    #[serde(rename = "ANTIFLOW")]
    AntiFlow,
    /// Partial success
    #[serde(rename = "PARTIAL_FLOW")]
    PartialFlow,
}

impl FlowSignal {
    /// Binary success indicator used by the failure-rate EWMA:
    /// FLOW=1, PARTIAL_FLOW=0.5, ANTIFLOW=0
    pub fn flow_indicator(&self) -> f64 {
        match self {
            FlowSignal::Flow => 1.0,
            FlowSignal::PartialFlow => 0.5,
            FlowSignal::AntiFlow => 0.0,
        }
    }
}

/// One observed invocation outcome, consumed exactly once by the learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub agent_id: String,
    pub task_id: Uuid,
    /// Snapshot of the profile the task was routed with
    pub profile: TaskProfile,
    /// Strategy that selected (or would have selected) this agent
    pub strategy: Strategy,
    pub classification: FlowSignal,
    /// Observed latency; for cancelled attempts, the configured timeout
    pub latency_ms: u64,
    pub cost_units: f64,
    /// Externally supplied accuracy score, 0..=100
    pub accuracy_score: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl OutcomeEvent {
    /// Build an event for a freshly observed outcome
    #[allow(clippy::too_many_arguments)]
    pub fn observed(
        agent_id: &str,
        profile: &TaskProfile,
        strategy: Strategy,
        classification: FlowSignal,
        latency_ms: u64,
        cost_units: f64,
        accuracy_score: Option<f64>,
    ) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            task_id: Uuid::new_v4(),
            profile: profile.clone(),
            strategy,
            classification,
            latency_ms,
            cost_units,
            accuracy_score,
            recorded_at: Utc::now(),
        }
    }
}

/// Request handed to the external invoker for one attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub task_id: Uuid,
    pub profile: TaskProfile,
    pub instruction: String,
    /// Present on the second leg of a chained task; carried verbatim
    pub handoff: Option<HandoffPackage>,
    /// Agent-facing rendering of the handoff context, surfaced by the
    /// formatter whenever a handoff package is attached
    pub context_addendum: Option<String>,
}

impl InvocationRequest {
    /// Build a first-leg request with no handoff context
    pub fn new(profile: &TaskProfile, instruction: &str) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            profile: profile.clone(),
            instruction: instruction.to_string(),
            handoff: None,
            context_addendum: None,
        }
    }

    /// Attach a handoff package, surfacing its rendered addendum
    pub fn with_handoff(mut self, handoff: HandoffPackage) -> Self {
        self.context_addendum = Some(handoff.context_addendum());
        self.handoff = Some(handoff);
        self
    }
}

/// What the external executor produced for one attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutput {
    pub payload: Value,
    /// True when the executor only partially completed the work
    #[serde(default)]
    pub partial: bool,
    /// Externally supplied accuracy score, 0..=100
    pub accuracy_score: Option<f64>,
    /// Observed cost; the selection estimate is used when absent
    pub cost_units: Option<f64>,
}

impl InvocationOutput {
    pub fn of(payload: Value) -> Self {
        Self {
            payload,
            ..Default::default()
        }
    }

    fn classification(&self) -> FlowSignal {
        if self.partial {
            FlowSignal::PartialFlow
        } else {
            FlowSignal::Flow
        }
    }
}

/// Invocation failure reported by the external capability
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct InvokeError {
    pub message: String,
}

impl InvokeError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External capability that executes a task on one agent
///
/// One call per agent attempt. Implementations may pool many workers behind
/// a single agent id; routing never special-cases that.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(
        &self,
        agent_id: &str,
        request: &InvocationRequest,
    ) -> Result<InvocationOutput, InvokeError>;
}

/// Consumes attempt outcomes as they happen
///
/// Implemented by the feedback learner; tests substitute recording sinks.
pub trait OutcomeSink: Send + Sync {
    fn record(&self, event: &OutcomeEvent);
}

/// Invokes selected agents under timeout, retrying through the fallback chain
pub struct DispatchCoordinator {
    config: RouterConfig,
    sink: Arc<dyn OutcomeSink>,
}

impl DispatchCoordinator {
    pub fn new(config: &RouterConfig, sink: Arc<dyn OutcomeSink>) -> Self {
        Self {
            config: config.clone(),
            sink,
        }
    }

    /// Execute a routed task, walking the fallback chain on failure
    ///
    /// Attempts are capped at `min(max_attempts, fallbacks + 1)`. Returns the
    /// first successful attempt's event; when every attempted agent fails,
    /// returns [`RouterError::DispatchExhausted`] listing each attempted
    /// agent and its failure kind.
    pub async fn dispatch(
        &self,
        profile: &TaskProfile,
        selection: &SelectionResult,
        request: &InvocationRequest,
        invoker: &dyn AgentInvoker,
    ) -> RouterResult<OutcomeEvent> {
        let budget = self
            .config
            .selection
            .max_attempts
            .min(selection.fallbacks.len() + 1);
        let timeout = self.config.timeouts.for_urgency(profile.urgency);
        let mut failures: Vec<AttemptFailure> = Vec::new();

        for agent_id in selection.attempt_order().take(budget) {
            debug!(
                agent_id,
                attempt = failures.len() + 1,
                budget,
                timeout_ms = timeout.as_millis() as u64,
                "Dispatching attempt"
            );
            let started = std::time::Instant::now();

            match tokio::time::timeout(timeout, invoker.invoke(agent_id, request)).await {
                Ok(Ok(output)) => {
                    let event = OutcomeEvent {
                        agent_id: agent_id.to_string(),
                        task_id: request.task_id,
                        profile: profile.clone(),
                        strategy: selection.strategy,
                        classification: output.classification(),
                        latency_ms: started.elapsed().as_millis() as u64,
                        cost_units: output.cost_units.unwrap_or(selection.estimated_cost),
                        accuracy_score: output.accuracy_score,
                        recorded_at: Utc::now(),
                    };
                    self.sink.record(&event);
                    info!(
                        agent_id,
                        classification = ?event.classification,
                        latency_ms = event.latency_ms,
                        "Dispatch succeeded"
                    );
                    return Ok(event);
                }
                Ok(Err(error)) => {
                    warn!(agent_id, %error, "Invocation failed, trying fallback");
                    self.record_failure(agent_id, profile, selection, request, started);
                    failures.push(AttemptFailure {
                        agent_id: agent_id.to_string(),
                        kind: FailureKind::Invocation(error.message),
                    });
                }
                Err(_) => {
                    warn!(
                        agent_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "Invocation timed out, trying fallback"
                    );
                    // Cancelled attempt: observed latency is the full timeout.
                    let event = OutcomeEvent {
                        agent_id: agent_id.to_string(),
                        task_id: request.task_id,
                        profile: profile.clone(),
                        strategy: selection.strategy,
                        classification: FlowSignal::AntiFlow,
                        latency_ms: timeout.as_millis() as u64,
                        cost_units: 0.0,
                        accuracy_score: None,
                        recorded_at: Utc::now(),
                    };
                    self.sink.record(&event);
                    failures.push(AttemptFailure {
                        agent_id: agent_id.to_string(),
                        kind: FailureKind::Timeout,
                    });
                }
            }
        }

        Err(RouterError::DispatchExhausted { attempts: failures })
    }

    fn record_failure(
        &self,
        agent_id: &str,
        profile: &TaskProfile,
        selection: &SelectionResult,
        request: &InvocationRequest,
        started: std::time::Instant,
    ) {
        let event = OutcomeEvent {
            agent_id: agent_id.to_string(),
            task_id: request.task_id,
            profile: profile.clone(),
            strategy: selection.strategy,
            classification: FlowSignal::AntiFlow,
            latency_ms: started.elapsed().as_millis() as u64,
            cost_units: 0.0,
            accuracy_score: None,
            recorded_at: Utc::now(),
        };
        self.sink.record(&event);
    }
}
