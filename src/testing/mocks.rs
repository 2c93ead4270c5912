//! Mock implementations for testing
//!
//! Provides a scriptable [`MockInvoker`] standing in for external executors
//! and a [`RecordingSink`] capturing the outcome events the coordinator
//! emits, enabling dispatch tests without real agents.

use crate::dispatch::{
    AgentInvoker, InvocationOutput, InvocationRequest, InvokeError, OutcomeEvent, OutcomeSink,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Scripted behavior for one agent id
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return a successful output with the given accuracy score
    Succeed { accuracy_score: Option<f64> },
    /// Return a partial-success output
    Partial,
    /// Return an invocation error
    Fail(String),
    /// Never resolve, forcing the coordinator's timeout to fire
    Hang,
}

/// Mock agent invoker with per-agent scripted behaviors
///
/// Unscripted agents succeed. Every invocation is recorded so tests can
/// assert on attempt order and handoff contents.
#[derive(Debug, Default)]
pub struct MockInvoker {
    behaviors: HashMap<String, MockBehavior>,
    invocations: Arc<Mutex<Vec<(String, InvocationRequest)>>>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to script one agent's behavior
    pub fn with_behavior<S: Into<String>>(mut self, agent_id: S, behavior: MockBehavior) -> Self {
        self.behaviors.insert(agent_id.into(), behavior);
        self
    }

    /// Shorthand: the agent always times out
    pub fn with_hang<S: Into<String>>(self, agent_id: S) -> Self {
        self.with_behavior(agent_id, MockBehavior::Hang)
    }

    /// Shorthand: the agent always fails
    pub fn with_failure<S: Into<String>>(self, agent_id: S, message: &str) -> Self {
        self.with_behavior(agent_id, MockBehavior::Fail(message.to_string()))
    }

    /// Agent ids invoked so far, in order
    pub fn invoked_agents(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Requests received so far, in order
    pub fn invocations(&self) -> Vec<(String, InvocationRequest)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentInvoker for MockInvoker {
    async fn invoke(
        &self,
        agent_id: &str,
        request: &InvocationRequest,
    ) -> Result<InvocationOutput, InvokeError> {
        self.invocations
            .lock()
            .unwrap()
            .push((agent_id.to_string(), request.clone()));

        match self.behaviors.get(agent_id) {
            None | Some(MockBehavior::Succeed { accuracy_score: None }) => {
                Ok(InvocationOutput::of(json!({"agent": agent_id, "ok": true})))
            }
            Some(MockBehavior::Succeed { accuracy_score }) => Ok(InvocationOutput {
                accuracy_score: *accuracy_score,
                ..InvocationOutput::of(json!({"agent": agent_id, "ok": true}))
            }),
            Some(MockBehavior::Partial) => Ok(InvocationOutput {
                partial: true,
                ..InvocationOutput::of(json!({"agent": agent_id, "ok": "partial"}))
            }),
            Some(MockBehavior::Fail(message)) => Err(InvokeError::new(message.clone())),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
        }
    }
}

/// Outcome sink that captures every recorded event
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<OutcomeEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutcomeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl OutcomeSink for RecordingSink {
    fn record(&self, event: &OutcomeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
