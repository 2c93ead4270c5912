//! Handoff protocol: structured context for chained execution
//!
//! When one agent's output becomes another agent's input, the first leg's
//! context travels as a [`HandoffPackage`]: pure data, no side effects.
//! Routing treats the second leg as a fresh selection with the same task
//! profile; the dispatcher surfaces the package's rendered addendum to the
//! receiving agent verbatim.

use crate::dispatch::FlowSignal;
use serde::{Deserialize, Serialize};

/// Context package passed from one executor to the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffPackage {
    pub source_agent_id: String,
    pub target_agent_id: String,
    /// What the source agent accomplished, in prose
    pub context_summary: String,
    /// Explicit decisions made so far
    pub decisions: Vec<String>,
    /// FLOW/ANTIFLOW history for the task so far
    pub flow_history: Vec<FlowSignal>,
    /// Suggested next decision point for the receiving agent
    pub suggested_next: Option<String>,
}

impl HandoffPackage {
    /// Builder method to set the suggested next decision point
    pub fn with_suggested_next<S: Into<String>>(mut self, suggestion: S) -> Self {
        self.suggested_next = Some(suggestion.into());
        self
    }

    /// Agent-facing rendering of the package
    ///
    /// The dispatcher includes this addendum in the receiving agent's
    /// invocation whenever a handoff is attached.
    pub fn context_addendum(&self) -> String {
        let mut lines = vec![
            format!(
                "Continuing work handed off from agent '{}'.",
                self.source_agent_id
            ),
            format!("Context: {}", self.context_summary),
        ];
        if !self.decisions.is_empty() {
            lines.push("Decisions so far:".to_string());
            for decision in &self.decisions {
                lines.push(format!("- {decision}"));
            }
        }
        if !self.flow_history.is_empty() {
            let history: Vec<String> = self
                .flow_history
                .iter()
                .map(|signal| format!("{signal:?}"))
                .collect();
            lines.push(format!("Outcome history: {}", history.join(" -> ")));
        }
        if let Some(suggestion) = &self.suggested_next {
            lines.push(format!("Suggested next step: {suggestion}"));
        }
        lines.join("\n")
    }
}

/// Constructs handoff packages for chained execution
pub struct HandoffProtocol;

impl HandoffProtocol {
    /// Package the first leg's context for the receiving agent
    pub fn package(
        source_agent_id: &str,
        target_agent_id: &str,
        context_summary: &str,
        decisions: Vec<String>,
        flow_history: Vec<FlowSignal>,
    ) -> HandoffPackage {
        HandoffPackage {
            source_agent_id: source_agent_id.to_string(),
            target_agent_id: target_agent_id.to_string(),
            context_summary: context_summary.to_string(),
            decisions,
            flow_history,
            suggested_next: None,
        }
    }
}
