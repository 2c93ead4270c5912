//! Agent registry: static capability declarations plus rolling metrics
//!
//! The registry is the engine's only shared mutable state. Each agent entry
//! pairs an immutable [`AgentDescriptor`] with an [`Arc`]-held
//! [`PerformanceMetrics`] value. Readers clone Arcs and therefore always see
//! a consistent snapshot; the sole mutator swaps the metrics Arc whole rather
//! than mutating fields in place, so a half-updated record is never visible.

use crate::dispatch::{FlowSignal, OutcomeEvent};
use crate::error::{RouterError, RouterResult};
use crate::profile::MainRequirement;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Nominal cost of one unit of work, split into input/output components
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostPerUnit {
    pub input: f64,
    pub output: f64,
}

impl CostPerUnit {
    pub fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    /// Combined cost used by ceilings and cost-efficiency scoring
    pub fn total(&self) -> f64 {
        self.input + self.output
    }
}

/// Static capability declaration for one executor
///
/// Created at registry load time, immutable during normal operation; changed
/// only through an explicit administrative `replace_all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Agent identifier
    pub id: String,
    /// Specialty domains, matched case-insensitively against task domains
    #[serde(default)]
    pub specialties: Vec<String>,
    /// Nominal cost per unit of work
    #[serde(default)]
    pub cost: CostPerUnit,
    /// Requirements this agent is tuned for; must be non-empty
    pub strengths: Vec<MainRequirement>,
}

impl AgentDescriptor {
    /// Create a descriptor with minimal fields
    pub fn new<S: Into<String>>(id: S, strengths: Vec<MainRequirement>) -> Self {
        Self {
            id: id.into(),
            specialties: Vec::new(),
            cost: CostPerUnit::default(),
            strengths,
        }
    }

    /// Builder method to set specialty domains
    pub fn with_specialties(mut self, specialties: Vec<String>) -> Self {
        self.specialties = specialties;
        self
    }

    /// Builder method to set cost per unit
    pub fn with_cost(mut self, input: f64, output: f64) -> Self {
        self.cost = CostPerUnit::new(input, output);
        self
    }

    /// Check whether this agent declares the given domain as a specialty
    pub fn declares_specialty(&self, domain: &str) -> bool {
        let domain_lower = domain.to_lowercase();
        self.specialties
            .iter()
            .any(|s| s.to_lowercase() == domain_lower)
    }

    /// Check whether this agent is tuned for the given requirement
    pub fn has_strength(&self, requirement: MainRequirement) -> bool {
        self.strengths.contains(&requirement)
    }
}

/// Rolling per-agent performance state
///
/// Owned exclusively by [`AgentRegistry`], mutated only through
/// `update_metrics`, read by the selection engine. Never deleted, only
/// decayed by new observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Exponentially-weighted average response latency in milliseconds
    pub avg_latency_ms: f64,
    /// Exponentially-weighted average accuracy score, 0..=100
    pub avg_accuracy: f64,
    /// EWMA of the failure indicator (ANTIFLOW=1, PARTIAL_FLOW=0.5, FLOW=0)
    pub failure_rate: f64,
    /// Successful completions per task domain
    pub domain_successes: HashMap<String, u64>,
    /// Number of outcomes absorbed so far
    pub samples: u64,
}

impl Default for PerformanceMetrics {
    /// Cold-start priors: keep a never-observed agent routable without
    /// letting it dominate either extreme of any strategy's ranking.
    fn default() -> Self {
        Self {
            avg_latency_ms: 1_000.0,
            avg_accuracy: 75.0,
            failure_rate: 0.0,
            domain_successes: HashMap::new(),
            samples: 0,
        }
    }
}

impl PerformanceMetrics {
    /// Fold one observed outcome into the rolling state, returning the new
    /// record (the old one is left untouched so readers keep their snapshot)
    ///
    /// Each average moves by `alpha * (observed - old)`; accuracy only moves
    /// when the event carries a score.
    pub fn absorb(&self, event: &OutcomeEvent, alpha: f64) -> PerformanceMetrics {
        let mut next = self.clone();

        next.avg_latency_ms = ewma(self.avg_latency_ms, event.latency_ms as f64, alpha);

        if let Some(score) = event.accuracy_score {
            next.avg_accuracy = ewma(self.avg_accuracy, score.clamp(0.0, 100.0), alpha);
        }

        let failure_observed = 1.0 - event.classification.flow_indicator();
        next.failure_rate = ewma(self.failure_rate, failure_observed, alpha);

        if event.classification == FlowSignal::Flow {
            *next
                .domain_successes
                .entry(event.profile.domain.clone())
                .or_insert(0) += 1;
        }

        next.samples = self.samples.saturating_add(1);
        next
    }

    /// Successful completions recorded for a domain
    pub fn successes_in(&self, domain: &str) -> u64 {
        self.domain_successes.get(domain).copied().unwrap_or(0)
    }
}

fn ewma(old: f64, observed: f64, alpha: f64) -> f64 {
    alpha * observed + (1.0 - alpha) * old
}

#[derive(Debug, Clone)]
struct AgentEntry {
    descriptor: Arc<AgentDescriptor>,
    metrics: Arc<PerformanceMetrics>,
}

/// Thread-safe registry of known agents
///
/// Membership is configuration, loaded once at startup (or replaced
/// atomically by an administrative update); metrics are the only
/// runtime-mutable state.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: Arc<RwLock<HashMap<String, AgentEntry>>>,
}

impl AgentRegistry {
    /// Build a registry from a static roster, failing fast on malformed
    /// configuration
    pub fn load(descriptors: Vec<AgentDescriptor>) -> RouterResult<Self> {
        let registry = Self::default();
        registry.replace_all(descriptors)?;
        Ok(registry)
    }

    /// Atomically replace the agent roster
    ///
    /// Metrics of agent ids that survive the replacement are carried over;
    /// no partial roster is ever visible mid-update.
    pub fn replace_all(&self, descriptors: Vec<AgentDescriptor>) -> RouterResult<()> {
        validate_roster(&descriptors)?;

        let mut agents = self.agents.write().unwrap();
        let mut next: HashMap<String, AgentEntry> = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let metrics = agents
                .get(&descriptor.id)
                .map(|entry| Arc::clone(&entry.metrics))
                .unwrap_or_default();
            next.insert(
                descriptor.id.clone(),
                AgentEntry {
                    descriptor: Arc::new(descriptor),
                    metrics,
                },
            );
        }
        info!(agent_count = next.len(), "Agent roster replaced");
        *agents = next;
        Ok(())
    }

    /// Agents eligible for a task domain
    ///
    /// Agents declaring the domain as a specialty; when no agent declares it,
    /// every agent, since a missing specialist must never make a task
    /// unroutable.
    /// Returned sorted by id for deterministic downstream ordering.
    pub fn list_eligible(&self, domain: &str) -> Vec<Arc<AgentDescriptor>> {
        let agents = self.agents.read().unwrap();

        let mut specialists: Vec<Arc<AgentDescriptor>> = agents
            .values()
            .filter(|entry| entry.descriptor.declares_specialty(domain))
            .map(|entry| Arc::clone(&entry.descriptor))
            .collect();

        if specialists.is_empty() {
            debug!(domain, "No specialist declared, falling back to all agents");
            specialists = agents
                .values()
                .map(|entry| Arc::clone(&entry.descriptor))
                .collect();
        }

        specialists.sort_by(|a, b| a.id.cmp(&b.id));
        specialists
    }

    /// Read-only metrics snapshot for one agent
    pub fn metrics_of(&self, agent_id: &str) -> Option<Arc<PerformanceMetrics>> {
        let agents = self.agents.read().unwrap();
        agents.get(agent_id).map(|entry| Arc::clone(&entry.metrics))
    }

    /// Descriptor lookup by id
    pub fn descriptor_of(&self, agent_id: &str) -> Option<Arc<AgentDescriptor>> {
        let agents = self.agents.read().unwrap();
        agents
            .get(agent_id)
            .map(|entry| Arc::clone(&entry.descriptor))
    }

    /// Fold an outcome into one agent's metrics; the registry's sole mutator
    ///
    /// The new record is computed outside the entry and swapped in whole, so
    /// concurrent readers either see the old snapshot or the new one, never a
    /// mix. Returns false when the agent id is unknown.
    pub fn update_metrics(&self, agent_id: &str, event: &OutcomeEvent, alpha: f64) -> bool {
        let mut agents = self.agents.write().unwrap();
        match agents.get_mut(agent_id) {
            Some(entry) => {
                let next = entry.metrics.absorb(event, alpha);
                debug!(
                    agent_id,
                    latency_ms = next.avg_latency_ms,
                    accuracy = next.avg_accuracy,
                    failure_rate = next.failure_rate,
                    "Metrics updated"
                );
                entry.metrics = Arc::new(next);
                true
            }
            None => {
                debug!(agent_id, "Outcome for unknown agent ignored");
                false
            }
        }
    }

    /// Seed an agent's metrics wholesale, e.g. restoring warm-start state
    pub fn seed_metrics(&self, agent_id: &str, metrics: PerformanceMetrics) -> bool {
        let mut agents = self.agents.write().unwrap();
        match agents.get_mut(agent_id) {
            Some(entry) => {
                entry.metrics = Arc::new(metrics);
                true
            }
            None => false,
        }
    }

    /// Number of registered agents
    pub fn agent_count(&self) -> usize {
        self.agents.read().unwrap().len()
    }

    /// All registered agent ids, sorted
    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.read().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn validate_roster(descriptors: &[AgentDescriptor]) -> RouterResult<()> {
    let mut seen = std::collections::HashSet::new();
    for descriptor in descriptors {
        if descriptor.id.trim().is_empty() {
            return Err(RouterError::registry_inconsistency(
                "agent with empty id in roster",
            ));
        }
        if !seen.insert(descriptor.id.as_str()) {
            return Err(RouterError::registry_inconsistency(format!(
                "duplicate agent id '{}'",
                descriptor.id
            )));
        }
        if descriptor.strengths.is_empty() {
            return Err(RouterError::registry_inconsistency(format!(
                "agent '{}' declares no strengths",
                descriptor.id
            )));
        }
        if descriptor.cost.total() < 0.0 {
            return Err(RouterError::registry_inconsistency(format!(
                "agent '{}' has negative cost",
                descriptor.id
            )));
        }
    }
    Ok(())
}
