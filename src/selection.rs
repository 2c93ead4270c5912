//! Selection strategies and ranked agent scoring
//!
//! Given a normalized profile and a registry snapshot, the engine scores
//! every eligible agent under one of four named strategies and returns the
//! winner plus a fallback chain. Strategy choice is explicit, driven by
//! `main_requirement` with high urgency forcing the speed strategy, never
//! by hidden global state. All inputs arrive as arguments, so `select` is a
//! pure function of profile + snapshot + configuration and is deterministic
//! for fixed inputs.

use crate::config::{CostCeilingSection, RouterConfig};
use crate::error::{RouterError, RouterResult};
use crate::profile::{MainRequirement, TaskProfile, Urgency};
use crate::registry::{AgentDescriptor, AgentRegistry, PerformanceMetrics};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

/// Guards score denominators against division by zero
const EPSILON: f64 = 1e-6;

/// Points subtracted per unit of failure rate under accuracy priority
const FAILURE_PENALTY: f64 = 50.0;

/// Score multiplier for agents that declare the task's domain as a specialty
const SPECIALIST_AFFINITY: f64 = 2.0;

/// Named scoring strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Rank by inverse complexity-adjusted estimated latency
    SpeedPriority,
    /// Rank by rolling accuracy, penalized by failure rate
    AccuracyPriority,
    /// Rank by accuracy per cost unit; over-ceiling agents are excluded
    CostEfficiency,
    /// Rank by accuracy boosted for declared domain specialists
    DomainExpertise,
}

impl Strategy {
    /// All strategies, for exhaustive iteration (e.g. advisory weights)
    pub const ALL: [Strategy; 4] = [
        Strategy::SpeedPriority,
        Strategy::AccuracyPriority,
        Strategy::CostEfficiency,
        Strategy::DomainExpertise,
    ];
}

/// Output of one routing decision
///
/// Produced fresh per call; the engine keeps no audit trail of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Winning agent
    pub agent_id: String,
    /// Remaining eligible agents ordered by the same score, descending
    pub fallbacks: Vec<String>,
    /// The numeric score that won
    pub score: f64,
    /// Complexity-adjusted latency estimate for the winner, milliseconds
    pub estimated_latency_ms: f64,
    /// Nominal cost estimate for the winner
    pub estimated_cost: f64,
    /// Strategy that produced the ranking
    pub strategy: Strategy,
}

impl SelectionResult {
    /// Winner followed by fallbacks, in attempt order
    pub fn attempt_order(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.agent_id.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }
}

struct ScoredAgent {
    descriptor: Arc<AgentDescriptor>,
    metrics: Arc<PerformanceMetrics>,
    score: f64,
}

/// Scores eligible agents and picks a winner with a fallback chain
#[derive(Debug, Clone)]
pub struct SelectionStrategyEngine {
    tie_break_margin: f64,
    cost_ceilings: CostCeilingSection,
}

impl SelectionStrategyEngine {
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            tie_break_margin: config.selection.tie_break_margin,
            cost_ceilings: config.cost_ceilings.clone(),
        }
    }

    /// Strategy implied by a profile
    ///
    /// High urgency forces speed priority regardless of the declared main
    /// requirement. Creativity routes to domain expertise (creative work
    /// goes to declared specialists); ethics tasks rank by accuracy after
    /// the ethical gate has filtered the field.
    pub fn strategy_for(&self, profile: &TaskProfile) -> Strategy {
        if profile.urgency == Urgency::High {
            return Strategy::SpeedPriority;
        }
        match profile.main_requirement {
            MainRequirement::Speed => Strategy::SpeedPriority,
            MainRequirement::Accuracy => Strategy::AccuracyPriority,
            MainRequirement::Cost => Strategy::CostEfficiency,
            MainRequirement::Creativity => Strategy::DomainExpertise,
            MainRequirement::Ethics => Strategy::AccuracyPriority,
        }
    }

    /// Score every eligible agent and return a ranked selection
    pub fn select(
        &self,
        profile: &TaskProfile,
        registry: &AgentRegistry,
    ) -> RouterResult<SelectionResult> {
        self.select_using(self.strategy_for(profile), profile, registry)
    }

    /// Like [`select`](Self::select) with the strategy chosen by the caller,
    /// e.g. the learner's advisory signal for profiles with no explicit
    /// main requirement
    pub fn select_using(
        &self,
        strategy: Strategy,
        profile: &TaskProfile,
        registry: &AgentRegistry,
    ) -> RouterResult<SelectionResult> {
        let eligible = registry.list_eligible(&profile.domain);
        if eligible.is_empty() {
            return Err(RouterError::no_eligible_agent(
                &profile.domain,
                "registry is empty",
            ));
        }

        let gated = self.apply_gates(strategy, profile, eligible)?;

        let mut scored: Vec<ScoredAgent> = gated
            .into_iter()
            .map(|descriptor| {
                let metrics = registry
                    .metrics_of(&descriptor.id)
                    .unwrap_or_else(|| Arc::new(PerformanceMetrics::default()));
                let score = score_agent(strategy, profile, &descriptor, &metrics);
                debug!(
                    agent_id = %descriptor.id,
                    ?strategy,
                    score,
                    failure_rate = metrics.failure_rate,
                    "Scored candidate"
                );
                ScoredAgent {
                    descriptor,
                    metrics,
                    score,
                }
            })
            .collect();

        scored.sort_by(strict_order);

        let winner_index = self.winner_index(&scored);
        let winner = scored.remove(winner_index);
        let estimated_latency_ms =
            winner.metrics.avg_latency_ms * profile.complexity.latency_multiplier();
        let result = SelectionResult {
            agent_id: winner.descriptor.id.clone(),
            fallbacks: scored.iter().map(|s| s.descriptor.id.clone()).collect(),
            score: winner.score,
            estimated_latency_ms,
            estimated_cost: winner.descriptor.cost.total(),
            strategy,
        };

        info!(
            agent_id = %result.agent_id,
            ?strategy,
            score = result.score,
            fallback_count = result.fallbacks.len(),
            domain = %profile.domain,
            "Agent selected"
        );
        Ok(result)
    }

    /// Hard eligibility filters applied before any scoring
    ///
    /// Ethical gate: review-required tasks only go to agents declaring the
    /// ethics strength. Cost gate (cost-efficiency only): agents above the
    /// sensitivity-derived ceiling are excluded outright, so they can never
    /// appear in the fallback chain either.
    fn apply_gates(
        &self,
        strategy: Strategy,
        profile: &TaskProfile,
        eligible: Vec<Arc<AgentDescriptor>>,
    ) -> RouterResult<Vec<Arc<AgentDescriptor>>> {
        let mut candidates = eligible;

        if profile.ethical_review_required {
            candidates.retain(|d| d.has_strength(MainRequirement::Ethics));
            if candidates.is_empty() {
                return Err(RouterError::no_eligible_agent(
                    &profile.domain,
                    "ethical review required but no agent declares the ethics strength",
                ));
            }
        }

        if strategy == Strategy::CostEfficiency {
            if let Some(ceiling) = self.cost_ceilings.for_sensitivity(profile.cost_sensitivity) {
                candidates.retain(|d| d.cost.total() <= ceiling);
                if candidates.is_empty() {
                    return Err(RouterError::no_eligible_agent(
                        &profile.domain,
                        format!("all eligible agents exceed the cost ceiling of {ceiling}"),
                    ));
                }
            }
        }

        Ok(candidates)
    }

    /// Winner among the already strictly-sorted candidates
    ///
    /// Agents within the tie-break margin of the top score count as tied;
    /// among them the lowest failure rate wins, then the lexicographically
    /// smaller id. The margin check is a separate pass over the sorted list,
    /// never part of the sort comparator: a margin-based predicate is not
    /// transitive, and `sort_by` requires a total order.
    fn winner_index(&self, scored: &[ScoredAgent]) -> usize {
        let top = scored[0].score;
        scored
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                let reference = top.abs().max(s.score.abs());
                (top - s.score).abs() <= self.tie_break_margin * reference
            })
            .min_by(|(_, a), (_, b)| {
                a.metrics
                    .failure_rate
                    .partial_cmp(&b.metrics.failure_rate)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.descriptor.id.cmp(&b.descriptor.id))
            })
            .map(|(index, _)| index)
            .unwrap_or(0)
    }
}

/// Strict total order for candidate ranking: score descending, then id
fn strict_order(a: &ScoredAgent, b: &ScoredAgent) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.descriptor.id.cmp(&b.descriptor.id))
}

fn score_agent(
    strategy: Strategy,
    profile: &TaskProfile,
    descriptor: &AgentDescriptor,
    metrics: &PerformanceMetrics,
) -> f64 {
    match strategy {
        Strategy::SpeedPriority => {
            let estimated =
                (metrics.avg_latency_ms * profile.complexity.latency_multiplier()).max(EPSILON);
            1.0 / estimated
        }
        Strategy::AccuracyPriority => metrics.avg_accuracy - metrics.failure_rate * FAILURE_PENALTY,
        Strategy::CostEfficiency => metrics.avg_accuracy / (descriptor.cost.total() + EPSILON),
        Strategy::DomainExpertise => {
            let affinity = if descriptor.declares_specialty(&profile.domain) {
                SPECIALIST_AFFINITY
            } else {
                1.0
            };
            metrics.avg_accuracy * affinity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Complexity, CostSensitivity};

    fn engine() -> SelectionStrategyEngine {
        SelectionStrategyEngine::new(&RouterConfig::default())
    }

    fn seeded_registry(agents: Vec<(AgentDescriptor, PerformanceMetrics)>) -> AgentRegistry {
        let descriptors = agents.iter().map(|(d, _)| d.clone()).collect();
        let registry = AgentRegistry::load(descriptors).unwrap();
        for (descriptor, metrics) in agents {
            registry.seed_metrics(&descriptor.id, metrics);
        }
        registry
    }

    fn metrics(latency_ms: f64, accuracy: f64, failure_rate: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            avg_latency_ms: latency_ms,
            avg_accuracy: accuracy,
            failure_rate,
            samples: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_high_urgency_forces_speed_strategy() {
        let profile = TaskProfile {
            urgency: Urgency::High,
            main_requirement: MainRequirement::Cost,
            ..Default::default()
        };
        assert_eq!(engine().strategy_for(&profile), Strategy::SpeedPriority);
    }

    #[test]
    fn test_strategy_mapping_is_exhaustive() {
        let engine = engine();
        let cases = [
            (MainRequirement::Speed, Strategy::SpeedPriority),
            (MainRequirement::Accuracy, Strategy::AccuracyPriority),
            (MainRequirement::Cost, Strategy::CostEfficiency),
            (MainRequirement::Creativity, Strategy::DomainExpertise),
            (MainRequirement::Ethics, Strategy::AccuracyPriority),
        ];
        for (requirement, expected) in cases {
            let profile = TaskProfile {
                main_requirement: requirement,
                ..Default::default()
            };
            assert_eq!(engine.strategy_for(&profile), expected);
        }
    }

    #[test]
    fn test_speed_priority_prefers_lower_latency_over_specialty() {
        let registry = seeded_registry(vec![
            (
                AgentDescriptor::new("slow-specialist", vec![MainRequirement::Accuracy])
                    .with_specialties(vec!["legal".to_string()]),
                metrics(2_000.0, 80.0, 0.0),
            ),
            (
                AgentDescriptor::new("fast-generalist", vec![MainRequirement::Speed]),
                metrics(200.0, 80.0, 0.0),
            ),
        ]);
        let profile = TaskProfile {
            main_requirement: MainRequirement::Speed,
            ..Default::default()
        };

        let result = engine().select(&profile, &registry).unwrap();

        assert_eq!(result.agent_id, "fast-generalist");
        assert_eq!(result.fallbacks, vec!["slow-specialist"]);
        assert_eq!(result.strategy, Strategy::SpeedPriority);
    }

    #[test]
    fn test_estimated_latency_scales_with_complexity() {
        let registry = seeded_registry(vec![(
            AgentDescriptor::new("only", vec![MainRequirement::Speed]),
            metrics(1_000.0, 80.0, 0.0),
        )]);
        let profile = TaskProfile {
            main_requirement: MainRequirement::Speed,
            complexity: Complexity::Complex,
            ..Default::default()
        };

        let result = engine().select(&profile, &registry).unwrap();
        assert!((result.estimated_latency_ms - 1_800.0).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_priority_penalizes_failure_rate() {
        let registry = seeded_registry(vec![
            (
                AgentDescriptor::new("accurate-but-flaky", vec![MainRequirement::Accuracy]),
                metrics(500.0, 95.0, 0.4), // 95 - 20 = 75
            ),
            (
                AgentDescriptor::new("steady", vec![MainRequirement::Accuracy]),
                metrics(500.0, 85.0, 0.0), // 85
            ),
        ]);
        let profile = TaskProfile::default();

        let result = engine().select(&profile, &registry).unwrap();
        assert_eq!(result.agent_id, "steady");
    }

    #[test]
    fn test_cost_efficiency_excludes_over_ceiling_agents_entirely() {
        let registry = seeded_registry(vec![
            (
                AgentDescriptor::new("premium", vec![MainRequirement::Accuracy])
                    .with_cost(20.0, 30.0), // 50 > high ceiling of 10
                metrics(500.0, 99.0, 0.0),
            ),
            (
                AgentDescriptor::new("budget", vec![MainRequirement::Cost]).with_cost(1.0, 2.0),
                metrics(500.0, 70.0, 0.0),
            ),
        ]);
        let profile = TaskProfile {
            main_requirement: MainRequirement::Cost,
            cost_sensitivity: CostSensitivity::High,
            ..Default::default()
        };

        let result = engine().select(&profile, &registry).unwrap();

        assert_eq!(result.agent_id, "budget");
        // Excluded before scoring: never in the fallback chain either.
        assert!(result.fallbacks.is_empty());
    }

    #[test]
    fn test_cost_efficiency_with_no_affordable_agent() {
        let registry = seeded_registry(vec![(
            AgentDescriptor::new("premium", vec![MainRequirement::Accuracy]).with_cost(20.0, 30.0),
            metrics(500.0, 99.0, 0.0),
        )]);
        let profile = TaskProfile {
            main_requirement: MainRequirement::Cost,
            cost_sensitivity: CostSensitivity::High,
            ..Default::default()
        };

        assert!(matches!(
            engine().select(&profile, &registry),
            Err(RouterError::NoEligibleAgent { .. })
        ));
    }

    #[test]
    fn test_domain_expertise_doubles_specialist_score() {
        let registry = seeded_registry(vec![
            (
                AgentDescriptor::new("generalist", vec![MainRequirement::Creativity]),
                metrics(500.0, 90.0, 0.0), // 90
            ),
            (
                AgentDescriptor::new("specialist", vec![MainRequirement::Creativity])
                    .with_specialties(vec!["fiction".to_string(), "poetry".to_string()]),
                metrics(500.0, 60.0, 0.0), // 120 in-domain
            ),
        ]);
        let profile = TaskProfile {
            main_requirement: MainRequirement::Creativity,
            domain: "poetry".to_string(),
            ..Default::default()
        };

        let result = engine().select(&profile, &registry).unwrap();
        assert_eq!(result.agent_id, "specialist");
        assert_eq!(result.score, 120.0);
    }

    #[test]
    fn test_ethical_gate_restricts_then_fails() {
        let ethical = AgentDescriptor::new(
            "reviewer",
            vec![MainRequirement::Ethics, MainRequirement::Accuracy],
        );
        let plain = AgentDescriptor::new("worker", vec![MainRequirement::Accuracy]);

        let registry = seeded_registry(vec![
            (ethical, metrics(500.0, 88.0, 0.0)),
            (plain.clone(), metrics(100.0, 99.0, 0.0)),
        ]);
        let profile = TaskProfile {
            ethical_review_required: true,
            main_requirement: MainRequirement::Ethics,
            ..Default::default()
        };

        let result = engine().select(&profile, &registry).unwrap();
        assert_eq!(result.agent_id, "reviewer");
        assert!(result.fallbacks.is_empty());

        // Remove the only ethics-capable agent: selection must fail.
        let bare = seeded_registry(vec![(plain, metrics(100.0, 99.0, 0.0))]);
        assert!(matches!(
            engine().select(&profile, &bare),
            Err(RouterError::NoEligibleAgent { .. })
        ));
    }

    #[test]
    fn test_near_tie_prefers_lower_failure_rate_then_id() {
        // Scores within 1%: 90.0 vs 89.5.
        let registry = seeded_registry(vec![
            (
                AgentDescriptor::new("b-agent", vec![MainRequirement::Accuracy]),
                metrics(500.0, 90.0, 0.2),
            ),
            (
                AgentDescriptor::new("a-agent", vec![MainRequirement::Accuracy]),
                metrics(500.0, 99.5, 0.2), // 99.5 - 10 = 89.5
            ),
        ]);
        let profile = TaskProfile::default();

        // Equal failure rates: lexicographically smaller id wins the tie.
        let result = engine().select(&profile, &registry).unwrap();
        assert_eq!(result.agent_id, "a-agent");

        // Lower failure rate beats id order inside the margin.
        let registry = seeded_registry(vec![
            (
                AgentDescriptor::new("a-agent", vec![MainRequirement::Accuracy]),
                metrics(500.0, 99.5, 0.2),
            ),
            (
                AgentDescriptor::new("z-agent", vec![MainRequirement::Accuracy]),
                metrics(500.0, 90.0, 0.0),
            ),
        ]);
        let result = engine().select(&profile, &registry).unwrap();
        assert_eq!(result.agent_id, "z-agent");
    }

    #[test]
    fn test_margin_window_measured_from_top_score_only() {
        // Pairwise margin checks would be cyclic here: b ties a, c ties b,
        // but c does not tie a. The tie window is anchored at the top score,
        // so c ranks strictly below and b wins on failure rate.
        let registry = seeded_registry(vec![
            (
                AgentDescriptor::new("cycle-a", vec![MainRequirement::Creativity]),
                metrics(500.0, 100.0, 0.9),
            ),
            (
                AgentDescriptor::new("cycle-b", vec![MainRequirement::Creativity]),
                metrics(500.0, 99.2, 0.5),
            ),
            (
                AgentDescriptor::new("cycle-c", vec![MainRequirement::Creativity]),
                metrics(500.0, 98.5, 0.1),
            ),
        ]);
        let profile = TaskProfile {
            main_requirement: MainRequirement::Creativity,
            ..Default::default()
        };

        let result = engine().select(&profile, &registry).unwrap();

        assert_eq!(result.agent_id, "cycle-b");
        assert_eq!(result.fallbacks, vec!["cycle-a", "cycle-c"]);
    }

    #[test]
    fn test_long_near_tie_chain_ranks_fully() {
        // Every adjacent pair is within the margin but the ends are not, with
        // failure rates deliberately running against score order.
        let agents: Vec<(AgentDescriptor, PerformanceMetrics)> = (0..40)
            .map(|i| {
                let failure_rate = if i % 2 == 0 { 0.5 } else { 0.0 };
                (
                    AgentDescriptor::new(
                        format!("agent-{i:02}"),
                        vec![MainRequirement::Creativity],
                    ),
                    metrics(500.0, 90.0 - 0.05 * i as f64, failure_rate),
                )
            })
            .collect();
        let registry = seeded_registry(agents);
        let profile = TaskProfile {
            main_requirement: MainRequirement::Creativity,
            ..Default::default()
        };

        let result = engine().select(&profile, &registry).unwrap();

        // Lowest failure rate inside the top window, smallest id among those.
        assert_eq!(result.agent_id, "agent-01");
        assert_eq!(result.fallbacks.len(), 39);
        assert!(result.fallbacks.contains(&"agent-00".to_string()));
        assert!(result.fallbacks.contains(&"agent-39".to_string()));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let registry = seeded_registry(vec![
            (
                AgentDescriptor::new("one", vec![MainRequirement::Accuracy]),
                metrics(400.0, 82.0, 0.1),
            ),
            (
                AgentDescriptor::new("two", vec![MainRequirement::Accuracy]),
                metrics(600.0, 91.0, 0.3),
            ),
            (
                AgentDescriptor::new("three", vec![MainRequirement::Accuracy]),
                metrics(800.0, 77.0, 0.0),
            ),
        ]);
        let profile = TaskProfile::default();
        let engine = engine();

        let first = engine.select(&profile, &registry).unwrap();
        let second = engine.select(&profile, &registry).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_registry_yields_no_eligible_agent() {
        let registry = AgentRegistry::load(vec![]).unwrap();
        let result = engine().select(&TaskProfile::default(), &registry);
        assert!(matches!(result, Err(RouterError::NoEligibleAgent { .. })));
    }

    #[test]
    fn test_attempt_order_walks_winner_then_fallbacks() {
        let result = SelectionResult {
            agent_id: "first".to_string(),
            fallbacks: vec!["second".to_string(), "third".to_string()],
            score: 1.0,
            estimated_latency_ms: 100.0,
            estimated_cost: 1.0,
            strategy: Strategy::SpeedPriority,
        };
        let order: Vec<&str> = result.attempt_order().collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }
}
