//! Feedback learning loop
//!
//! Consumes outcome events, folds them into the registry's rolling per-agent
//! metrics, and maintains an advisory per-strategy flow-ratio weighting. The
//! smoothing factor bounds how far one outlier task can swing any average,
//! which keeps selections from thrashing. The strategy weighting is advisory
//! only: the router consults it for profiles that carried no recognizable
//! main requirement, and it is always passed to the selection engine
//! explicitly.

use crate::dispatch::{OutcomeEvent, OutcomeSink};
use crate::registry::AgentRegistry;
use crate::selection::Strategy;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Rolling per-strategy flow ratios
#[derive(Debug, Clone, Default)]
pub struct StrategyWeights {
    flow_ratio: HashMap<Strategy, f64>,
    samples: HashMap<Strategy, u64>,
}

impl StrategyWeights {
    fn update(&mut self, strategy: Strategy, indicator: f64, alpha: f64) {
        let old = self.flow_ratio.get(&strategy).copied().unwrap_or(0.5);
        self.flow_ratio
            .insert(strategy, alpha * indicator + (1.0 - alpha) * old);
        *self.samples.entry(strategy).or_insert(0) += 1;
    }

    /// Current flow ratio for a strategy, if it has been observed
    pub fn flow_ratio_of(&self, strategy: Strategy) -> Option<f64> {
        self.samples
            .get(&strategy)
            .filter(|&&n| n > 0)
            .and_then(|_| self.flow_ratio.get(&strategy).copied())
    }

    /// Strategy with the best recent flow ratio, if any has been observed
    ///
    /// Iterates strategies in a fixed order so equal ratios resolve
    /// deterministically.
    pub fn best(&self) -> Option<Strategy> {
        let mut best: Option<(Strategy, f64)> = None;
        for strategy in Strategy::ALL {
            if let Some(ratio) = self.flow_ratio_of(strategy) {
                if best.map(|(_, r)| ratio > r).unwrap_or(true) {
                    best = Some((strategy, ratio));
                }
            }
        }
        best.map(|(s, _)| s)
    }
}

/// Folds observed outcomes back into future scoring
pub struct FeedbackLearner {
    registry: AgentRegistry,
    alpha: f64,
    weights: RwLock<StrategyWeights>,
}

impl FeedbackLearner {
    /// `alpha` is the EWMA smoothing factor, already validated by the config
    pub fn new(registry: AgentRegistry, alpha: f64) -> Self {
        Self {
            registry,
            alpha,
            weights: RwLock::new(StrategyWeights::default()),
        }
    }

    /// Fold one outcome into the agent's metrics and the strategy weights
    pub fn record(&self, event: &OutcomeEvent) {
        self.registry
            .update_metrics(&event.agent_id, event, self.alpha);

        let indicator = event.classification.flow_indicator();
        let mut weights = self.weights.write().unwrap();
        weights.update(event.strategy, indicator, self.alpha);
        debug!(
            agent_id = %event.agent_id,
            strategy = ?event.strategy,
            classification = ?event.classification,
            "Outcome recorded"
        );
    }

    /// Advisory default strategy: the one with the best recent flow ratio
    pub fn advisory_strategy(&self) -> Option<Strategy> {
        self.weights.read().unwrap().best()
    }

    /// Snapshot of the current strategy weights
    pub fn strategy_weights(&self) -> StrategyWeights {
        self.weights.read().unwrap().clone()
    }
}

impl OutcomeSink for FeedbackLearner {
    fn record(&self, event: &OutcomeEvent) {
        FeedbackLearner::record(self, event);
    }
}
