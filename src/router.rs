//! Task router facade
//!
//! Wires the components into the engine's external surface: route requests,
//! dispatch, outcome reports, and atomic registry administration. Data flows
//! caller → normalizer → selection (reads registry) → dispatch (invokes the
//! executor) → outcome → learner (writes registry) → next selection.

use crate::config::RouterConfig;
use crate::dispatch::{
    AgentInvoker, DispatchCoordinator, InvocationRequest, OutcomeEvent, OutcomeSink,
};
use crate::error::RouterResult;
use crate::feedback::FeedbackLearner;
use crate::handoff::HandoffPackage;
use crate::profile::{ProfileNormalizer, RawTaskProfile, TaskProfile, Urgency};
use crate::registry::{AgentDescriptor, AgentRegistry};
use crate::selection::{SelectionResult, SelectionStrategyEngine, Strategy};
use std::sync::Arc;
use tracing::debug;

/// The single logical routing authority
pub struct TaskRouter {
    registry: AgentRegistry,
    engine: SelectionStrategyEngine,
    learner: Arc<FeedbackLearner>,
    coordinator: DispatchCoordinator,
}

impl TaskRouter {
    /// Build a router from validated configuration, failing fast on a
    /// malformed agent roster
    pub fn from_config(config: RouterConfig) -> RouterResult<Self> {
        config.validate()?;
        let registry = AgentRegistry::load(config.agents.clone())?;
        let learner = Arc::new(FeedbackLearner::new(
            registry.clone(),
            config.learning.alpha,
        ));
        let sink: Arc<dyn OutcomeSink> = Arc::clone(&learner) as Arc<dyn OutcomeSink>;
        Ok(Self {
            engine: SelectionStrategyEngine::new(&config),
            coordinator: DispatchCoordinator::new(&config, sink),
            registry,
            learner,
        })
    }

    /// The live registry (shared with the learner)
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Normalize a raw record into a routable profile
    pub fn normalize(&self, raw: &RawTaskProfile) -> TaskProfile {
        ProfileNormalizer::normalize(raw)
    }

    /// Route request: normalize, pick a strategy, score, select
    ///
    /// When the caller supplied no recognizable main requirement and urgency
    /// does not force the speed strategy, the learner's advisory strategy
    /// (the one with the best recent flow ratio) replaces the accuracy
    /// default. The advisory signal is injected explicitly; selection itself
    /// stays a pure function of its arguments.
    pub fn route(&self, raw: &RawTaskProfile) -> RouterResult<SelectionResult> {
        let profile = ProfileNormalizer::normalize(raw);

        if !raw.has_explicit_requirement() && profile.urgency != Urgency::High {
            if let Some(advisory) = self.learner.advisory_strategy() {
                debug!(?advisory, "Ambiguous main requirement, using advisory strategy");
                return self.engine.select_using(advisory, &profile, &self.registry);
            }
        }
        self.engine.select(&profile, &self.registry)
    }

    /// Dispatch an already-routed task through the fallback chain
    pub async fn dispatch(
        &self,
        profile: &TaskProfile,
        selection: &SelectionResult,
        request: &InvocationRequest,
        invoker: &dyn AgentInvoker,
    ) -> RouterResult<OutcomeEvent> {
        self.coordinator
            .dispatch(profile, selection, request, invoker)
            .await
    }

    /// Route and dispatch in one step
    pub async fn route_and_dispatch(
        &self,
        raw: &RawTaskProfile,
        instruction: &str,
        invoker: &dyn AgentInvoker,
    ) -> RouterResult<OutcomeEvent> {
        let profile = ProfileNormalizer::normalize(raw);
        let selection = self.route(raw)?;
        let request = InvocationRequest::new(&profile, instruction);
        self.dispatch(&profile, &selection, &request, invoker).await
    }

    /// Route and dispatch the second leg of a chained task
    ///
    /// A fresh selection with the same profile; the handoff package rides in
    /// the invocation with its rendered context addendum.
    pub async fn route_and_dispatch_chained(
        &self,
        raw: &RawTaskProfile,
        instruction: &str,
        handoff: HandoffPackage,
        invoker: &dyn AgentInvoker,
    ) -> RouterResult<OutcomeEvent> {
        let profile = ProfileNormalizer::normalize(raw);
        let selection = self.route(raw)?;
        let request = InvocationRequest::new(&profile, instruction).with_handoff(handoff);
        self.dispatch(&profile, &selection, &request, invoker).await
    }

    /// Outcome report: fold an externally observed outcome into the metrics
    pub fn report_outcome(&self, event: &OutcomeEvent) {
        self.learner.record(event);
    }

    /// Registry admin: atomically replace the agent roster
    pub fn replace_registry(&self, descriptors: Vec<AgentDescriptor>) -> RouterResult<()> {
        self.registry.replace_all(descriptors)
    }

    /// The learner's current advisory strategy, if any outcomes were seen
    pub fn advisory_strategy(&self) -> Option<Strategy> {
        self.learner.advisory_strategy()
    }
}
