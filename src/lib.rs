//! flowroute - Dynamic Task Routing Engine
//!
//! Accepts a unit of work described by qualitative requirements, scores
//! candidate executors ("agents") on live and historical performance data,
//! selects one with a fallback chain, dispatches under a timeout contract,
//! and folds the observed outcome back into future scoring.
//!
//! # Overview
//!
//! - Profile normalization: malformed task records are repaired, never
//!   rejected
//! - Four explicit selection strategies driven by the task's main
//!   requirement, with high urgency forcing speed priority
//! - Dispatch with per-attempt timeouts and automatic fallback retry
//! - An EWMA feedback loop that keeps one outlier task from thrashing
//!   subsequent selections
//! - Structured handoff packages for chained execution across agents
//!
//! # Quick Start
//!
//! ```rust
//! use flowroute::config::RouterConfig;
//! use flowroute::profile::{MainRequirement, RawTaskProfile};
//! use flowroute::registry::AgentDescriptor;
//! use flowroute::router::TaskRouter;
//!
//! let config = RouterConfig {
//!     agents: vec![
//!         AgentDescriptor::new("fast-agent", vec![MainRequirement::Speed])
//!             .with_specialties(vec!["gaming-security".to_string()])
//!             .with_cost(0.5, 1.0),
//!         AgentDescriptor::new("careful-agent", vec![MainRequirement::Accuracy])
//!             .with_cost(2.0, 4.0),
//!     ],
//!     ..Default::default()
//! };
//!
//! let router = TaskRouter::from_config(config).unwrap();
//!
//! let raw = RawTaskProfile {
//!     urgency: Some("high".to_string()),
//!     domain: Some("gaming-security".to_string()),
//!     main_requirement: Some("speed".to_string()),
//!     ..Default::default()
//! };
//!
//! let selection = router.route(&raw).unwrap();
//! assert_eq!(selection.agent_id, "fast-agent");
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod feedback;
pub mod handoff;
pub mod observability;
pub mod profile;
pub mod registry;
pub mod router;
pub mod selection;
pub mod testing;

pub use config::RouterConfig;
pub use dispatch::{
    AgentInvoker, DispatchCoordinator, FlowSignal, InvocationOutput, InvocationRequest,
    InvokeError, OutcomeEvent, OutcomeSink,
};
pub use error::{AttemptFailure, FailureKind, RouterError, RouterResult};
pub use feedback::{FeedbackLearner, StrategyWeights};
pub use handoff::{HandoffPackage, HandoffProtocol};
pub use profile::{ProfileNormalizer, RawTaskProfile, TaskProfile};
pub use registry::{AgentDescriptor, AgentRegistry, CostPerUnit, PerformanceMetrics};
pub use router::TaskRouter;
pub use selection::{SelectionResult, SelectionStrategyEngine, Strategy};
