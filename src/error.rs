//! Error types for routing engine operations
//!
//! The taxonomy distinguishes caller-recoverable failures (`NoEligibleAgent`,
//! `DispatchExhausted`) from fatal configuration problems
//! (`RegistryInconsistency`, surfaced at load time only). Malformed task
//! profiles never surface as errors; the normalizer repairs them locally.

use thiserror::Error;

/// Why a single dispatch attempt against one agent failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The attempt exceeded its urgency-derived timeout and was cancelled
    Timeout,
    /// The invoker returned an error
    Invocation(String),
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Invocation(msg) => write!(f, "invocation failed: {msg}"),
        }
    }
}

/// One failed attempt within an exhausted dispatch, kept for operator triage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub agent_id: String,
    pub kind: FailureKind,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.agent_id, self.kind)
    }
}

/// Main error type for routing engine operations
#[derive(Debug, Error)]
pub enum RouterError {
    /// The eligible set was empty after domain/ethics/cost filtering.
    /// Not retried automatically; the caller decides whether to relax
    /// constraints and route again.
    #[error("no eligible agent for domain '{domain}': {reason}")]
    NoEligibleAgent { domain: String, reason: String },

    /// Every attempted agent failed and the retry budget is spent
    #[error("dispatch exhausted after {} attempt(s): {}", attempts.len(), format_attempts(attempts))]
    DispatchExhausted { attempts: Vec<AttemptFailure> },

    /// The static agent configuration is malformed. Raised at load time,
    /// never at request time.
    #[error("registry inconsistency: {message}")]
    RegistryInconsistency { message: String },

    #[error("configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

fn format_attempts(attempts: &[AttemptFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RouterError {
    /// Create a no-eligible-agent error
    pub fn no_eligible_agent<S: Into<String>, R: Into<String>>(domain: S, reason: R) -> Self {
        Self::NoEligibleAgent {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a registry inconsistency error
    pub fn registry_inconsistency<S: Into<String>>(message: S) -> Self {
        Self::RegistryInconsistency {
            message: message.into(),
        }
    }

    /// Agent ids attempted before dispatch gave up, in attempt order
    pub fn attempted_agents(&self) -> Vec<&str> {
        match self {
            RouterError::DispatchExhausted { attempts } => {
                attempts.iter().map(|a| a.agent_id.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Result type for routing engine operations
pub type RouterResult<T> = Result<T, RouterError>;
