//! Configuration for the routing engine
//!
//! Loaded from TOML. Recognized options: per-urgency dispatch timeouts, the
//! EWMA smoothing factor, cost ceilings per cost-sensitivity level, the
//! tie-break margin, and the static agent roster.

use crate::profile::{CostSensitivity, Urgency};
use crate::registry::AgentDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main routing engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    pub timeouts: TimeoutSection,
    pub learning: LearningSection,
    pub cost_ceilings: CostCeilingSection,
    pub selection: SelectionSection,
    /// Static agent roster loaded into the registry at startup
    pub agents: Vec<AgentDescriptor>,
}

/// Per-urgency dispatch timeouts, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutSection {
    pub high_ms: u64,
    pub medium_ms: u64,
    pub low_ms: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            high_ms: 5_000,
            medium_ms: 30_000,
            low_ms: 120_000,
        }
    }
}

impl TimeoutSection {
    /// Dispatch timeout for one attempt at the given urgency
    pub fn for_urgency(&self, urgency: Urgency) -> Duration {
        let ms = match urgency {
            Urgency::High => self.high_ms,
            Urgency::Medium => self.medium_ms,
            Urgency::Low => self.low_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Feedback learning parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LearningSection {
    /// EWMA smoothing factor, must be in (0, 1). Bounds how far a single
    /// outcome can swing an agent's rolling metrics.
    pub alpha: f64,
}

impl Default for LearningSection {
    fn default() -> Self {
        Self { alpha: 0.2 }
    }
}

/// Absolute cost ceilings per cost-sensitivity level
///
/// An absent level means unlimited. Treated as absolute cost-unit thresholds;
/// confirm the units against real deployment costs before tightening them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostCeilingSection {
    pub low: Option<f64>,
    pub medium: Option<f64>,
    pub high: Option<f64>,
}

impl Default for CostCeilingSection {
    fn default() -> Self {
        Self {
            low: None,
            medium: Some(50.0),
            high: Some(10.0),
        }
    }
}

impl CostCeilingSection {
    /// Ceiling for the given sensitivity, None when unlimited
    pub fn for_sensitivity(&self, sensitivity: CostSensitivity) -> Option<f64> {
        match sensitivity {
            CostSensitivity::Low => self.low,
            CostSensitivity::Medium => self.medium,
            CostSensitivity::High => self.high,
        }
    }
}

/// Selection and dispatch tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionSection {
    /// Relative score margin within which two agents count as tied
    pub tie_break_margin: f64,
    /// Hard cap on dispatch attempts per task (winner + fallbacks)
    pub max_attempts: usize,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            tie_break_margin: 0.01,
            max_attempts: 3,
        }
    }
}

impl RouterConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RouterConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate option ranges
    ///
    /// Agent roster consistency is checked separately at registry load time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning.alpha > 0.0 && self.learning.alpha < 1.0) {
            return Err(ConfigError::InvalidConfig(format!(
                "learning.alpha must be in (0, 1), got {}",
                self.learning.alpha
            )));
        }
        if self.selection.tie_break_margin < 0.0 {
            return Err(ConfigError::InvalidConfig(format!(
                "selection.tie_break_margin must be non-negative, got {}",
                self.selection.tie_break_margin
            )));
        }
        if self.selection.max_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "selection.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.timeouts.high_ms == 0 || self.timeouts.medium_ms == 0 || self.timeouts.low_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "dispatch timeouts must be non-zero".to_string(),
            ));
        }
        for ceiling in [
            self.cost_ceilings.low,
            self.cost_ceilings.medium,
            self.cost_ceilings.high,
        ]
        .into_iter()
        .flatten()
        {
            if ceiling <= 0.0 {
                return Err(ConfigError::InvalidConfig(format!(
                    "cost ceilings must be positive, got {ceiling}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = RouterConfig::default();

        assert_eq!(
            config.timeouts.for_urgency(Urgency::High),
            Duration::from_secs(5)
        );
        assert_eq!(
            config.timeouts.for_urgency(Urgency::Medium),
            Duration::from_secs(30)
        );
        assert_eq!(
            config.timeouts.for_urgency(Urgency::Low),
            Duration::from_secs(120)
        );
        assert_eq!(config.learning.alpha, 0.2);
        assert_eq!(config.selection.tie_break_margin, 0.01);
        assert_eq!(config.selection.max_attempts, 3);
        assert_eq!(
            config.cost_ceilings.for_sensitivity(CostSensitivity::High),
            Some(10.0)
        );
        assert_eq!(
            config.cost_ceilings.for_sensitivity(CostSensitivity::Low),
            None
        );
    }

    #[test]
    fn test_alpha_out_of_range_rejected() {
        let mut config = RouterConfig::default();
        config.learning.alpha = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));

        config.learning.alpha = 0.0;
        assert!(config.validate().is_err());

        config.learning.alpha = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = RouterConfig::default();
        config.selection.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_ceiling_rejected() {
        let mut config = RouterConfig::default();
        config.cost_ceilings.high = Some(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: RouterConfig = toml::from_str("").unwrap();
        assert_eq!(config, RouterConfig::default());
        assert!(config.agents.is_empty());
    }
}
