//! Task profile model and normalization
//!
//! A [`TaskProfile`] is the routing-relevant shape of one task: a handful of
//! enumerated requirement fields plus a free-form domain string. Callers hand
//! the engine a [`RawTaskProfile`] (possibly partial or malformed, e.g.
//! deserialized from untrusted JSON); [`ProfileNormalizer`] repairs it into a
//! fully-populated profile and never fails.

use serde::{Deserialize, Serialize};

/// How much investigation depth the task calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Shallow,
    Moderate,
    Deep,
}

/// How quickly the task must complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Structural complexity of the task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// How much the caller cares about cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSensitivity {
    Low,
    Medium,
    High,
}

/// The single requirement the caller optimizes for
///
/// This is a closed set: agent strength declarations use the same enumeration
/// so scoring logic can be exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainRequirement {
    Speed,
    Accuracy,
    Creativity,
    Cost,
    Ethics,
}

impl Depth {
    /// Parse from a raw string (case-insensitive), None if unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "shallow" => Some(Depth::Shallow),
            "moderate" => Some(Depth::Moderate),
            "deep" => Some(Depth::Deep),
            _ => None,
        }
    }
}

impl Urgency {
    /// Parse from a raw string (case-insensitive), None if unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            _ => None,
        }
    }
}

impl Complexity {
    /// Parse from a raw string (case-insensitive), None if unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Some(Complexity::Simple),
            "moderate" => Some(Complexity::Moderate),
            "complex" => Some(Complexity::Complex),
            _ => None,
        }
    }

    /// Latency multiplier applied when estimating how long an agent will take
    pub fn latency_multiplier(&self) -> f64 {
        match self {
            Complexity::Simple => 1.0,
            Complexity::Moderate => 1.3,
            Complexity::Complex => 1.8,
        }
    }
}

impl CostSensitivity {
    /// Parse from a raw string (case-insensitive), None if unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(CostSensitivity::Low),
            "medium" => Some(CostSensitivity::Medium),
            "high" => Some(CostSensitivity::High),
            _ => None,
        }
    }
}

impl MainRequirement {
    /// Parse from a raw string (case-insensitive), None if unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "speed" => Some(MainRequirement::Speed),
            "accuracy" => Some(MainRequirement::Accuracy),
            "creativity" => Some(MainRequirement::Creativity),
            "cost" => Some(MainRequirement::Cost),
            "ethics" => Some(MainRequirement::Ethics),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            MainRequirement::Speed => "speed",
            MainRequirement::Accuracy => "accuracy",
            MainRequirement::Creativity => "creativity",
            MainRequirement::Cost => "cost",
            MainRequirement::Ethics => "ethics",
        }
    }
}

/// Normalized task profile with every field populated and within its domain
///
/// Constructed once per incoming task by [`ProfileNormalizer::normalize`],
/// immutable afterwards, discarded after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProfile {
    pub depth: Depth,
    pub urgency: Urgency,
    /// Lowercased; `"general"` when the caller declared none
    pub domain: String,
    pub complexity: Complexity,
    pub creativity_needed: bool,
    pub cost_sensitivity: CostSensitivity,
    pub ethical_review_required: bool,
    pub main_requirement: MainRequirement,
}

impl Default for TaskProfile {
    fn default() -> Self {
        Self {
            depth: Depth::Moderate,
            urgency: Urgency::Medium,
            domain: "general".to_string(),
            complexity: Complexity::Moderate,
            creativity_needed: false,
            cost_sensitivity: CostSensitivity::Medium,
            ethical_review_required: false,
            main_requirement: MainRequirement::Accuracy,
        }
    }
}

/// Incoming task-requirement record, as received from the caller
///
/// Every field is optional and string-typed where enumerated, so arbitrary
/// partially-populated JSON deserializes without error. Repair happens in
/// [`ProfileNormalizer::normalize`], never at parse time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTaskProfile {
    pub depth: Option<String>,
    pub urgency: Option<String>,
    pub domain: Option<String>,
    pub complexity: Option<String>,
    pub creativity_needed: Option<bool>,
    pub cost_sensitivity: Option<String>,
    pub ethical_review_required: Option<bool>,
    pub main_requirement: Option<String>,
}

impl RawTaskProfile {
    /// True when the caller supplied a recognizable main requirement
    ///
    /// Used by the router to decide whether the learner's advisory strategy
    /// may override the normalizer's `accuracy` default.
    pub fn has_explicit_requirement(&self) -> bool {
        self.main_requirement
            .as_deref()
            .and_then(MainRequirement::parse)
            .is_some()
    }
}

impl From<&TaskProfile> for RawTaskProfile {
    fn from(profile: &TaskProfile) -> Self {
        Self {
            depth: Some(format!("{:?}", profile.depth).to_lowercase()),
            urgency: Some(format!("{:?}", profile.urgency).to_lowercase()),
            domain: Some(profile.domain.clone()),
            complexity: Some(format!("{:?}", profile.complexity).to_lowercase()),
            creativity_needed: Some(profile.creativity_needed),
            cost_sensitivity: Some(format!("{:?}", profile.cost_sensitivity).to_lowercase()),
            ethical_review_required: Some(profile.ethical_review_required),
            main_requirement: Some(profile.main_requirement.as_str().to_string()),
        }
    }
}

/// Validates and repairs raw task-requirement records
///
/// `normalize` is total: unknown, missing, or out-of-range fields are
/// replaced by documented defaults rather than rejected. It is pure and
/// idempotent: normalizing the raw form of an already-normalized profile
/// yields the same profile.
pub struct ProfileNormalizer;

impl ProfileNormalizer {
    /// Repair a raw profile into a fully-populated [`TaskProfile`]
    ///
    /// Defaults: depth=moderate, urgency=medium, complexity=moderate,
    /// cost_sensitivity=medium, main_requirement=accuracy, booleans=false,
    /// domain="general". Empty or whitespace-only domains count as absent;
    /// domains are lowercased for case-insensitive specialty matching.
    pub fn normalize(raw: &RawTaskProfile) -> TaskProfile {
        let defaults = TaskProfile::default();

        let domain = raw
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| defaults.domain.clone());

        TaskProfile {
            depth: raw
                .depth
                .as_deref()
                .and_then(Depth::parse)
                .unwrap_or(defaults.depth),
            urgency: raw
                .urgency
                .as_deref()
                .and_then(Urgency::parse)
                .unwrap_or(defaults.urgency),
            domain,
            complexity: raw
                .complexity
                .as_deref()
                .and_then(Complexity::parse)
                .unwrap_or(defaults.complexity),
            creativity_needed: raw.creativity_needed.unwrap_or(false),
            cost_sensitivity: raw
                .cost_sensitivity
                .as_deref()
                .and_then(CostSensitivity::parse)
                .unwrap_or(defaults.cost_sensitivity),
            ethical_review_required: raw.ethical_review_required.unwrap_or(false),
            main_requirement: raw
                .main_requirement
                .as_deref()
                .and_then(MainRequirement::parse)
                .unwrap_or(defaults.main_requirement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_raw_profile_gets_all_defaults() {
        let profile = ProfileNormalizer::normalize(&RawTaskProfile::default());

        assert_eq!(profile, TaskProfile::default());
        assert_eq!(profile.domain, "general");
        assert_eq!(profile.main_requirement, MainRequirement::Accuracy);
    }

    #[test]
    fn test_garbage_enum_values_fall_back_to_defaults() {
        let raw = RawTaskProfile {
            depth: Some("bottomless".to_string()),
            urgency: Some("yesterday".to_string()),
            complexity: Some("".to_string()),
            cost_sensitivity: Some("???".to_string()),
            main_requirement: Some("vibes".to_string()),
            ..Default::default()
        };

        let profile = ProfileNormalizer::normalize(&raw);

        assert_eq!(profile.depth, Depth::Moderate);
        assert_eq!(profile.urgency, Urgency::Medium);
        assert_eq!(profile.complexity, Complexity::Moderate);
        assert_eq!(profile.cost_sensitivity, CostSensitivity::Medium);
        assert_eq!(profile.main_requirement, MainRequirement::Accuracy);
    }

    #[test]
    fn test_case_insensitive_parsing_with_whitespace() {
        let raw = RawTaskProfile {
            depth: Some("  DEEP ".to_string()),
            urgency: Some("High".to_string()),
            main_requirement: Some("SPEED".to_string()),
            ..Default::default()
        };

        let profile = ProfileNormalizer::normalize(&raw);

        assert_eq!(profile.depth, Depth::Deep);
        assert_eq!(profile.urgency, Urgency::High);
        assert_eq!(profile.main_requirement, MainRequirement::Speed);
    }

    #[test]
    fn test_domain_lowercased_and_blank_treated_as_general() {
        let raw = RawTaskProfile {
            domain: Some("Gaming-Security".to_string()),
            ..Default::default()
        };
        assert_eq!(ProfileNormalizer::normalize(&raw).domain, "gaming-security");

        let blank = RawTaskProfile {
            domain: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(ProfileNormalizer::normalize(&blank).domain, "general");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = RawTaskProfile {
            depth: Some("deep".to_string()),
            urgency: Some("nonsense".to_string()),
            domain: Some("FinTech".to_string()),
            creativity_needed: Some(true),
            ..Default::default()
        };

        let once = ProfileNormalizer::normalize(&raw);
        let twice = ProfileNormalizer::normalize(&RawTaskProfile::from(&once));

        assert_eq!(once, twice);
    }

    #[test]
    fn test_explicit_requirement_detection() {
        let explicit = RawTaskProfile {
            main_requirement: Some("cost".to_string()),
            ..Default::default()
        };
        assert!(explicit.has_explicit_requirement());

        let garbage = RawTaskProfile {
            main_requirement: Some("fastest-please".to_string()),
            ..Default::default()
        };
        assert!(!garbage.has_explicit_requirement());

        assert!(!RawTaskProfile::default().has_explicit_requirement());
    }

    #[test]
    fn test_raw_profile_deserializes_from_partial_json() {
        let raw: RawTaskProfile =
            serde_json::from_str(r#"{"urgency": "high", "domain": "legal"}"#).unwrap();

        assert_eq!(raw.urgency.as_deref(), Some("high"));
        assert_eq!(raw.domain.as_deref(), Some("legal"));
        assert!(raw.depth.is_none());
    }

    #[test]
    fn test_complexity_multipliers() {
        assert_eq!(Complexity::Simple.latency_multiplier(), 1.0);
        assert_eq!(Complexity::Moderate.latency_multiplier(), 1.3);
        assert_eq!(Complexity::Complex.latency_multiplier(), 1.8);
    }
}
