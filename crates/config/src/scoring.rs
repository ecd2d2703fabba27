//! Lead Scoring Configuration
//!
//! Config-driven point values for each scoring category, grade cutoffs and
//! the auto-qualification threshold. Every section has defaults, so a partial
//! `scoring.yaml` only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Scoring configuration loaded from scoring.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Per-category weight multipliers
    #[serde(default)]
    pub weights: CategoryWeights,
    /// Budget fit scoring
    #[serde(default)]
    pub budget: BudgetScoringConfig,
    /// Timeline urgency scoring
    #[serde(default)]
    pub timeline: TimelineScoringConfig,
    /// Conversation engagement scoring
    #[serde(default)]
    pub engagement: EngagementScoringConfig,
    /// Intent signal scoring
    #[serde(default)]
    pub intent: IntentScoringConfig,
    /// Profile completeness scoring
    #[serde(default)]
    pub completeness: CompletenessScoringConfig,
    /// Penalty scores
    #[serde(default)]
    pub penalties: PenaltyConfig,
    /// Letter grade cutoffs
    #[serde(default)]
    pub grades: GradeThresholds,
    /// Auto-qualification
    #[serde(default)]
    pub qualification: QualificationConfig,
}

impl ScoringConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file, falling back to defaults when it is missing
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(msg)) => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    error = %msg,
                    "Scoring config not found, using built-in defaults"
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("weights.budget", self.weights.budget),
            ("weights.timeline", self.weights.timeline),
            ("weights.engagement", self.weights.engagement),
            ("weights.intent", self.weights.intent),
            ("weights.completeness", self.weights.completeness),
        ];
        for (field, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be a non-negative number, got {}", weight),
                });
            }
        }

        let g = &self.grades;
        if !(g.a > g.b && g.b > g.c && g.c > g.d && g.d > 0) {
            return Err(ConfigError::InvalidValue {
                field: "grades".to_string(),
                message: format!(
                    "Cutoffs must be strictly descending and above 0 (a={}, b={}, c={}, d={})",
                    g.a, g.b, g.c, g.d
                ),
            });
        }
        if g.a > 100 {
            return Err(ConfigError::InvalidValue {
                field: "grades.a".to_string(),
                message: format!("Must be at most 100, got {}", g.a),
            });
        }

        if self.qualification.threshold > 100 {
            return Err(ConfigError::InvalidValue {
                field: "qualification.threshold".to_string(),
                message: format!("Must be at most 100, got {}", self.qualification.threshold),
            });
        }

        if self.penalties.negative_sentiment > 0 || self.penalties.not_interested > 0 {
            return Err(ConfigError::InvalidValue {
                field: "penalties".to_string(),
                message: "Penalties must be zero or negative".to_string(),
            });
        }

        Ok(())
    }
}

/// Category weights for scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub budget: f32,
    pub timeline: f32,
    pub engagement: f32,
    pub intent: f32,
    pub completeness: f32,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            budget: 1.0,
            timeline: 1.0,
            engagement: 1.0,
            intent: 1.0,
            completeness: 1.0,
        }
    }
}

/// A budget floor and the points it earns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetTier {
    pub min_amount: f64,
    pub score: u32,
}

/// Budget fit scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetScoringConfig {
    pub max_score: u32,
    /// Evaluated highest floor first
    pub tiers: Vec<BudgetTier>,
    /// Points for any positive amount below the lowest tier
    pub any_amount_score: u32,
}

impl Default for BudgetScoringConfig {
    fn default() -> Self {
        Self {
            max_score: 25,
            tiers: vec![
                BudgetTier { min_amount: 10_000.0, score: 25 },
                BudgetTier { min_amount: 5_000.0, score: 18 },
                BudgetTier { min_amount: 2_500.0, score: 12 },
                BudgetTier { min_amount: 1_000.0, score: 8 },
            ],
            any_amount_score: 4,
        }
    }
}

/// Keywords that put a timeline into a tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineTier {
    pub score: u32,
    pub keywords: Vec<String>,
}

/// Timeline urgency scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineScoringConfig {
    pub max_score: u32,
    /// First tier with a matching keyword wins
    pub tiers: Vec<TimelineTier>,
}

impl Default for TimelineScoringConfig {
    fn default() -> Self {
        let tier = |score: u32, keywords: &[&str]| TimelineTier {
            score,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        Self {
            max_score: 20,
            tiers: vec![
                tier(
                    20,
                    &["immediate", "immediately", "asap", "urgent", "this week", "right away"],
                ),
                tier(15, &["within a month", "this month", "2-4 weeks", "1 month"]),
                tier(10, &["1-3 months", "next quarter", "next month"]),
                tier(5, &["3-6 months"]),
                tier(
                    2,
                    &[
                        "6+ months",
                        "6 months",
                        "6-12 months",
                        "12 months",
                        "12+ months",
                        "just exploring",
                        "exploring",
                        "not sure",
                    ],
                ),
            ],
        }
    }
}

/// Engagement scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementScoringConfig {
    pub max_score: u32,
    pub per_conversation_score: u32,
    pub max_conversations: u32,
    pub long_talk_minutes: u32,
    pub long_talk_score: u32,
    pub medium_talk_minutes: u32,
    pub medium_talk_score: u32,
    pub positive_sentiment_score: u32,
    pub max_positive: u32,
}

impl Default for EngagementScoringConfig {
    fn default() -> Self {
        Self {
            max_score: 25,
            per_conversation_score: 3,
            max_conversations: 5,
            long_talk_minutes: 30,
            long_talk_score: 5,
            medium_talk_minutes: 10,
            medium_talk_score: 3,
            positive_sentiment_score: 2,
            max_positive: 3,
        }
    }
}

/// Intent signal scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentScoringConfig {
    pub max_score: u32,
    pub first_booking_score: u32,
    pub additional_booking_score: u32,
    pub high_intent_score: u32,
    pub interested_score: u32,
    /// Detected intents that count as buying signals (case-insensitive)
    pub high_intent_keywords: Vec<String>,
}

impl Default for IntentScoringConfig {
    fn default() -> Self {
        Self {
            max_score: 20,
            first_booking_score: 12,
            additional_booking_score: 4,
            high_intent_score: 3,
            interested_score: 2,
            high_intent_keywords: ["pricing", "purchase", "ready_to_buy", "book_call", "demo"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Profile completeness scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessScoringConfig {
    pub max_score: u32,
}

impl Default for CompletenessScoringConfig {
    fn default() -> Self {
        Self { max_score: 10 }
    }
}

/// Penalty scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyConfig {
    pub negative_sentiment: i32,
    pub not_interested: i32,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            negative_sentiment: -3,
            not_interested: -10,
        }
    }
}

/// Minimum score for each grade; anything below `d` is F
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a: 80,
            b: 60,
            c: 40,
            d: 20,
        }
    }
}

/// Auto-qualification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationConfig {
    /// `score >= threshold` qualifies
    pub threshold: u32,
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self { threshold: 70 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.qualification.threshold, 70);
        assert_eq!(config.grades.a, 80);
    }

    #[test]
    fn test_category_maxima_sum_to_hundred() {
        let c = ScoringConfig::default();
        let sum = c.budget.max_score
            + c.timeline.max_score
            + c.engagement.max_score
            + c.intent.max_score
            + c.completeness.max_score;
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
weights:
  budget: 1.5
  timeline: 1.0
  engagement: 1.0
  intent: 0.5
  completeness: 1.0

qualification:
  threshold: 60

grades:
  a: 85
  b: 65
  c: 45
  d: 25
"#;
        let config: ScoringConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.weights.budget, 1.5);
        assert_eq!(config.qualification.threshold, 60);
        assert_eq!(config.grades.a, 85);
        // untouched sections keep defaults
        assert_eq!(config.budget.max_score, 25);
        assert_eq!(config.timeline.tiers.len(), 5);
    }

    #[test]
    fn test_grade_thresholds_must_descend() {
        let mut config = ScoringConfig::default();
        config.grades.b = 90;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.grades.d = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = ScoringConfig::default();
        config.weights.intent = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_positive_penalty_rejected() {
        let mut config = ScoringConfig::default();
        config.penalties.not_interested = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "qualification:\n  threshold: 55").unwrap();

        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.qualification.threshold, 55);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = ScoringConfig::load_or_default("/nonexistent/scoring.yaml").unwrap();
        assert_eq!(config.qualification.threshold, 70);
        assert!(matches!(
            ScoringConfig::load("/nonexistent/scoring.yaml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
