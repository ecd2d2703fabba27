//! Score Calculator
//!
//! Deterministic, side-effect free. Given the same lead and the same set of
//! conversations (in any order) it always returns the same breakdown.
//!
//! Categories:
//! - budget fit (0-25)
//! - timeline urgency (0-20)
//! - conversation engagement (0-25)
//! - intent signals (0-20)
//! - profile completeness (0-10)
//! - penalty from negative signals (<= 0)

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use lead_scoring_config::ScoringConfig;
use lead_scoring_core::{Conversation, Error, Lead, Outcome, Result, ScoreBreakdown, Sentiment};

/// Dollar figures like "$10,000", "2500", "7.5k", "$1.5M"
static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(million|k|m)?\b")
        .expect("static amount pattern is valid")
});

/// Words that cancel a timeline keyword directly after them
const NEGATIONS: &[&str] = &["not", "no", "never"];

/// Number of optional profile fields counted for completeness
const PROFILE_FIELDS: u32 = 12;

pub struct ScoreCalculator {
    config: Arc<ScoringConfig>,
}

impl ScoreCalculator {
    pub fn new(config: Arc<ScoringConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Compute the breakdown for one lead.
    ///
    /// Fails closed on input that could only come from corrupt storage:
    /// conversations belonging to another lead, or a non-finite / negative
    /// allocated budget.
    pub fn calculate(&self, lead: &Lead, conversations: &[Conversation]) -> Result<ScoreBreakdown> {
        if let Some(stray) = conversations.iter().find(|c| c.lead_id != lead.id) {
            return Err(Error::Computation {
                lead_id: lead.id.clone(),
                reason: format!(
                    "conversation {} belongs to lead {}",
                    stray.id, stray.lead_id
                ),
            });
        }

        if let Some(amount) = lead.budget_allocated {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::Computation {
                    lead_id: lead.id.clone(),
                    reason: format!("invalid allocated budget: {}", amount),
                });
            }
        }

        let weights = &self.config.weights;

        let mut breakdown = ScoreBreakdown {
            budget: weighted(
                self.budget_points(lead),
                weights.budget,
                self.config.budget.max_score,
            ),
            timeline: weighted(
                self.timeline_points(lead),
                weights.timeline,
                self.config.timeline.max_score,
            ),
            engagement: weighted(
                self.engagement_points(conversations),
                weights.engagement,
                self.config.engagement.max_score,
            ),
            intent: weighted(
                self.intent_points(conversations),
                weights.intent,
                self.config.intent.max_score,
            ),
            completeness: weighted(
                self.completeness_points(lead),
                weights.completeness,
                self.config.completeness.max_score,
            ),
            penalty: self.penalty(conversations),
            total: 0,
        };
        breakdown.total = breakdown.clamped_total();

        tracing::debug!(
            lead_id = %lead.id,
            conversations = conversations.len(),
            total = breakdown.total,
            "Calculated lead score"
        );

        Ok(breakdown)
    }

    fn budget_points(&self, lead: &Lead) -> u32 {
        let parsed = lead.budget.as_deref().and_then(parse_budget);
        let amount = match (parsed, lead.budget_allocated) {
            (Some(a), Some(b)) => a.max(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => return 0,
        };

        if amount <= 0.0 {
            return 0;
        }

        let budget = &self.config.budget;
        let mut tiers: Vec<_> = budget.tiers.iter().collect();
        tiers.sort_by(|a, b| b.min_amount.total_cmp(&a.min_amount));

        tiers
            .into_iter()
            .find(|tier| amount >= tier.min_amount)
            .map(|tier| tier.score)
            .unwrap_or(budget.any_amount_score)
    }

    fn timeline_points(&self, lead: &Lead) -> u32 {
        let Some(timeline) = lead.timeline.as_deref() else {
            return 0;
        };
        let timeline = timeline.to_lowercase();

        self.config
            .timeline
            .tiers
            .iter()
            .find(|tier| {
                tier.keywords
                    .iter()
                    .any(|k| mentions_keyword(&timeline, &k.to_lowercase()))
            })
            .map(|tier| tier.score)
            .unwrap_or(0)
    }

    fn engagement_points(&self, conversations: &[Conversation]) -> u32 {
        let cfg = &self.config.engagement;

        let count = (conversations.len() as u32).min(cfg.max_conversations);
        let mut score = count * cfg.per_conversation_score;

        let total_minutes = conversations
            .iter()
            .map(|c| c.duration_seconds as u64)
            .sum::<u64>()
            / 60;
        if total_minutes >= cfg.long_talk_minutes as u64 {
            score += cfg.long_talk_score;
        } else if total_minutes >= cfg.medium_talk_minutes as u64 {
            score += cfg.medium_talk_score;
        }

        let positive = conversations
            .iter()
            .filter(|c| c.sentiment == Some(Sentiment::Positive))
            .count() as u32;
        score += positive.min(cfg.max_positive) * cfg.positive_sentiment_score;

        score
    }

    fn intent_points(&self, conversations: &[Conversation]) -> u32 {
        let cfg = &self.config.intent;
        let mut score = 0u32;

        let booked = conversations.iter().filter(|c| c.is_booked()).count() as u32;
        if booked > 0 {
            score += cfg.first_booking_score + (booked - 1) * cfg.additional_booking_score;
        }

        let high_intent = conversations
            .iter()
            .filter_map(|c| c.intent.as_deref())
            .filter(|intent| {
                let normalized = normalize_intent(intent);
                cfg.high_intent_keywords
                    .iter()
                    .any(|k| normalize_intent(k) == normalized)
            })
            .count() as u32;
        score += high_intent * cfg.high_intent_score;

        let interested = conversations
            .iter()
            .filter(|c| c.outcome == Some(Outcome::Interested))
            .count() as u32;
        score += interested * cfg.interested_score;

        score
    }

    fn completeness_points(&self, lead: &Lead) -> u32 {
        let text_fields = [
            &lead.phone,
            &lead.business_name,
            &lead.business_type,
            &lead.website,
            &lead.target_audience,
            &lead.product_description,
            &lead.spokesperson_preferences,
            &lead.how_heard,
            &lead.biggest_challenge,
            &lead.questions,
        ];
        let mut filled = text_fields
            .iter()
            .filter(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty()))
            .count() as u32;
        if !lead.social_platforms.is_empty() {
            filled += 1;
        }
        if !lead.content_topics.is_empty() {
            filled += 1;
        }

        filled * self.config.completeness.max_score / PROFILE_FIELDS
    }

    fn penalty(&self, conversations: &[Conversation]) -> i32 {
        let cfg = &self.config.penalties;

        let negative = conversations
            .iter()
            .filter(|c| c.sentiment == Some(Sentiment::Negative))
            .count() as i32;
        let mut penalty = negative * cfg.negative_sentiment;

        if conversations
            .iter()
            .any(|c| c.outcome == Some(Outcome::NotInterested))
        {
            penalty += cfg.not_interested;
        }

        penalty
    }
}

fn weighted(points: u32, weight: f32, max: u32) -> u32 {
    ((points as f32 * weight).round() as u32).min(max)
}

fn normalize_intent(intent: &str) -> String {
    intent
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// `keyword` appears as whole words and is not negated ("not immediately").
///
/// "1 month" does not match inside "11 months".
fn mentions_keyword(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    text.match_indices(keyword).any(|(start, _)| {
        let end = start + keyword.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric) {
            return false;
        }
        !text[..start]
            .split_whitespace()
            .next_back()
            .is_some_and(|word| NEGATIONS.contains(&word))
    })
}

/// Largest dollar amount mentioned in a free-form budget string.
///
/// "under $1,000" style upper bounds are pulled just below the figure.
fn parse_budget(text: &str) -> Option<f64> {
    let max = AMOUNT_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let digits = caps.get(1)?.as_str().replace(',', "");
            let value: f64 = digits.parse().ok()?;
            let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
                Some("k") => 1_000.0,
                Some("m") | Some("million") => 1_000_000.0,
                _ => 1.0,
            };
            Some(value * multiplier)
        })
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))?;

    let lower = text.to_lowercase();
    let upper_bound_only =
        lower.contains("under") || lower.contains("less than") || lower.trim_start().starts_with('<');

    Some(if upper_bound_only { max - 1.0 } else { max })
}
