//! Pure combination of calculator, grade mapper and qualification rule

use chrono::{DateTime, Utc};
use std::sync::Arc;

use lead_scoring_config::ScoringConfig;
use lead_scoring_core::{Conversation, Grade, Lead, LeadStatus, Result, ScoreBreakdown, ScoreUpdate};

use crate::{GradeMapper, QualificationRule, ScoreCalculator};

/// Result of evaluating one lead, before anything is persisted
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub breakdown: ScoreBreakdown,
    pub grade: Grade,
    pub newly_qualified: bool,
    /// Status promotion that goes with qualification
    pub status_change: Option<LeadStatus>,
}

impl Evaluation {
    /// The atomic write for this evaluation
    pub fn to_update(&self, now: DateTime<Utc>) -> ScoreUpdate {
        ScoreUpdate {
            score: self.breakdown.total,
            breakdown: self.breakdown,
            scored_at: now,
            qualified_at: self.newly_qualified.then_some(now),
            status: self.status_change,
        }
    }
}

pub struct ScoringEngine {
    calculator: ScoreCalculator,
    grades: GradeMapper,
    qualification: QualificationRule,
}

impl ScoringEngine {
    pub fn new(config: Arc<ScoringConfig>) -> Self {
        Self {
            grades: GradeMapper::new(config.grades.clone()),
            qualification: QualificationRule::new(&config.qualification),
            calculator: ScoreCalculator::new(config),
        }
    }

    pub fn calculator(&self) -> &ScoreCalculator {
        &self.calculator
    }

    pub fn grades(&self) -> &GradeMapper {
        &self.grades
    }

    pub fn qualification(&self) -> &QualificationRule {
        &self.qualification
    }

    pub fn grade(&self, score: u32) -> Grade {
        self.grades.grade(score)
    }

    pub fn evaluate(&self, lead: &Lead, conversations: &[Conversation]) -> Result<Evaluation> {
        let breakdown = self.calculator.calculate(lead, conversations)?;
        let grade = self.grades.grade(breakdown.total);
        let newly_qualified = self
            .qualification
            .should_qualify(breakdown.total, lead.is_qualified);
        let status_change = (newly_qualified && lead.status.is_pre_qualification())
            .then_some(LeadStatus::Qualified);

        Ok(Evaluation {
            breakdown,
            grade,
            newly_qualified,
            status_change,
        })
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(Arc::new(ScoringConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lead_scoring_core::{LeadId, Outcome};

    fn hot_lead() -> (Lead, Vec<Conversation>) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut lead = Lead::new(LeadId::from("hot"), "Grace", "grace@example.com", now);
        lead.budget = Some("$10,000+".into());
        lead.timeline = Some("immediate".into());
        let convs = (0..5)
            .map(|_| Conversation::new(lead.id.clone(), now).with_outcome(Outcome::BookedCall))
            .collect();
        (lead, convs)
    }

    #[test]
    fn test_hot_lead_qualifies_and_promotes() {
        let engine = ScoringEngine::default();
        let (lead, convs) = hot_lead();

        let eval = engine.evaluate(&lead, &convs).unwrap();
        assert!(eval.breakdown.total >= 70);
        assert!(eval.newly_qualified);
        assert_eq!(eval.status_change, Some(LeadStatus::Qualified));

        let now = Utc::now();
        let update = eval.to_update(now);
        assert_eq!(update.score, eval.breakdown.total);
        assert_eq!(update.qualified_at, Some(now));
    }

    #[test]
    fn test_qualified_lead_does_not_refire() {
        let engine = ScoringEngine::default();
        let (mut lead, convs) = hot_lead();
        lead.is_qualified = true;
        lead.status = LeadStatus::Qualified;

        let eval = engine.evaluate(&lead, &convs).unwrap();
        assert!(!eval.newly_qualified);
        assert_eq!(eval.status_change, None);
        assert_eq!(eval.to_update(Utc::now()).qualified_at, None);
    }

    #[test]
    fn test_late_stage_status_is_kept() {
        let engine = ScoringEngine::default();
        let (mut lead, convs) = hot_lead();
        lead.status = LeadStatus::Negotiating;

        let eval = engine.evaluate(&lead, &convs).unwrap();
        assert!(eval.newly_qualified);
        assert_eq!(eval.status_change, None);
    }
}
