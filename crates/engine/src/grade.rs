//! Grade Mapper
//!
//! Partitions 0..=100 into contiguous, non-overlapping grade bands:
//! `[a, 100] -> A`, `[b, a) -> B`, `[c, b) -> C`, `[d, c) -> D`, `[0, d) -> F`.
//! Scores above 100 are treated as 100.

use lead_scoring_config::GradeThresholds;
use lead_scoring_core::{Grade, MAX_SCORE};

#[derive(Debug, Clone)]
pub struct GradeMapper {
    thresholds: GradeThresholds,
}

impl GradeMapper {
    pub fn new(thresholds: GradeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn grade(&self, score: u32) -> Grade {
        let score = score.min(MAX_SCORE);
        let t = &self.thresholds;
        if score >= t.a {
            Grade::A
        } else if score >= t.b {
            Grade::B
        } else if score >= t.c {
            Grade::C
        } else if score >= t.d {
            Grade::D
        } else {
            Grade::F
        }
    }

    /// Inclusive score range covered by `grade`, `None` when no score maps to it
    pub fn range(&self, grade: Grade) -> Option<(u32, u32)> {
        let t = &self.thresholds;
        let (low, upper) = match grade {
            Grade::A => (t.a, MAX_SCORE + 1),
            Grade::B => (t.b, t.a),
            Grade::C => (t.c, t.b),
            Grade::D => (t.d, t.c),
            Grade::F => (0, t.d),
        };
        let high = upper.checked_sub(1)?.min(MAX_SCORE);
        (low <= high).then_some((low, high))
    }
}

impl Default for GradeMapper {
    fn default() -> Self {
        Self::new(GradeThresholds::default())
    }
}
