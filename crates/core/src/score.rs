//! Score breakdown, grades and the atomic score update

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lead::{Lead, LeadStatus};

pub const MIN_SCORE: u32 = 0;
pub const MAX_SCORE: u32 = 100;

/// Points per category from one scoring run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Budget fit (0-25)
    pub budget: u32,
    /// Timeline urgency (0-20)
    pub timeline: u32,
    /// Conversation engagement (0-25)
    pub engagement: u32,
    /// Intent signals (0-20)
    pub intent: u32,
    /// Profile completeness (0-10)
    pub completeness: u32,
    /// Negative signals (<= 0)
    pub penalty: i32,
    /// Clamped sum, always within [MIN_SCORE, MAX_SCORE]
    pub total: u32,
}

impl ScoreBreakdown {
    /// Sum of categories plus penalty, clamped to the valid range
    pub fn clamped_total(&self) -> u32 {
        let raw = (self.budget + self.timeline + self.engagement + self.intent + self.completeness)
            as i64
            + self.penalty as i64;
        raw.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u32
    }
}

/// Coarse letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Best to worst
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    /// Sales-floor label
    pub fn temperature(&self) -> &'static str {
        match self {
            Self::A => "hot",
            Self::B => "warm",
            Self::C => "lukewarm",
            Self::D => "cool",
            Self::F => "cold",
        }
    }
}

/// The tuple written by one recompute. Stores apply it all-or-nothing.
///
/// There is no way to express `is_qualified = false` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub scored_at: DateTime<Utc>,
    /// Set when this recompute newly qualified the lead
    pub qualified_at: Option<DateTime<Utc>>,
    /// Status promotion performed together with qualification. Applied only
    /// while the stored status is still NEW or CONTACTED.
    pub status: Option<LeadStatus>,
}

impl ScoreUpdate {
    /// Apply to an in-memory record. Callers hold whatever lock makes this atomic.
    pub fn apply_to(&self, lead: &mut Lead) {
        lead.score = self.score;
        lead.score_breakdown = Some(self.breakdown);
        lead.last_scored_at = Some(self.scored_at);
        if let Some(at) = self.qualified_at {
            if !lead.is_qualified {
                lead.is_qualified = true;
                lead.qualified_at = Some(at);
            }
        }
        if let Some(status) = self.status {
            if lead.status.is_pre_qualification() {
                lead.status = status;
            }
        }
        lead.updated_at = self.scored_at;
    }
}
