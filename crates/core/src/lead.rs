//! Lead records and the typed update request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::score::ScoreBreakdown;

/// Lead identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random id for newly created leads
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LeadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LeadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sales pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    ProposalSent,
    Negotiating,
    Won,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Contacted => "CONTACTED",
            Self::Qualified => "QUALIFIED",
            Self::ProposalSent => "PROPOSAL_SENT",
            Self::Negotiating => "NEGOTIATING",
            Self::Won => "WON",
            Self::Lost => "LOST",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "CONTACTED" => Some(Self::Contacted),
            "QUALIFIED" => Some(Self::Qualified),
            "PROPOSAL_SENT" => Some(Self::ProposalSent),
            "NEGOTIATING" => Some(Self::Negotiating),
            "WON" => Some(Self::Won),
            "LOST" => Some(Self::Lost),
            _ => None,
        }
    }

    /// Stages that auto-qualification may promote to `Qualified`
    pub fn is_pre_qualification(&self) -> bool {
        matches!(self, Self::New | Self::Contacted)
    }
}

/// A prospective customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,

    // Profile
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub website: Option<String>,
    /// Free-form budget range as entered on the intake form, e.g. "$5,000-$10,000"
    pub budget: Option<String>,
    /// Budget the client has actually allocated, in dollars
    pub budget_allocated: Option<f64>,
    pub timeline: Option<String>,
    pub target_audience: Option<String>,
    pub product_description: Option<String>,
    #[serde(default)]
    pub social_platforms: Vec<String>,
    #[serde(default)]
    pub content_topics: Vec<String>,
    pub spokesperson_preferences: Option<String>,
    pub how_heard: Option<String>,
    pub biggest_challenge: Option<String>,
    pub questions: Option<String>,

    pub status: LeadStatus,

    // Scoring
    pub score: u32,
    pub score_breakdown: Option<ScoreBreakdown>,
    pub last_scored_at: Option<DateTime<Utc>>,
    pub is_qualified: bool,
    pub qualified_at: Option<DateTime<Utc>>,

    pub converted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Fresh, unscored lead in the NEW stage
    pub fn new(id: LeadId, full_name: &str, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: None,
            business_name: None,
            business_type: None,
            website: None,
            budget: None,
            budget_allocated: None,
            timeline: None,
            target_audience: None,
            product_description: None,
            social_platforms: Vec::new(),
            content_topics: Vec::new(),
            spokesperson_preferences: None,
            how_heard: None,
            biggest_challenge: None,
            questions: None,
            status: LeadStatus::New,
            score: 0,
            score_breakdown: None,
            last_scored_at: None,
            is_qualified: false,
            qualified_at: None,
            converted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a lead from an intake submission
    pub fn from_intake(intake: NewLead, now: DateTime<Utc>) -> Self {
        let mut lead = Self::new(LeadId::generate(), &intake.full_name, &intake.email, now);
        lead.apply_update(intake.profile, now);
        lead.status = LeadStatus::New;
        lead.converted_at = None;
        lead
    }

    pub fn is_scored(&self) -> bool {
        self.last_scored_at.is_some()
    }

    /// Apply a typed update. Empty strings clear optional text fields.
    ///
    /// Moving to `Won` stamps `converted_at` the first time only.
    pub fn apply_update(&mut self, update: LeadUpdate, now: DateTime<Utc>) {
        if let Some(v) = update.full_name {
            self.full_name = v;
        }
        if let Some(v) = update.email {
            self.email = v;
        }
        set_text(&mut self.phone, update.phone);
        set_text(&mut self.business_name, update.business_name);
        set_text(&mut self.business_type, update.business_type);
        set_text(&mut self.website, update.website);
        set_text(&mut self.budget, update.budget);
        if let Some(v) = update.budget_allocated {
            self.budget_allocated = (v > 0.0).then_some(v);
        }
        set_text(&mut self.timeline, update.timeline);
        set_text(&mut self.target_audience, update.target_audience);
        set_text(&mut self.product_description, update.product_description);
        if let Some(v) = update.social_platforms {
            self.social_platforms = v;
        }
        if let Some(v) = update.content_topics {
            self.content_topics = v;
        }
        set_text(
            &mut self.spokesperson_preferences,
            update.spokesperson_preferences,
        );
        set_text(&mut self.how_heard, update.how_heard);
        set_text(&mut self.biggest_challenge, update.biggest_challenge);
        set_text(&mut self.questions, update.questions);

        if let Some(status) = update.status {
            if status == LeadStatus::Won && self.converted_at.is_none() {
                self.converted_at = Some(now);
            }
            self.status = status;
        }

        self.updated_at = now;
    }
}

fn set_text(field: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        let trimmed = v.trim();
        *field = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}

/// Every field an admin or intake form may change.
///
/// Scoring fields are deliberately absent: only the engine writes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LeadUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub website: Option<String>,
    pub budget: Option<String>,
    pub budget_allocated: Option<f64>,
    pub timeline: Option<String>,
    pub target_audience: Option<String>,
    pub product_description: Option<String>,
    pub social_platforms: Option<Vec<String>>,
    pub content_topics: Option<Vec<String>>,
    pub spokesperson_preferences: Option<String>,
    pub how_heard: Option<String>,
    pub biggest_challenge: Option<String>,
    pub questions: Option<String>,
    pub status: Option<LeadStatus>,
}

/// Intake form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub full_name: String,
    pub email: String,
    #[serde(flatten)]
    pub profile: LeadUpdate,
}

impl NewLead {
    pub fn validate(&self) -> crate::Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(crate::Error::InvalidRequest(
                "fullName is required".to_string(),
            ));
        }
        if !self.email.contains('@') {
            return Err(crate::Error::InvalidRequest(format!(
                "invalid email: {}",
                self.email
            )));
        }
        Ok(())
    }
}
