//! Logged interactions with a lead

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lead::LeadId;

/// Sentiment classification of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Outcome classification of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    BookedCall,
    Interested,
    FollowUp,
    NotInterested,
    NoAnswer,
    #[serde(other)]
    Other,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookedCall => "booked_call",
            Self::Interested => "interested",
            Self::FollowUp => "follow_up",
            Self::NotInterested => "not_interested",
            Self::NoAnswer => "no_answer",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "booked_call" => Self::BookedCall,
            "interested" => Self::Interested,
            "follow_up" => Self::FollowUp,
            "not_interested" => Self::NotInterested,
            "no_answer" => Self::NoAnswer,
            _ => Self::Other,
        }
    }
}

/// Immutable interaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub lead_id: LeadId,
    pub created_at: DateTime<Utc>,
    pub duration_seconds: u32,
    pub sentiment: Option<Sentiment>,
    /// Intent label detected by the call analysis, e.g. "pricing"
    pub intent: Option<String>,
    pub outcome: Option<Outcome>,
    pub call_booked: bool,
}

impl Conversation {
    pub fn new(lead_id: LeadId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            created_at,
            duration_seconds: 0,
            sentiment: None,
            intent: None,
            outcome: None,
            call_booked: false,
        }
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_intent(mut self, intent: &str) -> Self {
        self.intent = Some(intent.to_string());
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Booked either through the outcome or the explicit flag
    pub fn is_booked(&self) -> bool {
        self.call_booked || self.outcome == Some(Outcome::BookedCall)
    }
}

/// Request body for logging a conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewConversation {
    #[serde(default)]
    pub duration_seconds: u32,
    pub sentiment: Option<Sentiment>,
    pub intent: Option<String>,
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub call_booked: bool,
}

impl NewConversation {
    pub fn into_conversation(self, lead_id: LeadId, now: DateTime<Utc>) -> Conversation {
        Conversation {
            duration_seconds: self.duration_seconds,
            sentiment: self.sentiment,
            intent: self.intent.filter(|i| !i.trim().is_empty()),
            outcome: self.outcome,
            call_booked: self.call_booked,
            ..Conversation::new(lead_id, now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_outcome_is_other() {
        let outcome: Outcome = serde_json::from_str(r#""voicemail""#).unwrap();
        assert_eq!(outcome, Outcome::Other);
        assert_eq!(Outcome::parse("booked_call"), Outcome::BookedCall);
    }

    #[test]
    fn test_is_booked() {
        let now = Utc::now();
        let by_outcome = Conversation::new(LeadId::from("l1"), now).with_outcome(Outcome::BookedCall);
        assert!(by_outcome.is_booked());

        let mut by_flag = Conversation::new(LeadId::from("l1"), now);
        by_flag.call_booked = true;
        assert!(by_flag.is_booked());

        assert!(!Conversation::new(LeadId::from("l1"), now).is_booked());
    }
}
