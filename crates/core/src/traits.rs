//! Store traits consumed by the engine

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::conversation::Conversation;
use crate::lead::{Lead, LeadId, LeadUpdate};
use crate::score::ScoreUpdate;
use crate::Result;

/// Lead storage
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert(&self, lead: Lead) -> Result<()>;

    async fn get(&self, id: &LeadId) -> Result<Option<Lead>>;

    async fn list(&self) -> Result<Vec<Lead>>;

    /// Apply a typed profile/status update
    async fn update(&self, id: &LeadId, update: LeadUpdate, now: DateTime<Utc>) -> Result<Lead>;

    /// Write every field of `update` together or none of them.
    ///
    /// Returns `Error::NotFound` if the lead no longer exists.
    async fn save_score(&self, id: &LeadId, update: &ScoreUpdate) -> Result<Lead>;

    async fn delete(&self, id: &LeadId) -> Result<bool>;
}

/// Conversation storage
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn insert(&self, conversation: Conversation) -> Result<()>;

    /// All conversations for a lead, oldest first
    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Conversation>>;

    /// Cascade for lead deletion
    async fn delete_for_lead(&self, lead_id: &LeadId) -> Result<usize>;
}
