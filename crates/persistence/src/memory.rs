//! In-memory stores
//!
//! Every mutation happens under one write lock, so a score update is never
//! observed half-applied and concurrent writers to the same lead resolve as
//! last-writer-wins on the whole tuple.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use lead_scoring_core::{
    Conversation, ConversationStore, Error, Lead, LeadId, LeadStore, LeadUpdate, Result,
    ScoreUpdate,
};

#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<LeadId, Lead>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leads(leads: impl IntoIterator<Item = Lead>) -> Self {
        Self {
            leads: RwLock::new(leads.into_iter().map(|l| (l.id.clone(), l)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.leads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.read().is_empty()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn insert(&self, lead: Lead) -> Result<()> {
        let mut leads = self.leads.write();
        if leads.contains_key(&lead.id) {
            return Err(Error::InvalidRequest(format!(
                "lead {} already exists",
                lead.id
            )));
        }
        leads.insert(lead.id.clone(), lead);
        Ok(())
    }

    async fn get(&self, id: &LeadId) -> Result<Option<Lead>> {
        Ok(self.leads.read().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Lead>> {
        let mut leads: Vec<_> = self.leads.read().values().cloned().collect();
        leads.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(leads)
    }

    async fn update(&self, id: &LeadId, update: LeadUpdate, now: DateTime<Utc>) -> Result<Lead> {
        let mut leads = self.leads.write();
        let lead = leads.get_mut(id).ok_or_else(|| Error::not_found(id))?;
        lead.apply_update(update, now);
        Ok(lead.clone())
    }

    async fn save_score(&self, id: &LeadId, update: &ScoreUpdate) -> Result<Lead> {
        let mut leads = self.leads.write();
        let lead = leads.get_mut(id).ok_or_else(|| Error::not_found(id))?;
        update.apply_to(lead);
        Ok(lead.clone())
    }

    async fn delete(&self, id: &LeadId) -> Result<bool> {
        Ok(self.leads.write().remove(id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<LeadId, Vec<Conversation>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn insert(&self, conversation: Conversation) -> Result<()> {
        self.conversations
            .write()
            .entry(conversation.lead_id.clone())
            .or_default()
            .push(conversation);
        Ok(())
    }

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Conversation>> {
        let mut conversations = self
            .conversations
            .read()
            .get(lead_id)
            .cloned()
            .unwrap_or_default();
        conversations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(conversations)
    }

    async fn delete_for_lead(&self, lead_id: &LeadId) -> Result<usize> {
        Ok(self
            .conversations
            .write()
            .remove(lead_id)
            .map(|c| c.len())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lead_scoring_core::ScoreBreakdown;

    fn lead(id: &str) -> Lead {
        Lead::new(LeadId::from(id), "Test", "t@example.com", Utc::now())
    }

    #[tokio::test]
    async fn test_insert_get_list() {
        let store = InMemoryLeadStore::new();
        store.insert(lead("b")).await.unwrap();
        store.insert(lead("a")).await.unwrap();
        assert!(store.insert(lead("a")).await.is_err());

        assert!(store.get(&LeadId::from("a")).await.unwrap().is_some());
        assert!(store.get(&LeadId::from("zz")).await.unwrap().is_none());

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![LeadId::from("a"), LeadId::from("b")]);
    }

    #[tokio::test]
    async fn test_save_score_writes_all_fields() {
        let store = InMemoryLeadStore::with_leads([lead("a")]);
        let now = Utc::now();
        let update = ScoreUpdate {
            score: 75,
            breakdown: ScoreBreakdown {
                budget: 25,
                timeline: 20,
                engagement: 15,
                intent: 15,
                total: 75,
                ..Default::default()
            },
            scored_at: now,
            qualified_at: Some(now),
            status: Some(lead_scoring_core::LeadStatus::Qualified),
        };

        let saved = store.save_score(&LeadId::from("a"), &update).await.unwrap();
        assert_eq!(saved.score, 75);
        assert_eq!(saved.score_breakdown.map(|b| b.total), Some(75));
        assert_eq!(saved.last_scored_at, Some(now));
        assert!(saved.is_qualified);
        assert_eq!(saved.qualified_at, Some(now));
    }

    #[tokio::test]
    async fn test_save_score_missing_lead() {
        let store = InMemoryLeadStore::new();
        let update = ScoreUpdate {
            score: 0,
            breakdown: ScoreBreakdown::default(),
            scored_at: Utc::now(),
            qualified_at: None,
            status: None,
        };
        let err = store
            .save_score(&LeadId::from("gone"), &update)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_conversations_sorted_and_cascaded() {
        let store = InMemoryConversationStore::new();
        let id = LeadId::from("a");
        let now = Utc::now();
        store
            .insert(Conversation::new(id.clone(), now))
            .await
            .unwrap();
        store
            .insert(Conversation::new(id.clone(), now - Duration::hours(1)))
            .await
            .unwrap();

        let convs = store.list_for_lead(&id).await.unwrap();
        assert_eq!(convs.len(), 2);
        assert!(convs[0].created_at < convs[1].created_at);
        assert!(store.list_for_lead(&LeadId::from("b")).await.unwrap().is_empty());

        assert_eq!(store.delete_for_lead(&id).await.unwrap(), 2);
        assert!(store.list_for_lead(&id).await.unwrap().is_empty());
    }
}
