//! Shared fixtures for service-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

use lead_scoring_config::EngineConfig;
use lead_scoring_core::{
    Clock, Conversation, ConversationStore, Error, FixedClock, Lead, LeadId, LeadStatus, LeadStore,
    LeadUpdate, Outcome, Result, ScoreUpdate,
};
use lead_scoring_engine::{ScoringEngine, ScoringService};
use lead_scoring_persistence::{InMemoryConversationStore, InMemoryLeadStore};

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn lead(id: &str) -> Lead {
    Lead::new(LeadId::from(id), "Test Lead", "lead@example.com", start())
}

pub fn scored_lead(id: &str, score: u32, scored_at: DateTime<Utc>) -> Lead {
    let mut lead = lead(id);
    lead.score = score;
    lead.last_scored_at = Some(scored_at);
    lead
}

/// $10k+, immediate, five booked calls
pub fn hot_lead(id: &str) -> (Lead, Vec<Conversation>) {
    let mut lead = lead(id);
    lead.budget = Some("$10,000+".into());
    lead.timeline = Some("immediate".into());
    let conversations = (0..5)
        .map(|i| {
            Conversation::new(lead.id.clone(), start() + Duration::minutes(i))
                .with_outcome(Outcome::BookedCall)
                .with_duration(600)
        })
        .collect();
    (lead, conversations)
}

/// Lead store that fails writes for chosen leads
pub struct FlakyLeadStore {
    inner: InMemoryLeadStore,
    fail_saves: Mutex<HashSet<LeadId>>,
    cancel_on_save: Option<watch::Sender<bool>>,
    status_edit_before_save: Mutex<Option<LeadStatus>>,
}

impl FlakyLeadStore {
    pub fn new(inner: InMemoryLeadStore) -> Self {
        Self {
            inner,
            fail_saves: Mutex::new(HashSet::new()),
            cancel_on_save: None,
            status_edit_before_save: Mutex::new(None),
        }
    }

    pub fn fail_save_for(self, id: &str) -> Self {
        self.fail_saves.lock().insert(LeadId::from(id));
        self
    }

    /// Move the lead to `status` between the engine's read and its score write
    pub fn edit_status_before_save(self, status: LeadStatus) -> Self {
        *self.status_edit_before_save.lock() = Some(status);
        self
    }

    /// Flip the cancellation signal during the first successful save
    pub fn cancel_after_first_save(mut self, tx: watch::Sender<bool>) -> Self {
        self.cancel_on_save = Some(tx);
        self
    }
}

#[async_trait]
impl LeadStore for FlakyLeadStore {
    async fn insert(&self, lead: Lead) -> Result<()> {
        self.inner.insert(lead).await
    }

    async fn get(&self, id: &LeadId) -> Result<Option<Lead>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Lead>> {
        self.inner.list().await
    }

    async fn update(&self, id: &LeadId, update: LeadUpdate, now: DateTime<Utc>) -> Result<Lead> {
        self.inner.update(id, update, now).await
    }

    async fn save_score(&self, id: &LeadId, update: &ScoreUpdate) -> Result<Lead> {
        if self.fail_saves.lock().contains(id) {
            return Err(Error::Persistence(format!("write rejected for {}", id)));
        }
        let edit = self.status_edit_before_save.lock().take();
        if let Some(status) = edit {
            let update_status = LeadUpdate {
                status: Some(status),
                ..Default::default()
            };
            self.inner.update(id, update_status, update.scored_at).await?;
        }
        let saved = self.inner.save_score(id, update).await?;
        if let Some(tx) = &self.cancel_on_save {
            tx.send_replace(true);
        }
        Ok(saved)
    }

    async fn delete(&self, id: &LeadId) -> Result<bool> {
        self.inner.delete(id).await
    }
}

pub struct Harness {
    pub service: ScoringService,
    pub leads: Arc<dyn LeadStore>,
    pub conversations: Arc<InMemoryConversationStore>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_lead_store(Arc::new(InMemoryLeadStore::new()), EngineConfig::default())
    }

    pub fn with_lead_store(leads: Arc<dyn LeadStore>, config: EngineConfig) -> Self {
        let conversations = Arc::new(InMemoryConversationStore::new());
        let clock = Arc::new(FixedClock::new(start()));
        let service = ScoringService::new(
            leads.clone(),
            conversations.clone(),
            clock.clone(),
            Arc::new(ScoringEngine::default()),
            config,
        );
        Self {
            service,
            leads,
            conversations,
            clock,
        }
    }

    pub async fn add(&self, lead: Lead, conversations: Vec<Conversation>) {
        self.leads.insert(lead).await.unwrap();
        for c in conversations {
            self.conversations.insert(c).await.unwrap();
        }
    }

    pub async fn add_conversation(&self, conversation: Conversation) {
        self.conversations.insert(conversation).await.unwrap();
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn stored(&self, id: &str) -> Lead {
        self.leads.get(&LeadId::from(id)).await.unwrap().unwrap()
    }
}
