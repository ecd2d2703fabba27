//! Lead and conversation persistence using ScyllaDB

use crate::{PersistenceError, ScyllaClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::frame::response::result::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lead_scoring_core::{
    Conversation, ConversationStore, Error, Lead, LeadId, LeadStatus, LeadStore, LeadUpdate,
    Outcome, Result, ScoreBreakdown, ScoreUpdate, Sentiment,
};

const LEAD_COLUMNS: &str = "lead_id, profile_json, status, score, score_breakdown_json, \
     last_scored_at, is_qualified, qualified_at, converted_at, created_at, updated_at";

const CONVERSATION_COLUMNS: &str =
    "lead_id, created_at, conversation_id, duration_seconds, sentiment, intent, outcome, call_booked";

/// LWT guard for the auto-qualification status promotion
const PROMOTABLE_CONDITION: &str = "IF status IN ('NEW', 'CONTACTED')";

/// Profile fields stored as one JSON column
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileRecord {
    full_name: String,
    email: String,
    phone: Option<String>,
    business_name: Option<String>,
    business_type: Option<String>,
    website: Option<String>,
    budget: Option<String>,
    budget_allocated: Option<f64>,
    timeline: Option<String>,
    target_audience: Option<String>,
    product_description: Option<String>,
    #[serde(default)]
    social_platforms: Vec<String>,
    #[serde(default)]
    content_topics: Vec<String>,
    spokesperson_preferences: Option<String>,
    how_heard: Option<String>,
    biggest_challenge: Option<String>,
    questions: Option<String>,
}

impl From<&Lead> for ProfileRecord {
    fn from(lead: &Lead) -> Self {
        Self {
            full_name: lead.full_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            business_name: lead.business_name.clone(),
            business_type: lead.business_type.clone(),
            website: lead.website.clone(),
            budget: lead.budget.clone(),
            budget_allocated: lead.budget_allocated,
            timeline: lead.timeline.clone(),
            target_audience: lead.target_audience.clone(),
            product_description: lead.product_description.clone(),
            social_platforms: lead.social_platforms.clone(),
            content_topics: lead.content_topics.clone(),
            spokesperson_preferences: lead.spokesperson_preferences.clone(),
            how_heard: lead.how_heard.clone(),
            biggest_challenge: lead.biggest_challenge.clone(),
            questions: lead.questions.clone(),
        }
    }
}

fn millis(ts: Option<DateTime<Utc>>) -> Option<i64> {
    ts.map(|t| t.timestamp_millis())
}

fn from_millis(field: &str, value: i64) -> std::result::Result<DateTime<Utc>, PersistenceError> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| PersistenceError::InvalidData(format!("{} out of range: {}", field, value)))
}

fn from_millis_opt(
    field: &str,
    value: Option<i64>,
) -> std::result::Result<Option<DateTime<Utc>>, PersistenceError> {
    value.map(|v| from_millis(field, v)).transpose()
}

/// ScyllaDB implementation of the lead store
#[derive(Clone)]
pub struct ScyllaLeadStore {
    client: ScyllaClient,
}

impl ScyllaLeadStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    async fn insert_lead(&self, lead: &Lead) -> std::result::Result<bool, PersistenceError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS",
            self.client.leads_table(),
            LEAD_COLUMNS
        );

        let profile = serde_json::to_string(&ProfileRecord::from(lead))?;
        let breakdown = lead
            .score_breakdown
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.client
            .conditional(
                query,
                (
                    lead.id.as_str(),
                    profile,
                    lead.status.as_str(),
                    lead.score as i32,
                    breakdown,
                    millis(lead.last_scored_at),
                    lead.is_qualified,
                    millis(lead.qualified_at),
                    millis(lead.converted_at),
                    lead.created_at.timestamp_millis(),
                    lead.updated_at.timestamp_millis(),
                ),
            )
            .await
    }

    async fn fetch(&self, id: &LeadId) -> std::result::Result<Option<Lead>, PersistenceError> {
        let query = format!(
            "SELECT {} FROM {} WHERE lead_id = ?",
            LEAD_COLUMNS,
            self.client.leads_table()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (id.as_str(),))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(row_to_lead(row)?));
            }
        }

        Ok(None)
    }

    async fn fetch_all(&self) -> std::result::Result<Vec<Lead>, PersistenceError> {
        let query = format!("SELECT {} FROM {}", LEAD_COLUMNS, self.client.leads_table());
        let result = self.client.session().query_unpaged(query, &[]).await?;

        let mut leads = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                leads.push(row_to_lead(row)?);
            }
        }
        leads.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(leads)
    }

    /// Profile columns always; status and `converted_at` only when the edit
    /// changed the status, so a concurrent promotion is not written back over
    async fn write_profile(
        &self,
        lead: &Lead,
        status_edited: bool,
    ) -> std::result::Result<bool, PersistenceError> {
        let table = self.client.leads_table();
        let profile = serde_json::to_string(&ProfileRecord::from(lead))?;

        if status_edited {
            let query = format!(
                "UPDATE {} SET profile_json = ?, status = ?, converted_at = ?, updated_at = ?
                 WHERE lead_id = ? IF EXISTS",
                table
            );
            self.client
                .conditional(
                    query,
                    (
                        profile,
                        lead.status.as_str(),
                        millis(lead.converted_at),
                        lead.updated_at.timestamp_millis(),
                        lead.id.as_str(),
                    ),
                )
                .await
        } else {
            let query = format!(
                "UPDATE {} SET profile_json = ?, updated_at = ? WHERE lead_id = ? IF EXISTS",
                table
            );
            self.client
                .conditional(
                    query,
                    (profile, lead.updated_at.timestamp_millis(), lead.id.as_str()),
                )
                .await
        }
    }

    /// Score write for one lead.
    ///
    /// A status promotion is attempted only while the stored status is still
    /// NEW or CONTACTED; if that condition fails the scoring columns are
    /// written without it.
    async fn write_score(
        &self,
        id: &LeadId,
        update: &ScoreUpdate,
    ) -> std::result::Result<bool, PersistenceError> {
        if let Some(status) = update.status {
            if self
                .write_score_columns(id, update, Some(status), PROMOTABLE_CONDITION)
                .await?
            {
                return Ok(true);
            }
            tracing::debug!(lead_id = %id, "Status moved before promotion; scoring columns only");
        }
        self.write_score_columns(id, update, None, "IF EXISTS").await
    }

    /// One single-partition conditional UPDATE covering every scoring column
    async fn write_score_columns(
        &self,
        id: &LeadId,
        update: &ScoreUpdate,
        status: Option<LeadStatus>,
        condition: &str,
    ) -> std::result::Result<bool, PersistenceError> {
        let table = self.client.leads_table();
        let breakdown = serde_json::to_string(&update.breakdown)?;
        let scored_at = update.scored_at.timestamp_millis();
        let client = &self.client;

        match (update.qualified_at, status) {
            (Some(qualified_at), Some(status)) => {
                let query = format!(
                    "UPDATE {} SET score = ?, score_breakdown_json = ?, last_scored_at = ?,
                     updated_at = ?, is_qualified = true, qualified_at = ?, status = ?
                     WHERE lead_id = ? {}",
                    table, condition
                );
                client
                    .conditional(
                        query,
                        (
                            update.score as i32,
                            breakdown,
                            scored_at,
                            scored_at,
                            qualified_at.timestamp_millis(),
                            status.as_str(),
                            id.as_str(),
                        ),
                    )
                    .await
            }
            (Some(qualified_at), None) => {
                let query = format!(
                    "UPDATE {} SET score = ?, score_breakdown_json = ?, last_scored_at = ?,
                     updated_at = ?, is_qualified = true, qualified_at = ?
                     WHERE lead_id = ? {}",
                    table, condition
                );
                client
                    .conditional(
                        query,
                        (
                            update.score as i32,
                            breakdown,
                            scored_at,
                            scored_at,
                            qualified_at.timestamp_millis(),
                            id.as_str(),
                        ),
                    )
                    .await
            }
            (None, Some(status)) => {
                let query = format!(
                    "UPDATE {} SET score = ?, score_breakdown_json = ?, last_scored_at = ?,
                     updated_at = ?, status = ?
                     WHERE lead_id = ? {}",
                    table, condition
                );
                client
                    .conditional(
                        query,
                        (
                            update.score as i32,
                            breakdown,
                            scored_at,
                            scored_at,
                            status.as_str(),
                            id.as_str(),
                        ),
                    )
                    .await
            }
            (None, None) => {
                let query = format!(
                    "UPDATE {} SET score = ?, score_breakdown_json = ?, last_scored_at = ?,
                     updated_at = ?
                     WHERE lead_id = ? {}",
                    table, condition
                );
                client
                    .conditional(
                        query,
                        (
                            update.score as i32,
                            breakdown,
                            scored_at,
                            scored_at,
                            id.as_str(),
                        ),
                    )
                    .await
            }
        }
    }

    async fn remove(&self, id: &LeadId) -> std::result::Result<bool, PersistenceError> {
        let query = format!("DELETE FROM {} WHERE lead_id = ? IF EXISTS", self.client.leads_table());
        self.client.conditional(query, (id.as_str(),)).await
    }
}

fn row_to_lead(row: Row) -> std::result::Result<Lead, PersistenceError> {
    let (
        lead_id,
        profile_json,
        status,
        score,
        breakdown_json,
        last_scored_at,
        is_qualified,
        qualified_at,
        converted_at,
        created_at,
        updated_at,
    ): (
        String,
        Option<String>,
        Option<String>,
        Option<i32>,
        Option<String>,
        Option<i64>,
        Option<bool>,
        Option<i64>,
        Option<i64>,
        i64,
        i64,
    ) = row
        .into_typed()
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

    let profile: ProfileRecord = match profile_json {
        Some(json) => serde_json::from_str(&json)?,
        None => ProfileRecord::default(),
    };
    let score_breakdown: Option<ScoreBreakdown> =
        breakdown_json.map(|json| serde_json::from_str(&json)).transpose()?;
    let status = match status {
        Some(s) => LeadStatus::parse(&s)
            .ok_or_else(|| PersistenceError::InvalidData(format!("unknown lead status: {}", s)))?,
        None => LeadStatus::default(),
    };
    let score = score.unwrap_or(0);
    if score < 0 {
        return Err(PersistenceError::InvalidData(format!(
            "negative score {} for lead {}",
            score, lead_id
        )));
    }

    Ok(Lead {
        id: LeadId::new(lead_id),
        full_name: profile.full_name,
        email: profile.email,
        phone: profile.phone,
        business_name: profile.business_name,
        business_type: profile.business_type,
        website: profile.website,
        budget: profile.budget,
        budget_allocated: profile.budget_allocated,
        timeline: profile.timeline,
        target_audience: profile.target_audience,
        product_description: profile.product_description,
        social_platforms: profile.social_platforms,
        content_topics: profile.content_topics,
        spokesperson_preferences: profile.spokesperson_preferences,
        how_heard: profile.how_heard,
        biggest_challenge: profile.biggest_challenge,
        questions: profile.questions,
        status,
        score: score as u32,
        score_breakdown,
        last_scored_at: from_millis_opt("last_scored_at", last_scored_at)?,
        is_qualified: is_qualified.unwrap_or(false),
        qualified_at: from_millis_opt("qualified_at", qualified_at)?,
        converted_at: from_millis_opt("converted_at", converted_at)?,
        created_at: from_millis("created_at", created_at)?,
        updated_at: from_millis("updated_at", updated_at)?,
    })
}

#[async_trait]
impl LeadStore for ScyllaLeadStore {
    async fn insert(&self, lead: Lead) -> Result<()> {
        if !self.insert_lead(&lead).await? {
            return Err(Error::InvalidRequest(format!(
                "lead {} already exists",
                lead.id
            )));
        }
        tracing::info!(lead_id = %lead.id, "Lead created in ScyllaDB");
        Ok(())
    }

    async fn get(&self, id: &LeadId) -> Result<Option<Lead>> {
        Ok(self.fetch(id).await?)
    }

    async fn list(&self) -> Result<Vec<Lead>> {
        Ok(self.fetch_all().await?)
    }

    // Profile edits are read-modify-write; scoring columns are never touched here
    async fn update(&self, id: &LeadId, update: LeadUpdate, now: DateTime<Utc>) -> Result<Lead> {
        let mut lead = self.fetch(id).await?.ok_or_else(|| Error::not_found(id))?;
        let status_edited = update.status.is_some();
        lead.apply_update(update, now);
        if !self.write_profile(&lead, status_edited).await? {
            return Err(Error::not_found(id));
        }
        Ok(lead)
    }

    async fn save_score(&self, id: &LeadId, update: &ScoreUpdate) -> Result<Lead> {
        if !self.write_score(id, update).await? {
            return Err(Error::not_found(id));
        }
        tracing::debug!(lead_id = %id, score = update.score, "Score persisted");
        self.fetch(id).await?.ok_or_else(|| Error::not_found(id))
    }

    async fn delete(&self, id: &LeadId) -> Result<bool> {
        Ok(self.remove(id).await?)
    }
}

/// ScyllaDB implementation of the conversation store
#[derive(Clone)]
pub struct ScyllaConversationStore {
    client: ScyllaClient,
}

impl ScyllaConversationStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    async fn insert_conversation(
        &self,
        conversation: &Conversation,
    ) -> std::result::Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.conversations_table(),
            CONVERSATION_COLUMNS
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    conversation.lead_id.as_str(),
                    conversation.created_at.timestamp_millis(),
                    conversation.id,
                    conversation.duration_seconds.min(i32::MAX as u32) as i32,
                    conversation.sentiment.map(|s| s.as_str()),
                    &conversation.intent,
                    conversation.outcome.map(|o| o.as_str()),
                    conversation.call_booked,
                ),
            )
            .await?;

        Ok(())
    }

    async fn fetch_for_lead(
        &self,
        lead_id: &LeadId,
    ) -> std::result::Result<Vec<Conversation>, PersistenceError> {
        let query = format!(
            "SELECT {} FROM {} WHERE lead_id = ?",
            CONVERSATION_COLUMNS,
            self.client.conversations_table()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (lead_id.as_str(),))
            .await?;

        let mut conversations = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                conversations.push(row_to_conversation(row)?);
            }
        }
        Ok(conversations)
    }

    async fn remove_for_lead(&self, lead_id: &LeadId) -> std::result::Result<usize, PersistenceError> {
        let count = self.fetch_for_lead(lead_id).await?.len();
        let query = format!(
            "DELETE FROM {} WHERE lead_id = ?",
            self.client.conversations_table()
        );
        self.client
            .session()
            .query_unpaged(query, (lead_id.as_str(),))
            .await?;
        Ok(count)
    }
}

fn row_to_conversation(row: Row) -> std::result::Result<Conversation, PersistenceError> {
    let (lead_id, created_at, id, duration_seconds, sentiment, intent, outcome, call_booked): (
        String,
        i64,
        Uuid,
        Option<i32>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<bool>,
    ) = row
        .into_typed()
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

    Ok(Conversation {
        id,
        lead_id: LeadId::new(lead_id),
        created_at: from_millis("created_at", created_at)?,
        duration_seconds: duration_seconds.unwrap_or(0).max(0) as u32,
        sentiment: sentiment.as_deref().and_then(Sentiment::parse),
        intent,
        outcome: outcome.as_deref().map(Outcome::parse),
        call_booked: call_booked.unwrap_or(false),
    })
}

#[async_trait]
impl ConversationStore for ScyllaConversationStore {
    async fn insert(&self, conversation: Conversation) -> Result<()> {
        self.insert_conversation(&conversation).await?;
        tracing::debug!(
            lead_id = %conversation.lead_id,
            conversation_id = %conversation.id,
            "Conversation recorded"
        );
        Ok(())
    }

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Conversation>> {
        Ok(self.fetch_for_lead(lead_id).await?)
    }

    async fn delete_for_lead(&self, lead_id: &LeadId) -> Result<usize> {
        Ok(self.remove_for_lead(lead_id).await?)
    }
}
