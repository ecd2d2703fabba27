//! Scoring service: the four operations exposed to transports
//!
//! - `get_score` - stored score plus a fresh, unpersisted breakdown
//! - `recompute_score` - recompute and persist one lead
//! - `batch_recompute` - recompute many leads with per-lead failure isolation
//! - `batch_stats` - read-only aggregates
//!
//! Leads and conversations are always fetched fresh from the stores, never
//! cached, so concurrent workers never act on stale copies.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use lead_scoring_config::EngineConfig;
use lead_scoring_core::{
    Clock, ConversationStore, Error, Grade, Lead, LeadId, LeadStatus, LeadStore, Result,
    ScoreBreakdown,
};

use crate::{BatchRequest, BatchResult, ScoringEngine, StalenessDetector};

/// Response for `get_score`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub lead_id: LeadId,
    /// Stored score
    pub score: u32,
    /// Grade of the stored score
    pub grade: Grade,
    pub is_qualified: bool,
    pub qualified_at: Option<DateTime<Utc>>,
    pub last_scored_at: Option<DateTime<Utc>>,
    /// Freshly computed, not persisted
    pub breakdown: ScoreBreakdown,
    pub needs_update: bool,
}

/// Response for `recompute_score`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeOutcome {
    pub lead_id: LeadId,
    pub score: u32,
    pub previous_score: u32,
    pub grade: Grade,
    pub previous_grade: Grade,
    pub breakdown: ScoreBreakdown,
    pub last_scored_at: DateTime<Utc>,
    pub is_qualified: bool,
    pub qualified_at: Option<DateTime<Utc>>,
    pub status: LeadStatus,
    pub status_changed: bool,
    pub auto_qualified: bool,
}

/// Lead counts per grade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct GradeCounts {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
    pub f: usize,
}

impl GradeCounts {
    fn add(&mut self, grade: Grade) {
        match grade {
            Grade::A => self.a += 1,
            Grade::B => self.b += 1,
            Grade::C => self.c += 1,
            Grade::D => self.d += 1,
            Grade::F => self.f += 1,
        }
    }

    pub fn get(&self, grade: Grade) -> usize {
        match grade {
            Grade::A => self.a,
            Grade::B => self.b,
            Grade::C => self.c,
            Grade::D => self.d,
            Grade::F => self.f,
        }
    }
}

/// Response for `batch_stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total_leads: usize,
    pub by_grade: GradeCounts,
    pub stale: usize,
    pub fresh: usize,
    pub unscored: usize,
    pub qualified: usize,
    pub average_score: f64,
    pub stale_days: u32,
}

pub struct ScoringService {
    leads: Arc<dyn LeadStore>,
    conversations: Arc<dyn ConversationStore>,
    clock: Arc<dyn Clock>,
    engine: Arc<ScoringEngine>,
    config: EngineConfig,
}

impl ScoringService {
    pub fn new(
        leads: Arc<dyn LeadStore>,
        conversations: Arc<dyn ConversationStore>,
        clock: Arc<dyn Clock>,
        engine: Arc<ScoringEngine>,
        config: EngineConfig,
    ) -> Self {
        Self {
            leads,
            conversations,
            clock,
            engine,
            config,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn leads(&self) -> &Arc<dyn LeadStore> {
        &self.leads
    }

    pub fn conversations(&self) -> &Arc<dyn ConversationStore> {
        &self.conversations
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn default_detector(&self) -> StalenessDetector {
        StalenessDetector::from_days(self.config.default_stale_days)
    }

    async fn load(&self, id: &LeadId) -> Result<Lead> {
        self.leads.get(id).await?.ok_or_else(|| Error::not_found(id))
    }

    /// Stored score, grade and qualification plus a fresh breakdown
    pub async fn get_score(&self, id: &LeadId) -> Result<ScoreReport> {
        let lead = self.load(id).await?;
        let conversations = self.conversations.list_for_lead(id).await?;
        let breakdown = self.engine.calculator().calculate(&lead, &conversations)?;
        let needs_update = self.default_detector().is_stale(&lead, self.clock.now());

        Ok(ScoreReport {
            lead_id: lead.id.clone(),
            score: lead.score,
            grade: self.engine.grade(lead.score),
            is_qualified: lead.is_qualified,
            qualified_at: lead.qualified_at,
            last_scored_at: lead.last_scored_at,
            breakdown,
            needs_update,
        })
    }

    /// Recompute and persist one lead; errors surface to the caller.
    ///
    /// Batch workers go through here too, so recompute metrics count every lead.
    pub async fn recompute_score(&self, id: &LeadId) -> Result<RecomputeOutcome> {
        let started = Instant::now();
        let result = self.recompute(id).await;
        match &result {
            Ok(outcome) => record_recompute("ok", outcome.auto_qualified, started.elapsed()),
            Err(e) => record_recompute(e.kind(), false, started.elapsed()),
        }
        result
    }

    async fn recompute(&self, id: &LeadId) -> Result<RecomputeOutcome> {
        let lead = self.load(id).await?;
        let conversations = self.conversations.list_for_lead(id).await?;
        let evaluation = self.engine.evaluate(&lead, &conversations)?;

        let now = self.clock.now();
        let update = evaluation.to_update(now);
        let saved = self.leads.save_score(id, &update).await?;

        if evaluation.newly_qualified {
            tracing::info!(
                lead_id = %id,
                score = update.score,
                grade = evaluation.grade.as_str(),
                "Lead auto-qualified"
            );
        } else {
            tracing::debug!(
                lead_id = %id,
                previous = lead.score,
                score = update.score,
                "Lead rescored"
            );
        }

        Ok(RecomputeOutcome {
            lead_id: saved.id.clone(),
            score: saved.score,
            previous_score: lead.score,
            grade: evaluation.grade,
            previous_grade: self.engine.grade(lead.score),
            breakdown: evaluation.breakdown,
            last_scored_at: now,
            is_qualified: saved.is_qualified,
            qualified_at: saved.qualified_at,
            status: saved.status,
            // Only our own promotion counts; a concurrent edit may have moved it
            status_changed: update.status == Some(saved.status) && saved.status != lead.status,
            auto_qualified: evaluation.newly_qualified,
        })
    }

    /// Recompute every resolved target; individual failures are collected
    pub async fn batch_recompute(&self, request: BatchRequest) -> Result<BatchResult> {
        let (_tx, cancel) = watch::channel(false);
        self.batch_recompute_with_cancel(request, cancel).await
    }

    /// As [`batch_recompute`](Self::batch_recompute), stopping between leads
    /// once `cancel` reads `true`. Leads already written stay written.
    pub async fn batch_recompute_with_cancel(
        &self,
        request: BatchRequest,
        cancel: watch::Receiver<bool>,
    ) -> Result<BatchResult> {
        request.validate(self.config.max_batch_size)?;

        let mut targets = self.resolve_targets(&request).await?;
        if let Some(limit) = request.limit {
            targets.truncate(limit);
        }

        tracing::info!(
            targets = targets.len(),
            only_stale = request.only_stale,
            explicit = request.lead_ids.is_some(),
            "Starting batch recompute"
        );

        let target_count = targets.len();
        let concurrency = self.config.batch_concurrency.max(1);
        let outcomes: Vec<(LeadId, Result<RecomputeOutcome>)> = stream::iter(targets)
            .take_while(|_| {
                let stop = *cancel.borrow();
                async move { !stop }
            })
            .map(|id| async move {
                let outcome = self.recompute_score(&id).await;
                (id, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // Cancelled only when the signal actually left targets untouched
        let mut result = BatchResult {
            cancelled: outcomes.len() < target_count,
            ..Default::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(outcome) => result.record_success(outcome.auto_qualified),
                Err(e) => {
                    tracing::warn!(lead_id = %id, error = %e, "Batch recompute failed for lead");
                    result.record_failure(id, &e);
                }
            }
        }
        let result = result.finish();

        tracing::info!(
            processed = result.processed,
            updated = result.updated,
            qualified = result.qualified,
            errors = result.errors.len(),
            cancelled = result.cancelled,
            "Batch recompute finished"
        );

        Ok(result)
    }

    async fn resolve_targets(&self, request: &BatchRequest) -> Result<Vec<LeadId>> {
        let detector = request
            .stale_days
            .map(StalenessDetector::from_days)
            .unwrap_or_else(|| self.default_detector());
        let now = self.clock.now();

        match &request.lead_ids {
            Some(ids) => {
                let mut ids = ids.clone();
                ids.sort();
                ids.dedup();

                if !request.only_stale {
                    return Ok(ids);
                }

                let mut targets = Vec::with_capacity(ids.len());
                for id in ids {
                    // Missing ids stay in the target set so they are reported
                    match self.leads.get(&id).await? {
                        Some(lead) if !detector.is_stale(&lead, now) => {}
                        _ => targets.push(id),
                    }
                }
                Ok(targets)
            }
            None => {
                let leads = self.leads.list().await?;
                if request.only_stale {
                    Ok(detector
                        .stale_leads(&leads, now)
                        .into_iter()
                        .map(|l| l.id.clone())
                        .collect())
                } else {
                    let mut ids: Vec<_> = leads.into_iter().map(|l| l.id).collect();
                    ids.sort();
                    Ok(ids)
                }
            }
        }
    }

    /// Aggregates over stored scores; nothing is recomputed or written
    pub async fn batch_stats(&self) -> Result<BatchStats> {
        let leads = self.leads.list().await?;
        let detector = self.default_detector();
        let now = self.clock.now();

        let mut by_grade = GradeCounts::default();
        let mut stale = 0;
        let mut unscored = 0;
        let mut qualified = 0;
        let mut score_sum: u64 = 0;

        for lead in &leads {
            by_grade.add(self.engine.grade(lead.score));
            if detector.is_stale(lead, now) {
                stale += 1;
            }
            if !lead.is_scored() {
                unscored += 1;
            }
            if lead.is_qualified {
                qualified += 1;
            }
            score_sum += lead.score as u64;
        }

        let total_leads = leads.len();
        let average_score = if total_leads == 0 {
            0.0
        } else {
            ((score_sum as f64 / total_leads as f64) * 100.0).round() / 100.0
        };

        Ok(BatchStats {
            total_leads,
            by_grade,
            stale,
            fresh: total_leads - stale,
            unscored,
            qualified,
            average_score,
            stale_days: self.config.default_stale_days,
        })
    }
}

fn record_recompute(outcome: &'static str, auto_qualified: bool, latency: Duration) {
    metrics::counter!("lead_scoring_recompute_total", "outcome" => outcome).increment(1);
    metrics::histogram!("lead_scoring_recompute_latency_ms").record(latency.as_secs_f64() * 1000.0);
    if auto_qualified {
        metrics::counter!("lead_scoring_qualified_total").increment(1);
    }
}
