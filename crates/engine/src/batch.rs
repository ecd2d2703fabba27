//! Batch recompute request and result types

use serde::{Deserialize, Serialize};

use lead_scoring_core::{Error, LeadId, Result};

/// Largest accepted `staleDays`
pub const MAX_STALE_DAYS: u32 = 365;

/// Which leads to recompute
///
/// - `lead_ids` set: exactly those ids (deduplicated), optionally narrowed to
///   the stale ones when `only_stale` is set
/// - `lead_ids` unset, `only_stale`: every lead the staleness detector selects
/// - neither: every lead
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BatchRequest {
    #[serde(default)]
    pub lead_ids: Option<Vec<LeadId>>,
    #[serde(default)]
    pub only_stale: bool,
    #[serde(default)]
    pub stale_days: Option<u32>,
    /// Process at most this many of the resolved targets
    #[serde(default)]
    pub limit: Option<usize>,
}

impl BatchRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn stale(days: u32) -> Self {
        Self {
            only_stale: true,
            stale_days: Some(days),
            ..Default::default()
        }
    }

    pub fn for_ids(ids: impl IntoIterator<Item = LeadId>) -> Self {
        Self {
            lead_ids: Some(ids.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn validate(&self, max_batch_size: usize) -> Result<()> {
        if let Some(days) = self.stale_days {
            if !(1..=MAX_STALE_DAYS).contains(&days) {
                return Err(Error::InvalidRequest(format!(
                    "staleDays must be between 1 and {}, got {}",
                    MAX_STALE_DAYS, days
                )));
            }
        }

        if let Some(ids) = &self.lead_ids {
            if ids.len() > max_batch_size {
                return Err(Error::InvalidRequest(format!(
                    "leadIds has {} entries, maximum is {}",
                    ids.len(),
                    max_batch_size
                )));
            }
            if let Some(blank) = ids.iter().find(|id| id.as_str().trim().is_empty()) {
                return Err(Error::InvalidRequest(format!(
                    "leadIds contains an empty id: {:?}",
                    blank.as_str()
                )));
            }
        }

        if self.limit == Some(0) {
            return Err(Error::InvalidRequest("limit must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// One failed lead in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    pub lead_id: LeadId,
    pub kind: String,
    pub message: String,
}

impl BatchError {
    pub fn new(lead_id: LeadId, error: &Error) -> Self {
        Self {
            lead_id,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Aggregate outcome. `processed == updated + errors.len()` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub processed: usize,
    pub updated: usize,
    pub errors: Vec<BatchError>,
    /// Leads this batch newly qualified
    pub qualified: usize,
    /// Stopped early by a cancellation signal
    pub cancelled: bool,
}

impl BatchResult {
    pub fn record_success(&mut self, auto_qualified: bool) {
        self.processed += 1;
        self.updated += 1;
        if auto_qualified {
            self.qualified += 1;
        }
    }

    pub fn record_failure(&mut self, lead_id: LeadId, error: &Error) {
        self.processed += 1;
        self.errors.push(BatchError::new(lead_id, error));
    }

    /// Errors ordered by lead id so results are reproducible under concurrency
    pub fn finish(mut self) -> Self {
        self.errors.sort_by(|a, b| a.lead_id.cmp(&b.lead_id));
        debug_assert_eq!(self.processed, self.updated + self.errors.len());
        self
    }
}
