//! Staleness Detector
//!
//! A stored score is stale when it was never computed, or when it is strictly
//! older than `now - threshold`. A score exactly `threshold` old is fresh.

use chrono::{DateTime, Duration, Utc};

use lead_scoring_core::Lead;

#[derive(Debug, Clone, Copy)]
pub struct StalenessDetector {
    threshold: Duration,
}

impl StalenessDetector {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn from_days(days: u32) -> Self {
        Self::new(Duration::days(days as i64))
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn is_stale(&self, lead: &Lead, now: DateTime<Utc>) -> bool {
        match lead.last_scored_at {
            None => true,
            Some(scored_at) => scored_at < now - self.threshold,
        }
    }

    /// Stale subset, sorted by lead id
    pub fn stale_leads<'a>(&self, leads: &'a [Lead], now: DateTime<Utc>) -> Vec<&'a Lead> {
        let mut stale: Vec<_> = leads.iter().filter(|l| self.is_stale(l, now)).collect();
        stale.sort_by(|a, b| a.id.cmp(&b.id));
        stale
    }
}
