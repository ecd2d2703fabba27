//! Auto-Qualification Rule
//!
//! Fires once: a lead that is already qualified never qualifies again, and
//! there is no de-qualification path.

use lead_scoring_config::QualificationConfig;

#[derive(Debug, Clone)]
pub struct QualificationRule {
    threshold: u32,
}

impl QualificationRule {
    pub fn new(config: &QualificationConfig) -> Self {
        Self {
            threshold: config.threshold,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Should this recompute qualify the lead now?
    pub fn should_qualify(&self, score: u32, already_qualified: bool) -> bool {
        !already_qualified && score >= self.threshold
    }
}

impl Default for QualificationRule {
    fn default() -> Self {
        Self::new(&QualificationConfig::default())
    }
}
