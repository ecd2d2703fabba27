//! Lead Scoring Engine
//!
//! Components, leaves first:
//! - [`ScoreCalculator`]: pure mapping from a lead and its conversations to a
//!   [`ScoreBreakdown`](lead_scoring_core::ScoreBreakdown)
//! - [`GradeMapper`] and [`QualificationRule`]: score to grade, score to
//!   "qualify now"
//! - [`StalenessDetector`]: which stored scores are outdated
//! - [`ScoringService`]: single-lead and batch recompute against the stores
//!
//! Weights, tiers and thresholds come from
//! [`ScoringConfig`](lead_scoring_config::ScoringConfig).

pub mod batch;
pub mod calculator;
pub mod evaluation;
pub mod grade;
pub mod qualification;
pub mod service;
pub mod staleness;

pub use batch::{BatchError, BatchRequest, BatchResult};
pub use calculator::ScoreCalculator;
pub use evaluation::{Evaluation, ScoringEngine};
pub use grade::GradeMapper;
pub use qualification::QualificationRule;
pub use service::{BatchStats, GradeCounts, RecomputeOutcome, ScoreReport, ScoringService};
pub use staleness::StalenessDetector;
