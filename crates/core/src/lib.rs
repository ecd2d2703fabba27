//! Core types and traits for the lead scoring engine
//!
//! This crate provides the types shared by every other crate:
//! - Lead and conversation records
//! - Score breakdown, grades and the atomic score update
//! - Store traits for leads and conversations
//! - Clock abstraction so scoring never reads ambient time
//! - Error types

pub mod clock;
pub mod conversation;
pub mod error;
pub mod lead;
pub mod score;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use conversation::{Conversation, NewConversation, Outcome, Sentiment};
pub use error::{Error, Result};
pub use lead::{Lead, LeadId, LeadStatus, LeadUpdate, NewLead};
pub use score::{Grade, ScoreBreakdown, ScoreUpdate, MAX_SCORE, MIN_SCORE};
pub use traits::{ConversationStore, LeadStore};
