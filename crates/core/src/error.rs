//! Error taxonomy shared by the engine, stores and transports

use thiserror::Error;

use crate::lead::LeadId;

/// Lead scoring errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Referenced lead does not exist (or vanished mid-batch)
    #[error("Lead not found: {lead_id}")]
    NotFound { lead_id: LeadId },

    /// Calculator rejected its input; nothing is persisted
    #[error("Score computation failed for lead {lead_id}: {reason}")]
    Computation { lead_id: LeadId, reason: String },

    /// Storage read or write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    pub fn not_found(lead_id: &LeadId) -> Self {
        Self::NotFound {
            lead_id: lead_id.clone(),
        }
    }

    /// Stable machine-readable kind, used in batch error entries and HTTP bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Computation { .. } => "computation_error",
            Self::Persistence(_) => "persistence_error",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
