//! Lead Scoring Server
//!
//! HTTP endpoints for scoring, batch recompute, stats and lead intake.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_batch};
pub use state::AppState;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use lead_scoring_core::Error as ScoringError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Lead not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl ServerError {
    fn kind(&self) -> &'static str {
        match self {
            ServerError::NotFound(_) => "not_found",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Computation(_) => "computation_error",
            ServerError::Persistence(_) => "persistence_error",
        }
    }
}

impl From<ScoringError> for ServerError {
    fn from(err: ScoringError) -> Self {
        match &err {
            ScoringError::NotFound { lead_id } => ServerError::NotFound(lead_id.to_string()),
            ScoringError::InvalidRequest(msg) => ServerError::InvalidRequest(msg.clone()),
            ScoringError::Computation { .. } => ServerError::Computation(err.to_string()),
            ScoringError::Persistence(msg) => ServerError::Persistence(msg.clone()),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Computation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.kind(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
