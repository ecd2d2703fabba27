//! HTTP Endpoints
//!
//! REST API for lead scoring.

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lead_scoring_core::{Conversation, Lead, LeadId, LeadUpdate, NewConversation, NewLead};
use lead_scoring_engine::{BatchRequest, BatchResult, BatchStats, RecomputeOutcome, ScoreReport};

use crate::metrics::{self, metrics_handler};
use crate::state::AppState;
use crate::ServerError;

const LOCAL_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let (cors_layer, timeout) = {
        let config = state.get_config();
        (
            build_cors_layer(&config.server.cors_origins, config.server.cors_enabled),
            Duration::from_secs(config.server.timeout_seconds),
        )
    };

    Router::new()
        // Scoring
        .route("/api/leads/scores/batch", post(batch_recompute))
        .route("/api/leads/scores/stats", get(batch_stats))
        .route("/api/leads/:id/score", get(get_score).post(recompute_score))
        // Leads
        .route("/api/leads", post(create_lead))
        .route("/api/leads/:id", get(get_lead).patch(update_lead))
        .route("/api/leads/:id/conversations", post(log_conversation))
        // Operations
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/admin/reload-config", post(reload_config))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty or all invalid, allows localhost:3000 only
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let methods = [Method::GET, Method::POST, Method::PATCH, Method::OPTIONS];

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", LOCAL_ORIGIN);
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(LOCAL_ORIGIN))
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        .allow_headers(Any)
        .allow_credentials(true)
}

/// GET /api/leads/:id/score
async fn get_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreReport>, ServerError> {
    let report = state.scoring.get_score(&LeadId::new(id)).await?;
    Ok(Json(report))
}

/// POST /api/leads/:id/score
async fn recompute_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecomputeOutcome>, ServerError> {
    let outcome = state.scoring.recompute_score(&LeadId::new(id)).await?;
    Ok(Json(outcome))
}

/// POST /api/leads/scores/batch
///
/// Per-lead failures are reported in the body; only request validation
/// and store-wide failures produce a non-200 status.
async fn batch_recompute(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, ServerError> {
    let Json(request) = payload?;
    let result = state
        .scoring
        .batch_recompute_with_cancel(request, state.cancellation())
        .await?;

    metrics::record_batch(result.processed, result.errors.len());

    Ok(Json(result))
}

/// GET /api/leads/scores/stats
async fn batch_stats(State(state): State<AppState>) -> Result<Json<BatchStats>, ServerError> {
    Ok(Json(state.scoring.batch_stats().await?))
}

/// POST /api/leads
async fn create_lead(
    State(state): State<AppState>,
    payload: Result<Json<NewLead>, JsonRejection>,
) -> Result<(StatusCode, Json<Lead>), ServerError> {
    let Json(intake) = payload?;
    intake.validate()?;
    let lead = Lead::from_intake(intake, state.scoring.clock().now());
    state.scoring.leads().insert(lead.clone()).await?;

    tracing::info!(lead_id = %lead.id, "Lead created");
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/leads/:id
async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, ServerError> {
    let id = LeadId::new(id);
    let lead = state
        .scoring
        .leads()
        .get(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound(id.to_string()))?;
    Ok(Json(lead))
}

/// PATCH /api/leads/:id
async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<LeadUpdate>, JsonRejection>,
) -> Result<Json<Lead>, ServerError> {
    let Json(update) = payload?;
    let id = LeadId::new(id);
    let lead = state
        .scoring
        .leads()
        .update(&id, update, state.scoring.clock().now())
        .await?;

    tracing::info!(lead_id = %id, status = lead.status.as_str(), "Lead updated");
    Ok(Json(lead))
}

/// POST /api/leads/:id/conversations
async fn log_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewConversation>, JsonRejection>,
) -> Result<(StatusCode, Json<Conversation>), ServerError> {
    let Json(body) = payload?;
    let id = LeadId::new(id);
    if state.scoring.leads().get(&id).await?.is_none() {
        return Err(ServerError::NotFound(id.to_string()));
    }

    let conversation = body.into_conversation(id, state.scoring.clock().now());
    state
        .scoring
        .conversations()
        .insert(conversation.clone())
        .await?;

    tracing::debug!(
        lead_id = %conversation.lead_id,
        conversation_id = %conversation.id,
        "Conversation logged"
    );
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.get_config();
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment,
        "persistence": if config.persistence.enabled { "scylla" } else { "memory" },
    }))
}

/// POST /admin/reload-config
///
/// Engine limits and the scoring table are only applied at startup.
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_config() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "Configuration reloaded successfully"
            })),
        ),
        Err(e) => {
            tracing::error!("Config reload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use lead_scoring_config::Settings;
    use lead_scoring_core::{FixedClock, LeadStore};
    use lead_scoring_engine::ScoringEngine;
    use lead_scoring_persistence::{InMemoryConversationStore, InMemoryLeadStore};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> (AppState, Arc<InMemoryLeadStore>) {
        let leads = Arc::new(InMemoryLeadStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let state = AppState::with_stores(
            Settings::default(),
            Arc::new(ScoringEngine::default()),
            leads.clone(),
            Arc::new(InMemoryConversationStore::new()),
            clock,
        );
        (state, leads)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[test]
    fn test_router_creation() {
        let (state, _) = test_state();
        let _ = create_router(state);
    }

    #[tokio::test]
    async fn test_create_then_score_lead() {
        let (state, _) = test_state();
        let app = create_router(state);

        let (status, lead) = send(
            app.clone(),
            Method::POST,
            "/api/leads",
            Some(serde_json::json!({
                "fullName": "Grace Hopper",
                "email": "grace@example.com",
                "budget": "$10,000+",
                "timeline": "immediate"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(lead["status"], "NEW");
        assert_eq!(lead["score"], 0);
        let id = lead["id"].as_str().unwrap().to_string();

        for _ in 0..5 {
            let (status, _) = send(
                app.clone(),
                Method::POST,
                &format!("/api/leads/{}/conversations", id),
                Some(serde_json::json!({ "outcome": "booked_call", "durationSeconds": 600 })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, outcome) = send(
            app.clone(),
            Method::POST,
            &format!("/api/leads/{}/score", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["isQualified"], true);
        assert_eq!(outcome["autoQualified"], true);
        assert_eq!(outcome["status"], "QUALIFIED");
        assert!(outcome["score"].as_u64().unwrap() >= 70);

        let (status, report) = send(app, Method::GET, &format!("/api/leads/{}/score", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["needsUpdate"], false);
        assert_eq!(report["score"], outcome["score"]);
    }

    #[tokio::test]
    async fn test_unknown_lead_is_404() {
        let (state, _) = test_state();
        let app = create_router(state);

        let (status, body) = send(app.clone(), Method::GET, "/api/leads/missing/score", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(app, Method::POST, "/api/leads/missing/score", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_validation_and_errors() {
        let (state, leads) = test_state();
        let now = state.scoring.clock().now();
        leads
            .insert(Lead::new(LeadId::from("a"), "A", "a@example.com", now))
            .await
            .unwrap();
        let app = create_router(state);

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/leads/scores/batch",
            Some(serde_json::json!({ "onlyStale": true, "staleDays": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, result) = send(
            app,
            Method::POST,
            "/api/leads/scores/batch",
            Some(serde_json::json!({ "leadIds": ["a", "ghost"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["processed"], 2);
        assert_eq!(result["updated"], 1);
        assert_eq!(result["errors"][0]["leadId"], "ghost");
        assert_eq!(result["errors"][0]["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_400_json() {
        let (state, _) = test_state();
        let app = create_router(state);

        for body in [
            serde_json::json!({ "everything": true }),
            serde_json::json!({ "staleDays": -1 }),
            serde_json::json!({ "leadIds": "a" }),
        ] {
            let (status, error) = send(
                app.clone(),
                Method::POST,
                "/api/leads/scores/batch",
                Some(body.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(error["error"], "invalid_request", "body {body}");
            assert!(error["message"].is_string());
        }

        let (status, error) = send(
            app,
            Method::POST,
            "/api/leads",
            Some(serde_json::json!({ "fullName": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_stats_and_patch() {
        let (state, leads) = test_state();
        let now = state.scoring.clock().now();
        leads
            .insert(Lead::new(LeadId::from("a"), "A", "a@example.com", now))
            .await
            .unwrap();
        let app = create_router(state);

        let (status, lead) = send(
            app.clone(),
            Method::PATCH,
            "/api/leads/a",
            Some(serde_json::json!({ "status": "CONTACTED", "phone": "555-0100" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(lead["status"], "CONTACTED");
        assert_eq!(lead["phone"], "555-0100");

        let (status, _) = send(
            app.clone(),
            Method::PATCH,
            "/api/leads/a",
            Some(serde_json::json!({ "score": 99 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, stats) = send(app, Method::GET, "/api/leads/scores/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalLeads"], 1);
        assert_eq!(stats["unscored"], 1);
        assert_eq!(stats["byGrade"]["F"], 1);
    }
}
