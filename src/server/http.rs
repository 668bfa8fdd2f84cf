//! HTTP handlers for the learning API

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinError;
use tracing::{error, warn};

use crate::learning::{classifier, LearningSnapshot};
use crate::server::ServerState;
use crate::types::{Feedback, UserPreferences};

/// Record request, sent once per completed exchange
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub question: String,
    pub response: String,
    pub feedback: Feedback,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub latency_ms: u64,
}

/// Classify request
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

/// Status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub interactions: usize,
    pub patterns: usize,
}

/// Malformed or mistyped request body, reported as JSON
fn rejection_response(rejection: JsonRejection) -> Response {
    (rejection.status(), Json(json!({ "error": rejection.body_text() }))).into_response()
}

fn worker_failure(e: JoinError) -> Response {
    error!("Engine task failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Learning engine task failed" })),
    )
        .into_response()
}

pub async fn status_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    let response = StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        interactions: engine.interactions().len(),
        patterns: engine.patterns().len(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn record_handler(
    State(state): State<ServerState>,
    body: Result<Json<RecordRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    if req.question.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Question must not be empty" })),
        )
            .into_response();
    }

    let recorded = state
        .with_engine(move |engine| {
            engine.record_interaction(&req.question, &req.response, req.feedback, &req.context, req.latency_ms);
            engine.interactions().len()
        })
        .await;
    let total = match recorded {
        Ok(total) => total,
        Err(e) => return worker_failure(e),
    };

    (
        StatusCode::CREATED,
        Json(json!({ "status": "recorded", "totalInteractions": total })),
    )
        .into_response()
}

pub async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let metrics = state.engine.lock().await.learning_metrics();
    (StatusCode::OK, Json(metrics)).into_response()
}

pub async fn suggestions_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let suggestions = state.engine.lock().await.improvement_suggestions();
    (StatusCode::OK, Json(json!({ "suggestions": suggestions }))).into_response()
}

pub async fn classify_handler(body: Result<Json<ClassifyRequest>, JsonRejection>) -> impl IntoResponse {
    match body {
        Ok(Json(req)) => (StatusCode::OK, Json(classifier::classify(&req.text))).into_response(),
        Err(rejection) => rejection_response(rejection),
    }
}

pub async fn categories_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "categories": classifier::categories() }))).into_response()
}

pub async fn recommendations_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let recommendations = state.engine.lock().await.personalized_recommendations(&user_id);
    (
        StatusCode::OK,
        Json(json!({ "userId": user_id, "recommendations": recommendations })),
    )
        .into_response()
}

pub async fn get_preferences_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    match engine.user_preferences(&user_id) {
        Some(prefs) => (StatusCode::OK, Json(json!(prefs))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No preferences for user {}", user_id) })),
        )
            .into_response(),
    }
}

pub async fn update_preferences_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    body: Result<Json<UserPreferences>, JsonRejection>,
) -> impl IntoResponse {
    let Json(partial) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    let merged = state
        .with_engine(move |engine| {
            engine.update_user_preferences(&user_id, partial);
            engine.user_preferences(&user_id).cloned().unwrap_or_default()
        })
        .await;
    match merged {
        Ok(merged) => (StatusCode::OK, Json(merged)).into_response(),
        Err(e) => worker_failure(e),
    }
}

pub async fn export_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let snapshot = state.engine.lock().await.snapshot();
    (StatusCode::OK, Json(snapshot)).into_response()
}

pub async fn import_handler(
    State(state): State<ServerState>,
    body: Result<Json<LearningSnapshot>, JsonRejection>,
) -> impl IntoResponse {
    let Json(snapshot) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    let counts = state
        .with_engine(move |engine| {
            engine.restore(snapshot);
            (engine.interactions().len(), engine.patterns().len())
        })
        .await;
    match counts {
        Ok((interactions, patterns)) => (
            StatusCode::OK,
            Json(json!({
                "status": "imported",
                "interactions": interactions,
                "patterns": patterns,
            })),
        )
            .into_response(),
        Err(e) => worker_failure(e),
    }
}

pub async fn reset_handler(State(state): State<ServerState>) -> impl IntoResponse {
    if let Err(e) = state.with_engine(|engine| engine.reset_learning_data()).await {
        return worker_failure(e);
    }
    warn!("Learning data reset via HTTP API");
    (StatusCode::OK, Json(json!({ "status": "reset" }))).into_response()
}
