//! Liveness and database reachability probes.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::state::AppState;

#[utoipa::path(get, path = "/health", tag = "system", responses(
    (status = 200, description = "Service is alive")
))]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[utoipa::path(get, path = "/dbping", tag = "system", responses(
    (status = 200, description = "Database reachable"),
    (status = 500, description = "Database unavailable", body = crate::error::ErrorBody)
))]
pub async fn dbping(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HttpAppError> {
    atlas_db::ping(&state.pool).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
