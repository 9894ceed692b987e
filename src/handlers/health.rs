use axum::{response::IntoResponse, Json};
use serde_json::json;

/// GET /api/health
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Studio gateway is running",
    }))
}
