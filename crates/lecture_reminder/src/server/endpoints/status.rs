use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// GET /health
pub async fn get_health() -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "status": "ok" })),
    )
        .into_response()
}
