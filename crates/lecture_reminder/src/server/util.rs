use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::server::types::ApiError;

/// Unwraps a JSON body, turning extractor rejections into enveloped 400s.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))
}

/// Case-insensitive substring match used by the list filters. An absent or
/// empty needle matches everything.
pub fn matches_filter(haystack: &str, needle: Option<&str>) -> bool {
    match needle.filter(|n| !n.is_empty()) {
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
        None => true,
    }
}

/// Treats empty (or whitespace-only) strings as missing.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
