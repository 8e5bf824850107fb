//! Response envelope and error type shared by all endpoints.
//!
//! Every response has the shape `{success, data?, error?, message?}`, with a
//! few endpoints adding a count (`total`, `added` or `deletedCount`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;
use crate::timetable::IngestError;

/// A successful response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    added: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            data: Some(data),
            message: None,
            total: None,
            added: None,
            deleted_count: None,
        }
    }

    /// 201 response for a newly created resource.
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_added(mut self, added: usize) -> Self {
        self.added = Some(added);
        self
    }
}

impl ApiResponse<()> {
    /// Response carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            data: None,
            message: Some(message.into()),
            total: None,
            added: None,
            deleted_count: None,
        }
    }

    pub fn with_deleted_count(mut self, deleted_count: usize) -> Self {
        self.deleted_count = Some(deleted_count);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    BadRequest(String),

    /// Write would violate a uniqueness rule
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected. Only `message` reaches the client.
    #[error("{message}: {details}")]
    Internal {
        message: &'static str,
        details: String,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Replaces the client-facing message of an internal error.
    pub fn context(self, message: &'static str) -> Self {
        match self {
            ApiError::Internal { details, .. } => ApiError::Internal { message, details },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal {
            message: "Internal server error",
            details: err.to_string(),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal { message, details } => {
                error!("{}: {}", message, details);
                message.to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: &message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::ok(vec![1, 2]).with_total(2)).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": [1, 2], "total": 2 }));

        let body =
            serde_json::to_value(ApiResponse::message("Cleared 3").with_deleted_count(3)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": true, "message": "Cleared 3", "deletedCount": 3 })
        );
    }

    #[test]
    fn test_context_only_touches_internal() {
        let err = ApiError::Internal {
            message: "x",
            details: "disk full".into(),
        }
        .context("Failed to create course");
        assert!(matches!(err, ApiError::Internal { message: "Failed to create course", .. }));

        let err = ApiError::NotFound("Course not found".into()).context("ignored");
        assert_eq!(err.to_string(), "Course not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_ingest_errors_are_bad_requests() {
        let err: ApiError = IngestError::NoValidRows.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
