//! Request extractors for the student endpoints.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::server::types::ApiError;

#[derive(Debug, Deserialize)]
struct UserQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// The `userId` query parameter. Rejects with 400 when it is missing or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<UserQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("userId required"))?;

        query
            .user_id
            .filter(|id| !id.is_empty())
            .map(UserId)
            .ok_or_else(|| ApiError::bad_request("userId required"))
    }
}
