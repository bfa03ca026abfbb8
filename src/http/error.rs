//! API error type and its JSON rendering.
//!
//! Every handler returns `Result<_, ApiError>`. The body is always
//! `{"error": "<message>"}`; upstream details are logged, never echoed.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::backend::{ProviderError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    RateLimited(&'static str),

    #[error("Account temporarily locked due to multiple failed login attempts. Try again in {remaining_minutes} minutes.")]
    Locked { remaining_minutes: u64 },

    #[error("{0}")]
    Unauthorized(&'static str),

    /// Free-tier limit reached; clients offer an upgrade.
    #[error("{0}")]
    UpgradeRequired(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Locked { .. } => StatusCode::LOCKED,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::UpgradeRequired(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::UpgradeRequired(message) => json!({
                "error": message,
                "upgrade_required": true,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::Validation("Invalid request body".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        tracing::error!(error = %error, "Data store request failed");
        ApiError::Internal("Internal server error")
    }
}

impl From<ProviderError> for ApiError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::InvalidToken => ApiError::unauthorized(),
            other => {
                tracing::error!(error = %other, "Auth provider request failed");
                ApiError::Internal("An unexpected error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_locked_message() {
        let (status, body) = body_json(ApiError::Locked { remaining_minutes: 15 }).await;
        assert_eq!(status, StatusCode::LOCKED);
        assert_eq!(
            body["error"],
            "Account temporarily locked due to multiple failed login attempts. Try again in 15 minutes."
        );
    }

    #[tokio::test]
    async fn test_upgrade_required_flag() {
        let (status, body) = body_json(ApiError::UpgradeRequired("limit".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["upgrade_required"], true);
    }

    #[tokio::test]
    async fn test_internal_is_generic() {
        let (status, body) = body_json(StoreError::Rejected("relation does not exist".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
