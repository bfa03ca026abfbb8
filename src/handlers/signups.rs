//! Waitlist signups from idea landing pages.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::present;
use crate::backend::{NewSignup, SignupMetadata, StoreError};
use crate::http::{ApiError, AppState};
use crate::validation::{normalize_email, validate_email};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub email: Option<String>,
    /// Slug of the idea whose page collected the email.
    pub source: Option<String>,
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let (Some(email), Some(source)) = (present(body.email), present(body.source)) else {
        return Err(ApiError::validation("Email and source are required"));
    };
    let email = normalize_email(&email);
    if !validate_email(&email) {
        return Err(ApiError::validation("Invalid email address"));
    }

    let signup = NewSignup {
        email,
        source: source.trim().to_string(),
        metadata: SignupMetadata {
            user_agent: header_value(&headers, header::USER_AGENT),
            referer: header_value(&headers, header::REFERER),
        },
    };

    match state.store.add_signup(signup).await {
        Ok(row) => {
            tracing::info!(source = %row.source, "Waitlist signup");
            Ok(Json(json!({ "success": true })))
        }
        Err(StoreError::Conflict) => Err(ApiError::Conflict("This email is already on the list!")),
        Err(e) => {
            tracing::error!(error = %e, "Failed to save signup");
            Err(ApiError::Internal("Failed to save signup"))
        }
    }
}
