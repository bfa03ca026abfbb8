//! Account settings for the signed-in user.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::present;
use crate::backend::{ProviderError, UserUpdate};
use crate::http::{ApiError, AppState, AuthUser};
use crate::validation::{normalize_email, validate_email, validate_name, validate_password};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NameRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn update_name(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let Some(name) = present(body.name) else {
        return Err(ApiError::validation("Name is required"));
    };
    if !validate_name(&name) {
        return Err(ApiError::validation("Name must be at least 2 characters"));
    }

    let update = UserUpdate {
        name: Some(name.trim().to_string()),
        ..Default::default()
    };
    state
        .auth
        .update_user(&auth.access_token, update)
        .await
        .map_err(|e| {
            tracing::error!(user = %auth.user.id, error = %e, "Name update failed");
            ApiError::Internal("Failed to update name")
        })?;

    tracing::info!(user = %auth.user.id, "Name updated");
    Ok(Json(json!({ "success": true, "message": "Name updated successfully" })))
}

pub async fn update_email(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let Some(email) = present(body.email) else {
        return Err(ApiError::validation("Email is required"));
    };
    let email = normalize_email(&email);
    if !validate_email(&email) {
        return Err(ApiError::validation("Invalid email address"));
    }

    let update = UserUpdate {
        email: Some(email.clone()),
        ..Default::default()
    };
    match state.auth.update_user(&auth.access_token, update).await {
        Ok(_) => {}
        Err(ProviderError::AlreadyRegistered) => {
            return Err(ApiError::Conflict("This email is already in use"))
        }
        Err(e) => {
            tracing::error!(user = %auth.user.id, error = %e, "Email update failed");
            return Err(ApiError::Internal("Failed to update email"));
        }
    }

    tracing::info!(
        user = %auth.user.id,
        from = %auth.user.email,
        to = %email,
        "Email change requested"
    );
    Ok(Json(json!({
        "success": true,
        "message": "Verification email sent. Please check your new email address.",
        "requires_verification": true,
    })))
}

pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<PasswordRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let (Some(current), Some(new_password)) =
        (present(body.current_password), present(body.new_password))
    else {
        return Err(ApiError::validation("Current and new password are required"));
    };
    validate_password(&new_password).map_err(ApiError::validation)?;

    if state.auth.sign_in(&auth.user.email, &current).await.is_err() {
        return Err(ApiError::Unauthorized("Current password is incorrect"));
    }

    let update = UserUpdate {
        password: Some(new_password),
        ..Default::default()
    };
    state
        .auth
        .update_user(&auth.access_token, update)
        .await
        .map_err(|e| {
            tracing::error!(user = %auth.user.id, error = %e, "Password update failed");
            ApiError::Internal("Failed to update password")
        })?;

    tracing::info!(target: "security_audit", user = %auth.user.id, "Password updated");
    Ok(Json(json!({ "success": true, "message": "Password updated successfully" })))
}

/// Delete the account. When the provider refuses the deletion the session is
/// still ended and the response is marked `partial`.
pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    tracing::info!(user = %auth.user.id, email = %auth.user.email, "Account deletion requested");

    let Err(delete_error) = state.auth.delete_user(&auth.user.id).await else {
        tracing::info!(user = %auth.user.id, "Account deleted");
        return Ok(Json(json!({ "success": true, "message": "Account successfully deleted" })));
    };

    tracing::error!(user = %auth.user.id, error = %delete_error, "Account deletion failed");
    if let Err(e) = state.auth.sign_out(&auth.access_token).await {
        tracing::error!(user = %auth.user.id, error = %e, "Sign-out fallback failed");
        return Err(ApiError::Internal(
            "Failed to delete account. Please contact support.",
        ));
    }

    tracing::info!(user = %auth.user.id, "Signed out after failed deletion");
    Ok(Json(json!({
        "success": true,
        "message": "Account deletion initiated. You have been signed out.",
        "partial": true,
    })))
}
