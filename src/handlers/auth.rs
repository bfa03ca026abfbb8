//! Sign-in, registration and password reset.
//!
//! Login runs its checks in a fixed order: rate limit by client address,
//! input validation, lockout, auth provider. A failure is only recorded
//! against the account after the provider has rejected the credentials.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::present;
use crate::backend::{NewAccount, ProviderError, UserUpdate};
use crate::gatekeeper::{Action, LockoutStatus};
use crate::http::extract::bearer_token;
use crate::http::{ApiError, AppState, ClientIp};
use crate::validation::{normalize_email, validate_email, validate_name, validate_password};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmResetRequest {
    pub password: Option<String>,
}

const RESET_LINK_INVALID: &str = "Reset link expired or invalid. Please request a new one.";

pub async fn login(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    if !state.gatekeeper.admit(Action::Login, &client) {
        tracing::warn!(target: "security_audit", client = %client, "Login rate limit exceeded");
        return Err(ApiError::RateLimited(
            "Too many login attempts. Please try again later.",
        ));
    }

    let Json(body) = payload?;
    let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
        return Err(ApiError::validation("Email and password are required"));
    };
    let email = normalize_email(&email);
    if !validate_email(&email) {
        return Err(ApiError::validation("Invalid email address"));
    }

    if let LockoutStatus::Locked { remaining_minutes } = state.gatekeeper.check_lockout(&email) {
        tracing::warn!(target: "security_audit", email = %email, "Login attempt on locked account");
        return Err(ApiError::Locked { remaining_minutes });
    }

    let sign_in = match state.auth.sign_in(&email, &password).await {
        Ok(sign_in) => sign_in,
        Err(e) => {
            state.gatekeeper.record_failure(&email);
            tracing::info!(target: "security_audit", email = %email, error = %e, "Failed login");
            return Err(ApiError::Unauthorized("Invalid email or password"));
        }
    };

    state.gatekeeper.clear_on_success(&email);
    tracing::info!(target: "security_audit", email = %email, "Successful login");

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": sign_in.user,
        "session": sign_in.session,
    })))
}

pub async fn register(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    if !state.gatekeeper.admit(Action::Registration, &client) {
        tracing::warn!(target: "security_audit", client = %client, "Registration rate limit exceeded");
        return Err(ApiError::RateLimited(
            "Too many registration attempts. Please try again later.",
        ));
    }

    let Json(body) = payload?;
    let (Some(email), Some(password), Some(name)) =
        (present(body.email), present(body.password), present(body.name))
    else {
        return Err(ApiError::validation("Email, password, and name are required"));
    };
    let email = normalize_email(&email);
    if !validate_email(&email) {
        return Err(ApiError::validation("Invalid email address"));
    }
    if !validate_name(&name) {
        return Err(ApiError::validation("Name must be at least 2 characters long"));
    }
    validate_password(&password).map_err(ApiError::validation)?;

    let origin = state.config().ideas.public_origin.clone();
    let account = NewAccount {
        email,
        password,
        name: name.trim().to_string(),
        redirect_to: Some(format!("{origin}/auth/callback")),
    };

    let sign_up = match state.auth.sign_up(account).await {
        Ok(sign_up) => sign_up,
        Err(ProviderError::AlreadyRegistered) => {
            return Err(ApiError::Conflict("An account with this email already exists"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Registration failed");
            return Err(ApiError::Internal("Registration failed"));
        }
    };

    let needs_confirmation = sign_up.session.is_none();
    let message = if needs_confirmation {
        "Registration successful! Please check your email to verify your account."
    } else {
        "Registration successful! You are now logged in."
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "needs_email_confirmation": needs_confirmation,
        "user": sign_up.user,
        "session": sign_up.session,
    })))
}

/// Always acknowledges a well-formed request, whether or not the account
/// exists.
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let Some(email) = present(body.email) else {
        return Err(ApiError::validation("Email is required"));
    };
    let email = normalize_email(&email);
    if !validate_email(&email) {
        return Err(ApiError::validation("Invalid email address"));
    }

    if !state.gatekeeper.admit(Action::PasswordReset, &email) {
        tracing::warn!(target: "security_audit", email = %email, "Password reset rate limit exceeded");
        return Err(ApiError::RateLimited(
            "Too many reset requests. Please try again later.",
        ));
    }

    let redirect = format!("{}/reset-password/confirm", state.config().ideas.public_origin);
    match state.auth.send_password_reset(&email, Some(&redirect)).await {
        Ok(()) => tracing::info!(target: "security_audit", email = %email, "Password reset requested"),
        Err(e) => tracing::info!(target: "security_audit", email = %email, error = %e, "Password reset not sent"),
    }

    Ok(Json(json!({
        "success": true,
        "message": "If an account exists, a reset email has been sent",
    })))
}

/// Set a new password using the recovery token from the reset link.
pub async fn confirm_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ConfirmResetRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let Some(password) = present(body.password) else {
        return Err(ApiError::validation("Password is required"));
    };
    validate_password(&password).map_err(ApiError::validation)?;

    let token = bearer_token(&headers).ok_or_else(|| ApiError::validation(RESET_LINK_INVALID))?;
    let update = UserUpdate {
        password: Some(password),
        ..Default::default()
    };
    match state.auth.update_user(token, update).await {
        Ok(user) => {
            tracing::info!(target: "security_audit", user = %user.id, "Password reset completed");
            Ok(Json(json!({
                "success": true,
                "message": "Password successfully reset",
            })))
        }
        Err(ProviderError::InvalidToken) => Err(ApiError::validation(RESET_LINK_INVALID)),
        Err(e) => {
            tracing::error!(target: "security_audit", error = %e, "Password reset failed");
            Err(ApiError::Internal("Failed to reset password"))
        }
    }
}
