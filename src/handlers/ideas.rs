//! Idea management for the signed-in owner.
//!
//! Live and paused ideas count against the free-tier limit; drafts and
//! archived ideas are unlimited. Slugs are unique among non-deleted ideas
//! of every owner, since each one is also a public subdomain.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::{IdeaFields, IdeaStatus, StoreError};
use crate::http::{ApiError, AppState, AuthUser};
use crate::validation::{IdeaInput, ValidIdea};

const SLUG_TAKEN: &str = "This slug is already taken";

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound("Idea not found"))
}

fn fields(valid: ValidIdea, status: IdeaStatus) -> IdeaFields {
    IdeaFields {
        slug: valid.slug,
        title: valid.title,
        tagline: valid.tagline,
        problem: valid.problem,
        solution: valid.solution,
        audience: valid.audience,
        price_hint: valid.price_hint,
        status,
    }
}

fn slug_conflict(error: StoreError) -> ApiError {
    match error {
        StoreError::Conflict => ApiError::validation(SLUG_TAKEN),
        other => other.into(),
    }
}

/// Reject a move into an active status once the owner is at the limit.
async fn ensure_capacity(state: &AppState, owner: &str) -> Result<(), ApiError> {
    let limit = state.config().ideas.max_active_free;
    let active = state.store.count_active_ideas(owner).await?;
    if active >= limit {
        return Err(ApiError::UpgradeRequired(format!(
            "Free tier allows up to {limit} active ideas. Upgrade to Pro for unlimited ideas."
        )));
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let ideas = state.store.list_ideas(&auth.user.id).await?;
    Ok(Json(json!({ "ideas": ideas })))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<IdeaInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = payload?;
    let valid = input.validate().map_err(ApiError::Validation)?;
    let status = valid.status.unwrap_or_default();

    if status.is_active() {
        ensure_capacity(&state, &auth.user.id).await?;
    }
    if state.store.find_by_slug(&valid.slug).await?.is_some() {
        return Err(ApiError::validation(SLUG_TAKEN));
    }

    let idea = state
        .store
        .insert_idea(&auth.user.id, fields(valid, status))
        .await
        .map_err(slug_conflict)?;

    tracing::info!(user = %auth.user.id, idea = %idea.id, slug = %idea.slug, "Idea created");
    Ok((StatusCode::CREATED, Json(json!({ "idea": idea }))))
}

pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let idea = state
        .store
        .get_idea(&auth.user.id, id)
        .await?
        .ok_or(ApiError::NotFound("Idea not found"))?;
    Ok(Json(json!({ "idea": idea })))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<IdeaInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let existing = state
        .store
        .get_idea(&auth.user.id, id)
        .await?
        .ok_or(ApiError::NotFound("Idea not found"))?;

    let Json(input) = payload?;
    let valid = input.validate().map_err(ApiError::Validation)?;
    let status = valid.status.unwrap_or(existing.status);

    if status.is_active() && !existing.status.is_active() {
        ensure_capacity(&state, &auth.user.id).await?;
    }

    let slug_changed = valid.slug != existing.slug;
    if slug_changed {
        let taken = state
            .store
            .find_by_slug(&valid.slug)
            .await?
            .is_some_and(|other| other.id != id);
        if taken {
            return Err(ApiError::validation(SLUG_TAKEN));
        }
        tracing::info!(idea = %id, from = %existing.slug, to = %valid.slug, "Slug changed");
    }

    let idea = state
        .store
        .update_idea(&auth.user.id, id, fields(valid, status))
        .await
        .map_err(slug_conflict)?
        .ok_or(ApiError::NotFound("Idea not found"))?;

    Ok(Json(json!({
        "idea": idea,
        "slug_changed": slug_changed,
        "old_slug": existing.slug,
    })))
}

/// Soft delete. Unknown or foreign ids succeed without effect.
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    state.store.soft_delete_idea(&auth.user.id, id).await?;
    tracing::info!(user = %auth.user.id, idea = %id, "Idea deleted");
    Ok(Json(json!({ "success": true })))
}
