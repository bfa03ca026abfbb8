//! Landing page documents.
//!
//! Tenant hosts reach these through the host rewrite, so
//! `landlord.<apex>/` arrives here as `/idea/landlord`. Pages are JSON
//! documents; a front end renders them.

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use serde_json::{json, Value};

use crate::backend::{Idea, IdeaStatus};
use crate::http::{ApiError, AppState};
use crate::routing::{HostRoute, RootDomain};

pub async fn home(State(state): State<AppState>) -> Json<Value> {
    let apex = state.host_router.root_name(RootDomain::Apex);
    Json(json!({
        "page": "home",
        "title": "Would You Pay?",
        "tagline": "Stop building things nobody wants. Test demand before you code.",
        "steps": [
            "Launch a landing page in minutes",
            "Collect email signups",
            "Only build ideas with proven demand",
        ],
        "domain": apex,
    }))
}

fn idea_document(state: &AppState, idea: &Idea, section: Option<&str>, host: Option<&HostRoute>) -> Value {
    let apex = state.host_router.root_name(RootDomain::Apex);
    json!({
        "page": "idea",
        "slug": idea.slug,
        "title": idea.title,
        "tagline": idea.tagline,
        "problem": idea.problem,
        "solution": idea.solution,
        "audience": idea.audience,
        "price_hint": idea.price_hint,
        "section": section,
        "url": format!("https://{}.{}", idea.slug, apex),
        "served_from": host.map(|h| h.hostname.as_str()),
        "signup": {
            "endpoint": "/api/signup",
            "source": idea.slug,
        },
    })
}

/// Only live ideas have a public page.
async fn live_idea(state: &AppState, slug: &str) -> Result<Idea, ApiError> {
    match state.store.find_by_slug(slug).await? {
        Some(idea) if idea.status == IdeaStatus::Live => Ok(idea),
        _ => Err(ApiError::NotFound("Idea not found")),
    }
}

pub async fn idea_page(
    State(state): State<AppState>,
    host: Option<Extension<HostRoute>>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let idea = live_idea(&state, &slug).await?;
    let host = host.map(|Extension(h)| h);
    Ok(Json(idea_document(&state, &idea, None, host.as_ref())))
}

pub async fn idea_subpage(
    State(state): State<AppState>,
    host: Option<Extension<HostRoute>>,
    Path((slug, rest)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let idea = live_idea(&state, &slug).await?;
    let host = host.map(|Extension(h)| h);
    Ok(Json(idea_document(&state, &idea, Some(&rest), host.as_ref())))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}
