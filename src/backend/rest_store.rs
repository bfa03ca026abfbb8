//! Data store backed by a PostgREST row API.
//!
//! Filters are spelled in PostgREST's query syntax (`col=eq.value`,
//! `deleted_at=is.null`). Owner scoping is applied explicitly on every call
//! rather than relying on row-level security.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use super::{DataStore, Idea, IdeaFields, NewSignup, Signup, StoreError};
use crate::config::BackendConfig;

pub struct RestStore {
    client: Client,
    base: String,
    api_key: String,
    bearer: String,
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::CONFLICT {
        return Err(StoreError::Conflict);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected(format!("{status}: {body}")))
}

async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, StoreError> {
    Ok(ensure_success(response).await?.json().await?)
}

impl RestStore {
    pub fn new(client: Client, config: &BackendConfig) -> Self {
        let bearer = config
            .service_key
            .clone()
            .unwrap_or_else(|| config.anon_key.clone());
        Self {
            client,
            base: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            api_key: config.anon_key.clone(),
            bearer,
        }
    }

    fn table(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    fn owned_idea(&self, method: reqwest::Method, owner: &str, id: Uuid) -> RequestBuilder {
        self.table(method, "ideas").query(&[
            ("id", format!("eq.{id}")),
            ("user_id", format!("eq.{owner}")),
            ("deleted_at", "is.null".to_string()),
        ])
    }
}

fn idea_body(fields: &IdeaFields) -> serde_json::Value {
    json!({
        "slug": fields.slug,
        "title": fields.title,
        "tagline": fields.tagline,
        "problem": fields.problem,
        "solution": fields.solution,
        "audience": fields.audience,
        "price_hint": fields.price_hint,
        "status": fields.status,
    })
}

#[async_trait]
impl DataStore for RestStore {
    async fn list_ideas(&self, owner: &str) -> Result<Vec<Idea>, StoreError> {
        let response = self
            .table(reqwest::Method::GET, "ideas")
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{owner}")),
                ("deleted_at", "is.null".to_string()),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;
        rows(response).await
    }

    async fn get_idea(&self, owner: &str, id: Uuid) -> Result<Option<Idea>, StoreError> {
        let response = self
            .owned_idea(reqwest::Method::GET, owner, id)
            .query(&[("select", "*")])
            .send()
            .await?;
        Ok(rows(response).await?.into_iter().next())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Idea>, StoreError> {
        let response = self
            .table(reqwest::Method::GET, "ideas")
            .query(&[
                ("select", "*".to_string()),
                ("slug", format!("eq.{slug}")),
                ("deleted_at", "is.null".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        Ok(rows(response).await?.into_iter().next())
    }

    async fn count_active_ideas(&self, owner: &str) -> Result<usize, StoreError> {
        let response = self
            .table(reqwest::Method::GET, "ideas")
            .query(&[
                ("select", "id".to_string()),
                ("user_id", format!("eq.{owner}")),
                ("status", "in.(live,paused)".to_string()),
                ("deleted_at", "is.null".to_string()),
            ])
            .send()
            .await?;
        let ids: Vec<serde_json::Value> = rows(response).await?;
        Ok(ids.len())
    }

    async fn insert_idea(&self, owner: &str, fields: IdeaFields) -> Result<Idea, StoreError> {
        let mut body = idea_body(&fields);
        body["user_id"] = json!(owner);

        let response = self
            .table(reqwest::Method::POST, "ideas")
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected("insert returned no row".to_string()))
    }

    async fn update_idea(
        &self,
        owner: &str,
        id: Uuid,
        fields: IdeaFields,
    ) -> Result<Option<Idea>, StoreError> {
        let mut body = idea_body(&fields);
        body["updated_at"] = json!(Utc::now());

        let response = self
            .owned_idea(reqwest::Method::PATCH, owner, id)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        Ok(rows(response).await?.into_iter().next())
    }

    async fn soft_delete_idea(&self, owner: &str, id: Uuid) -> Result<(), StoreError> {
        let response = self
            .owned_idea(reqwest::Method::PATCH, owner, id)
            .header("Prefer", "return=minimal")
            .json(&json!({ "deleted_at": Utc::now() }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn add_signup(&self, signup: NewSignup) -> Result<Signup, StoreError> {
        let response = self
            .table(reqwest::Method::POST, "signups")
            .header("Prefer", "return=representation")
            .json(&json!({
                "email": signup.email,
                "source": signup.source,
                "created_at": Utc::now(),
                "metadata": signup.metadata,
            }))
            .send()
            .await?;
        rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected("insert returned no row".to_string()))
    }

    async fn list_signups(&self) -> Result<Vec<Signup>, StoreError> {
        let response = self
            .table(reqwest::Method::GET, "signups")
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        rows(response).await
    }
}
