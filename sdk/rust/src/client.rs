//! Client for the idea-gateway public API.

use reqwest::header::{AUTHORIZATION, HOST};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl SdkError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SdkError::Api { status, .. } => Some(*status),
            SdkError::Http(e) => e.status(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
    pub session: Session,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub needs_email_confirmation: bool,
    pub user: User,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
    host: Option<String>,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            host: None,
        }
    }

    /// Send every request with this `Host` header, e.g. a tenant subdomain.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.host {
            Some(host) => builder.header(HOST, host),
            None => builder,
        }
    }

    async fn send<T: for<'de> Deserialize<'de>>(builder: RequestBuilder) -> Result<T, SdkError> {
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(SdkError::Api { status, message });
        }
        Ok(resp.json().await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, SdkError> {
        let body = serde_json::json!({ "email": email, "password": password });
        Self::send(self.request(reqwest::Method::POST, "/api/auth/login").json(&body)).await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<RegisterResponse, SdkError> {
        let body = serde_json::json!({ "email": email, "password": password, "name": name });
        Self::send(self.request(reqwest::Method::POST, "/api/auth/register").json(&body)).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<Acknowledgement, SdkError> {
        let body = serde_json::json!({ "email": email });
        Self::send(self.request(reqwest::Method::POST, "/api/auth/reset-password").json(&body)).await
    }

    /// Join the waitlist of the idea with slug `source`.
    pub async fn signup(&self, email: &str, source: &str) -> Result<Acknowledgement, SdkError> {
        let body = serde_json::json!({ "email": email, "source": source });
        Self::send(self.request(reqwest::Method::POST, "/api/signup").json(&body)).await
    }

    /// Create an idea as the user owning `access_token`.
    pub async fn create_idea(&self, access_token: &str, idea: &Value) -> Result<Value, SdkError> {
        Self::send(
            self.request(reqwest::Method::POST, "/api/ideas")
                .header(AUTHORIZATION, format!("Bearer {access_token}"))
                .json(idea),
        )
        .await
    }

    /// Fetch a page document. With a tenant host set, `/` is that idea's page.
    pub async fn page(&self, path: &str) -> Result<Value, SdkError> {
        Self::send(self.request(reqwest::Method::GET, path)).await
    }
}
