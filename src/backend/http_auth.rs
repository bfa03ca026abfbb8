//! Auth provider backed by a GoTrue-compatible REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AuthProvider, NewAccount, ProviderError, Session, SignIn, SignUp, User, UserUpdate};
use crate::config::BackendConfig;

/// Talks to `<url>/auth/v1/*` with the project's anon key.
pub struct HttpAuthProvider {
    client: Client,
    base: String,
    anon_key: String,
    service_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        let name = wire
            .user_metadata
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        User {
            id: wire.id,
            email: wire.email.unwrap_or_default(),
            name,
            email_verified: wire.email_confirmed_at.is_some(),
        }
    }
}

/// Token grant and signup responses share this shape; signup omits the token
/// fields when confirmation is pending and may return the user inline.
#[derive(Debug, Deserialize)]
struct WireSession {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<WireUser>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl WireSession {
    fn into_parts(self) -> Result<(User, Option<Session>), ProviderError> {
        let session = self.access_token.map(|access_token| Session {
            access_token,
            expires_at: self.expires_at,
        });
        let user = match (self.user, self.id) {
            (Some(user), _) => user,
            (None, Some(id)) => WireUser {
                id,
                email: self.email,
                email_confirmed_at: self.email_confirmed_at,
                user_metadata: self.user_metadata,
            },
            (None, None) => {
                return Err(ProviderError::Rejected("response carried no user".to_string()))
            }
        };
        Ok((user.into(), session))
    }
}

/// Pull the human-readable message out of a GoTrue error body.
fn error_message(body: &Value) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .unwrap_or("unknown error")
        .to_string()
}

async fn classify(response: Response) -> ProviderError {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = error_message(&body);
    let lowered = message.to_lowercase();

    if lowered.contains("already registered") || lowered.contains("already been registered") {
        ProviderError::AlreadyRegistered
    } else if lowered.contains("invalid login credentials") {
        ProviderError::InvalidCredentials
    } else if status == StatusCode::UNAUTHORIZED
        || lowered.contains("expired")
        || lowered.contains("invalid jwt")
    {
        ProviderError::InvalidToken
    } else if status == StatusCode::NOT_FOUND {
        ProviderError::NotFound
    } else {
        ProviderError::Rejected(message)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(classify(response).await)
    }
}

impl HttpAuthProvider {
    pub fn new(client: Client, config: &BackendConfig) -> Self {
        Self {
            client,
            base: format!("{}/auth/v1", config.url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            service_key: config.service_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base, path))
            .header("apikey", &self.anon_key)
    }

    fn with_redirect(builder: RequestBuilder, redirect_to: Option<&str>) -> RequestBuilder {
        match redirect_to {
            Some(url) => builder.query(&[("redirect_to", url)]),
            None => builder,
        }
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, ProviderError> {
        let response = self
            .request(reqwest::Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        // A failed password grant is a 400 with `invalid_grant`.
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(ProviderError::InvalidCredentials);
        }
        let (user, session) = ensure_success(response).await?.json::<WireSession>().await?.into_parts()?;
        let session = session.ok_or(ProviderError::InvalidCredentials)?;
        Ok(SignIn { user, session })
    }

    async fn sign_up(&self, account: NewAccount) -> Result<SignUp, ProviderError> {
        let builder = self
            .request(reqwest::Method::POST, "/signup")
            .json(&json!({
                "email": account.email,
                "password": account.password,
                "data": { "name": account.name },
            }));
        let response = Self::with_redirect(builder, account.redirect_to.as_deref())
            .send()
            .await?;

        let (user, session) = ensure_success(response).await?.json::<WireSession>().await?.into_parts()?;
        Ok(SignUp { user, session })
    }

    async fn get_user(&self, access_token: &str) -> Result<User, ProviderError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await?;
        let user: WireUser = ensure_success(response).await?.json().await?;
        Ok(user.into())
    }

    async fn update_user(&self, access_token: &str, update: UserUpdate) -> Result<User, ProviderError> {
        let mut body = serde_json::Map::new();
        if let Some(email) = update.email {
            body.insert("email".into(), Value::String(email));
        }
        if let Some(password) = update.password {
            body.insert("password".into(), Value::String(password));
        }
        if let Some(name) = update.name {
            body.insert("data".into(), json!({ "name": name }));
        }

        let response = self
            .request(reqwest::Method::PUT, "/user")
            .bearer_auth(access_token)
            .json(&Value::Object(body))
            .send()
            .await?;
        let user: WireUser = ensure_success(response).await?.json().await?;
        Ok(user.into())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError> {
        let Some(service_key) = &self.service_key else {
            return Err(ProviderError::Rejected(
                "account deletion requires a service key".to_string(),
            ));
        };
        let response = self
            .client
            .delete(format!("{}/admin/users/{}", self.base, user_id))
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), ProviderError> {
        let builder = self
            .request(reqwest::Method::POST, "/recover")
            .json(&json!({ "email": email }));
        let response = Self::with_redirect(builder, redirect_to).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_field_precedence() {
        assert_eq!(
            error_message(&json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
            "Invalid login credentials"
        );
        assert_eq!(error_message(&json!({ "msg": "User already registered" })), "User already registered");
        assert_eq!(error_message(&Value::Null), "unknown error");
    }

    #[test]
    fn test_signup_without_session() {
        let wire: WireSession = serde_json::from_value(json!({
            "id": "u-1",
            "email": "a@example.com",
            "user_metadata": { "name": "Ada" }
        }))
        .unwrap();
        let (user, session) = wire.into_parts().unwrap();
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert!(!user.email_verified);
        assert!(session.is_none());
    }

    #[test]
    fn test_token_grant_response() {
        let wire: WireSession = serde_json::from_value(json!({
            "access_token": "tok",
            "expires_at": 1700000000,
            "user": { "id": "u-1", "email": "a@example.com", "email_confirmed_at": "2024-01-01T00:00:00Z" }
        }))
        .unwrap();
        let (user, session) = wire.into_parts().unwrap();
        assert!(user.email_verified);
        assert_eq!(session.unwrap().access_token, "tok");
    }
}
