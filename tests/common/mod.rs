//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use idea_gateway::backend::{Backends, IdeaFields, IdeaStatus, MemoryAuthProvider, MemoryStore};
use idea_gateway::gatekeeper::ManualClock;
use idea_gateway::{build_app, AppState, GatewayConfig};

pub const PASSWORD: &str = "Sup3rsecret";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub auth: Arc<MemoryAuthProvider>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

pub fn test_app() -> TestApp {
    test_app_with(GatewayConfig::default())
}

/// App over in-memory backends and a manual clock.
pub fn test_app_with(config: GatewayConfig) -> TestApp {
    let auth = Arc::new(MemoryAuthProvider::new());
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new());

    let backends = Backends {
        auth: auth.clone(),
        store: store.clone(),
    };
    let state = AppState::new(config, backends, clock.clone());

    TestApp {
        app: build_app(state.clone()),
        state,
        auth,
        store,
        clock,
    }
}

pub struct RequestSpec {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl RequestSpec {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str, body: Value) -> Self {
        Self::new(Method::POST, uri).json(body)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn raw_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn host(self, host: &str) -> Self {
        self.header("host", host)
    }

    pub fn client_ip(self, ip: &str) -> Self {
        self.header("x-forwarded-for", ip)
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {token}"))
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match self.body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }
}

/// Send one request; the body is parsed as JSON, or `Null` when it is not.
pub async fn send(app: &Router, spec: RequestSpec) -> (StatusCode, Value) {
    let response = app.clone().oneshot(spec.build()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn login(app: &Router, email: &str, password: &str, ip: &str) -> (StatusCode, Value) {
    send(
        app,
        RequestSpec::post(
            "/api/auth/login",
            json!({ "email": email, "password": password }),
        )
        .client_ip(ip),
    )
    .await
}

/// Create a verified user and return an access token for it.
pub async fn signed_in_user(test: &TestApp, email: &str) -> String {
    test.auth.insert_user(email, PASSWORD, "Test User");
    let (status, body) = login(&test.app, email, PASSWORD, "192.0.2.250").await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["session"]["access_token"].as_str().unwrap().to_string()
}

pub fn idea_json(slug: &str, status: &str) -> Value {
    json!({
        "slug": slug,
        "title": "LandlordComply",
        "tagline": "Landlord compliance, simplified",
        "problem": "Compliance paperwork piles up",
        "solution": "One dashboard for every certificate",
        "audience": "UK landlords",
        "price_hint": "£9/month",
        "status": status,
    })
}

pub fn idea_fields(slug: &str, status: IdeaStatus) -> IdeaFields {
    IdeaFields {
        slug: slug.to_string(),
        title: format!("{slug} title"),
        tagline: "Tagline".into(),
        problem: "Problem".into(),
        solution: "Solution".into(),
        audience: "Audience".into(),
        price_hint: None,
        status,
    }
}
