//! Rate limiting and lockout through the HTTP surface.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use idea_gateway::gatekeeper::LockoutStatus;
use idea_gateway::GatewayConfig;

mod common;
use common::{login, send, test_app, test_app_with, RequestSpec, PASSWORD};

const EMAIL: &str = "founder@example.com";

#[tokio::test]
async fn test_login_rate_limit_per_ip() {
    let test = test_app();
    test.auth.insert_user(EMAIL, PASSWORD, "Founder");

    // Alternate accounts so lockout never kicks in.
    for i in 0..10 {
        let email = format!("nobody{}@example.com", i);
        let (status, _) = login(&test.app, &email, "Wrong1234", "203.0.113.1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many login attempts. Please try again later.");

    let (status, _) = login(&test.app, EMAIL, PASSWORD, "203.0.113.2").await;
    assert_eq!(status, StatusCode::OK);

    test.clock.advance(Duration::from_secs(3600));
    let (status, _) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_lockout_after_threshold_failures() {
    let test = test_app();
    test.auth.insert_user(EMAIL, PASSWORD, "Founder");

    for _ in 0..5 {
        let (status, body) = login(&test.app, EMAIL, "Wrong1234", "203.0.113.1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");
    }

    // Correct password is refused while locked, before the provider is asked.
    let (status, body) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(
        body["error"],
        "Account temporarily locked due to multiple failed login attempts. Try again in 15 minutes."
    );

    test.clock.advance(Duration::from_secs(14 * 60 + 1));
    let (status, body) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert!(body["error"].as_str().unwrap().ends_with("Try again in 1 minutes."));

    test.clock.advance(Duration::from_secs(60));
    let (status, body) = login(&test.app, EMAIL, PASSWORD, "203.0.113.9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], EMAIL);
    assert_eq!(test.state.gatekeeper.check_lockout(EMAIL), LockoutStatus::Unlocked);
}

#[tokio::test]
async fn test_success_clears_failure_streak() {
    let test = test_app();
    test.auth.insert_user(EMAIL, PASSWORD, "Founder");

    for _ in 0..4 {
        login(&test.app, EMAIL, "Wrong1234", "203.0.113.1").await;
    }
    let (status, _) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);

    // Four more failures stay under the threshold again.
    for _ in 0..4 {
        login(&test.app, EMAIL, "Wrong1234", "203.0.113.2").await;
    }
    let (status, _) = login(&test.app, EMAIL, PASSWORD, "203.0.113.2").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_email_case_shares_lockout() {
    let test = test_app();
    test.auth.insert_user(EMAIL, PASSWORD, "Founder");

    for email in ["Founder@Example.com", "FOUNDER@example.com", EMAIL, EMAIL, EMAIL] {
        login(&test.app, email, "Wrong1234", "203.0.113.1").await;
    }
    let (status, _) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::LOCKED);
}

#[tokio::test]
async fn test_invalid_input_is_not_a_failure() {
    let test = test_app();
    test.auth.insert_user(EMAIL, PASSWORD, "Founder");

    let (status, body) = send(
        &test.app,
        RequestSpec::post("/api/auth/login", json!({ "email": EMAIL })).client_ip("203.0.113.1"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");

    let (status, body) = login(&test.app, "not-an-email", PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email address");

    let (status, _) = send(
        &test.app,
        RequestSpec::new(axum::http::Method::POST, "/api/auth/login")
            .raw_body("{not json")
            .client_ip("203.0.113.1"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(test.state.gatekeeper.stats().lockout_records, 0);
}

#[tokio::test]
async fn test_registration_limit_and_duplicates() {
    let test = test_app();
    let register = |email: String| {
        RequestSpec::post(
            "/api/auth/register",
            json!({ "email": email, "password": PASSWORD, "name": "Founder" }),
        )
        .client_ip("198.51.100.4")
    };

    let (status, body) = send(&test.app, register(EMAIL.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["needs_email_confirmation"], false);

    let (status, body) = send(&test.app, register(EMAIL.to_string())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "An account with this email already exists");

    for i in 0..3 {
        let (status, _) = send(&test.app, register(format!("user{}@example.com", i))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&test.app, register("late@example.com".into())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many registration attempts. Please try again later.");
}

#[tokio::test]
async fn test_registration_validation_messages() {
    let test = test_app();
    let cases = [
        (json!({ "email": EMAIL, "password": PASSWORD }), "Email, password, and name are required"),
        (json!({ "email": "nope", "password": PASSWORD, "name": "Founder" }), "Invalid email address"),
        (json!({ "email": EMAIL, "password": PASSWORD, "name": "F" }), "Name must be at least 2 characters long"),
        (json!({ "email": EMAIL, "password": "short1A", "name": "Founder" }), "Password must be at least 8 characters long"),
    ];

    for (i, (body, expected)) in cases.into_iter().enumerate() {
        let ip = format!("198.51.100.{}", i + 10);
        let (status, response) =
            send(&test.app, RequestSpec::post("/api/auth/register", body).client_ip(&ip)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], expected);
    }
}

#[tokio::test]
async fn test_password_reset_is_generic_and_limited_per_email() {
    let test = test_app();
    test.auth.insert_user(EMAIL, PASSWORD, "Founder");
    let reset = |email: &str| RequestSpec::post("/api/auth/reset-password", json!({ "email": email }));

    let (known_status, known) = send(&test.app, reset(EMAIL)).await;
    let (unknown_status, unknown) = send(&test.app, reset("ghost@example.com")).await;
    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known, unknown);

    send(&test.app, reset(EMAIL)).await;
    send(&test.app, reset(EMAIL)).await;
    let (status, body) = send(&test.app, reset(EMAIL)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many reset requests. Please try again later.");
    assert_eq!(test.auth.reset_requests(EMAIL), 3);

    let (status, _) = send(&test.app, reset("ghost@example.com")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_confirm_requires_valid_token() {
    let test = test_app();
    let token = common::signed_in_user(&test, EMAIL).await;
    let confirm = |password: &str| {
        RequestSpec::post("/api/auth/reset-password/confirm", json!({ "password": password }))
    };

    let (status, body) = send(&test.app, confirm("weak")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 8 characters long");

    let (status, body) = send(&test.app, confirm("N3wPassword").bearer("expired-token")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Reset link expired or invalid. Please request a new one.");

    let (status, _) = send(&test.app, confirm("N3wPassword").bearer(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = login(&test.app, EMAIL, "N3wPassword", "203.0.113.50").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reloaded_policy_applies_to_existing_windows() {
    let test = test_app();
    test.auth.insert_user(EMAIL, PASSWORD, "Founder");

    let (status, _) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::OK);

    let mut config = GatewayConfig::default();
    config.rate_limit.login.max_attempts = 1;
    test.state.apply_config(config);

    let (status, _) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_configured_lockout_threshold() {
    let mut config = GatewayConfig::default();
    config.lockout.threshold = 2;
    config.lockout.duration_secs = 120;
    let test = test_app_with(config);
    test.auth.insert_user(EMAIL, PASSWORD, "Founder");

    login(&test.app, EMAIL, "Wrong1234", "203.0.113.1").await;
    login(&test.app, EMAIL, "Wrong1234", "203.0.113.1").await;
    let (status, body) = login(&test.app, EMAIL, PASSWORD, "203.0.113.1").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert!(body["error"].as_str().unwrap().ends_with("Try again in 2 minutes."));
}
