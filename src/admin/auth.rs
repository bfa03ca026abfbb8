use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::http::extract::bearer_token;
use crate::http::AppState;

/// Key comparison in constant time for equal-length inputs.
fn key_matches(presented: &str, expected: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

/// Require `Authorization: Bearer <admin.api_key>`.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let config = state.config();

    match bearer_token(request.headers()) {
        Some(key) if key_matches(key, &config.admin.api_key) => Ok(next.run(request).await),
        _ => {
            tracing::warn!(target: "security_audit", "Rejected admin request");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches() {
        assert!(key_matches("test-admin-key-0123456789", "test-admin-key-0123456789"));
        assert!(!key_matches("test-admin-key-0123456788", "test-admin-key-0123456789"));
        assert!(!key_matches("test-admin-key", "test-admin-key-0123456789"));
        assert!(!key_matches("", "test-admin-key-0123456789"));
    }
}
