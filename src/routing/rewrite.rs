//! Host rewrite middleware.
//!
//! Runs in front of axum's route matching (see `http::server::build_app`),
//! so a rewritten request is dispatched as if the client had asked for
//! `/idea/<label>/…` directly.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, uri::PathAndQuery, Request, Uri},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;
use crate::routing::host::{HostRouter, RouteDecision};

/// Host taken from the `Host` header, falling back to the URI authority.
fn request_host(req: &Request<Body>) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

/// Replace the path of `uri`, keeping its query string.
fn with_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

pub async fn host_rewrite_middleware(
    State(router): State<Arc<HostRouter>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let host = request_host(&req);
    let route = router.resolve(&host);

    if let RouteDecision::Rewrite(path) = router.route(&host, req.uri().path()) {
        match with_path(req.uri(), &path) {
            Some(uri) => {
                tracing::debug!(
                    host = %host,
                    from = %req.uri().path(),
                    to = %path,
                    "Rewriting tenant request"
                );
                metrics::record_host_rewrite();
                *req.uri_mut() = uri;
            }
            None => {
                tracing::warn!(host = %host, path = %path, "Rewritten path is not a valid URI, passing through");
            }
        }
    }

    req.extensions_mut().insert(route);
    next.run(req).await
}
