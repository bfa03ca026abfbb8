//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the axum application with every API and page handler
//! - Run the host rewrite in front of route matching
//! - Wire up middleware (tracing, request ID, timeout, body limit, metrics)
//! - Start the gatekeeper sweeper and apply reloaded configuration
//! - Serve until the shutdown broadcast fires
//!
//! # Layering
//! ```text
//! request id → trace → timeout → body limit → metrics
//!     → host rewrite (may change the URI)
//!         → API / page routes
//! ```
//! The rewrite is a service wrapping the inner router, not a route layer:
//! axum matches routes before route layers run, so a rewrite placed there
//! would be too late.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::Layer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::{AuthProvider, Backends, DataStore};
use crate::config::GatewayConfig;
use crate::gatekeeper::{Clock, GatePolicies, Gatekeeper, Sweeper, SystemClock};
use crate::handlers;
use crate::observability::metrics;
use crate::routing::{host_rewrite_middleware, HostRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Current configuration, swapped on reload.
    pub config: Arc<ArcSwap<GatewayConfig>>,
    pub gatekeeper: Arc<Gatekeeper>,
    pub host_router: Arc<HostRouter>,
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn DataStore>,
}

impl AppState {
    pub fn new(config: GatewayConfig, backends: Backends, clock: Arc<dyn Clock>) -> Self {
        let policies = GatePolicies::from_config(&config.rate_limit, &config.lockout);
        Self {
            gatekeeper: Arc::new(Gatekeeper::new(policies, clock)),
            host_router: Arc::new(HostRouter::new(&config.domain)),
            config: Arc::new(ArcSwap::from_pointee(config)),
            auth: backends.auth,
            store: backends.store,
        }
    }

    pub fn config(&self) -> Arc<GatewayConfig> {
        self.config.load_full()
    }

    /// Swap in a reloaded configuration. Gatekeeper counters survive; the
    /// domain layout and listeners only change on restart.
    pub fn apply_config(&self, config: GatewayConfig) {
        self.gatekeeper
            .update_policies(GatePolicies::from_config(&config.rate_limit, &config.lockout));
        self.config.store(Arc::new(config));
        tracing::info!("Configuration reloaded");
    }
}

/// Build the full application: routes, host rewrite and middleware.
#[allow(deprecated)]
pub fn build_app(state: AppState) -> Router {
    let config = state.config();
    let host_router = state.host_router.clone();

    let routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/reset-password", post(handlers::auth::reset_password))
        .route(
            "/api/auth/reset-password/confirm",
            post(handlers::auth::confirm_reset),
        )
        .route("/api/auth/profile/update-name", put(handlers::profile::update_name))
        .route("/api/auth/profile/update-email", put(handlers::profile::update_email))
        .route(
            "/api/auth/profile/update-password",
            put(handlers::profile::update_password),
        )
        .route(
            "/api/auth/profile/delete-account",
            delete(handlers::profile::delete_account),
        )
        .route(
            "/api/ideas",
            get(handlers::ideas::list).post(handlers::ideas::create),
        )
        .route(
            "/api/ideas/{id}",
            get(handlers::ideas::get_one)
                .put(handlers::ideas::update)
                .delete(handlers::ideas::remove),
        )
        .route("/api/signup", post(handlers::signups::signup))
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route("/", get(handlers::pages::home))
        .route("/idea/{slug}", get(handlers::pages::idea_page))
        .route("/idea/{slug}/{*rest}", get(handlers::pages::idea_subpage))
        .fallback(handlers::pages::not_found)
        .with_state(state);

    let rewritten = middleware::from_fn_with_state(host_router, host_rewrite_middleware).layer(routes);

    Router::new()
        .fallback_service(rewritten)
        .layer(middleware::from_fn(metrics::track_metrics))
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// HTTP server for the gateway.
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// Create a server with the backends named in `config` and the system clock.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let backends = Backends::from_config(&config.backend)?;
        Ok(Self::with_state(AppState::new(config, backends, Arc::new(SystemClock))))
    }

    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_app(self.state.clone())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweep_every = Duration::from_secs(self.state.config().rate_limit.sweep_interval_secs);
        let sweeper = Sweeper::new(self.state.gatekeeper.clone(), sweep_every);
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let reload_state = self.state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => reload_state.apply_config(config),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
