//! idea-gateway
//!
//! Multi-tenant landing page and waitlist server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id / trace / timeout / body limit / metrics
//!                         │
//!                         ▼
//!                     host rewrite ── landlord.<apex>/x ─▶ /idea/landlord/x
//!                         │
//!                         ▼
//!         ┌───────────────┼──────────────────┬─────────────────┐
//!         ▼               ▼                  ▼                 ▼
//!     /api/auth/*     /api/ideas       /api/signup        /, /idea/*
//!     gatekeeper      /api/dashboard                      pages
//!         │               │                  │                 │
//!         ▼               ▼                  ▼                 ▼
//!     AuthProvider ◀──────┴──── DataStore ───┴─────────────────┘
//!
//!     Cross-cutting: config + hot reload, logging, metrics,
//!                    admin API, gatekeeper sweeper, shutdown
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use idea_gateway::admin::setup_admin_router;
use idea_gateway::config::validation::validate_config;
use idea_gateway::config::watcher::ConfigWatcher;
use idea_gateway::config::{load_config, ConfigError, GatewayConfig, ObservabilityConfig};
use idea_gateway::lifecycle::{shutdown_signal, Shutdown};
use idea_gateway::observability::{logging, metrics};
use idea_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "idea-gateway")]
#[command(about = "Multi-tenant idea landing pages and waitlists", long_about = None)]
struct Cli {
    /// TOML configuration file. Reloaded on change.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    logging::init(&config.observability);
    tracing::info!("idea-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        apex_domain = %config.domain.apex_domain,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    // The watcher stops when dropped, so it lives until main returns.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let server = HttpServer::new(config.clone())?;

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let admin_app = setup_admin_router(server.state().clone());
        let mut admin_shutdown = shutdown.subscribe();
        tracing::info!(address = %config.admin.bind_address, "Admin API listening");
        tokio::spawn(async move {
            let result = axum::serve(admin_listener, admin_app)
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin server failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    shutdown_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
