//! Periodic removal of expired gatekeeper entries.
//!
//! Purely a memory bound: every read already applies expiry, so running or
//! not running the sweeper never changes an admit/lockout decision.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use super::Gatekeeper;

pub struct Sweeper {
    gatekeeper: Arc<Gatekeeper>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(gatekeeper: Arc<Gatekeeper>, interval: Duration) -> Self {
        Self {
            gatekeeper,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::info!("Gatekeeper sweeper disabled");
            return;
        }

        tracing::info!(interval_secs = self.interval.as_secs(), "Gatekeeper sweeper starting");

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; nothing can have expired yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.gatekeeper.sweep();
                    tracing::debug!(
                        windows = stats.windows,
                        lockouts = stats.lockouts,
                        "Swept expired gatekeeper entries"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Gatekeeper sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
