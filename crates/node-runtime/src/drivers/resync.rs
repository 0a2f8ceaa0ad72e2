//! # Periodic Resync

use sl_06_chain_sync::SyncEngine;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Re-runs [`SyncEngine::synchronize_all`] on a fixed interval.
pub struct ResyncDriver {
    engine: SyncEngine,
    interval: Duration,
}

impl ResyncDriver {
    /// Driver using the engine's configured interval.
    pub fn new(engine: SyncEngine) -> Self {
        let interval = Duration::from_secs(engine.config().resync_interval_secs.max(1));
        Self { engine, interval }
    }

    /// One pass over every served group. Returns how many groups changed.
    pub async fn resync_once(&self) -> usize {
        let mut changed = 0;
        for (group, result) in self.engine.synchronize_all().await {
            match result {
                Ok(outcome) if outcome.mutated() => {
                    info!("[runtime] resync of group {}: {:?}", group, outcome);
                    changed += 1;
                }
                Ok(outcome) => debug!("[runtime] resync of group {}: {:?}", group, outcome),
                Err(err) => warn!("[runtime] resync of group {} failed: {}", group, err),
            }
        }
        changed
    }

    /// Run until `shutdown` flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires at once; startup already synchronized.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            // Never cancelled midway: reconciliation must run to the end.
            self.resync_once().await;
        }
        info!("[runtime] resync driver stopped");
    }
}
