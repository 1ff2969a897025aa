//! Expired session sweeper.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use salesdesk_core::result::AppResult;

use super::registry::SessionRegistry;

/// Periodically purges sessions past their natural expiry.
#[derive(Debug, Clone)]
pub struct SessionCleanup {
    registry: Arc<SessionRegistry>,
    interval: Duration,
}

impl SessionCleanup {
    pub fn new(registry: Arc<SessionRegistry>, interval_minutes: u64) -> Self {
        Self {
            registry,
            interval: Duration::from_secs(interval_minutes.max(1) * 60),
        }
    }

    /// Run one cleanup cycle. Returns the number of sessions removed.
    pub async fn run_cleanup(&self) -> AppResult<u64> {
        let purged = self.registry.purge_expired().await?;
        if purged > 0 {
            info!(purged = purged, "Expired sessions purged");
        }
        Ok(purged)
    }

    /// Spawn the sweeper loop on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_cleanup().await {
                    error!(error = %e, "Session cleanup failed");
                }
            }
        })
    }
}
