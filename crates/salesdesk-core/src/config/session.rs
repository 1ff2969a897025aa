//! Session registry configuration.

use serde::{Deserialize, Serialize};

/// Session registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum concurrent refresh sessions per account. When a new login
    /// would exceed it, the oldest sessions are evicted. `0` disables the cap.
    #[serde(default = "default_max_per_account")]
    pub max_per_account: usize,
    /// Interval for expired session cleanup in minutes.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_per_account: default_max_per_account(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

fn default_max_per_account() -> usize {
    10
}

fn default_cleanup_interval() -> u64 {
    15
}
