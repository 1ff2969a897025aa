//! Audit trail configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Default page size for audit queries.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u64 {
    20
}
