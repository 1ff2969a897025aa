//! In-memory audit repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use salesdesk_core::result::AppResult;
use salesdesk_core::types::pagination::{PageRequest, PageResponse};
use salesdesk_entity::audit::{AuditEvent, AuditFilter};

use crate::repositories::AuditRepository;

#[derive(Debug, Default)]
pub struct MemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRepository for MemoryAuditRepository {
    async fn insert(&self, event: &AuditEvent) -> AppResult<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn search(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditEvent>> {
        let mut matched: Vec<AuditEvent> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(PageResponse::from_sorted(matched, page))
    }
}
