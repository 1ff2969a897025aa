//! Queue-backed audit trail.
//!
//! `append` pushes onto an unbounded channel and returns immediately. A
//! single writer task drains the channel into the audit repository, so a
//! burst only delays writes. Events the repository rejects are logged at
//! error level and counted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use salesdesk_core::error::AppError;
use salesdesk_core::result::AppResult;
use salesdesk_core::types::pagination::{PageRequest, PageResponse};
use salesdesk_database::repositories::AuditRepository;
use salesdesk_entity::audit::{AuditEvent, AuditFilter, NewAuditEvent};

use super::sink::AuditSink;

enum Command {
    Record(NewAuditEvent),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct AuditTrail {
    tx: mpsc::UnboundedSender<Command>,
    repo: Arc<dyn AuditRepository>,
    lost: Arc<AtomicU64>,
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail")
            .field("lost_events", &self.lost_events())
            .finish()
    }
}

impl AuditTrail {
    /// Create the trail and spawn its writer on the current runtime.
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let lost = Arc::new(AtomicU64::new(0));
        tokio::spawn(run_writer(repo.clone(), rx, lost.clone()));
        Self { tx, repo, lost }
    }

    /// Events the repository failed to store, or that arrived after the
    /// writer stopped.
    pub fn lost_events(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    /// Wait until every event queued before this call has been written.
    pub async fn flush(&self) -> AppResult<()> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(Command::Flush(done))
            .map_err(|_| AppError::internal("Audit writer has stopped"))?;
        wait.await
            .map_err(|_| AppError::internal("Audit writer has stopped"))
    }

    /// Matching events, newest first, with the total count.
    pub async fn query(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditEvent>> {
        self.repo.search(filter, page).await
    }
}

impl AuditSink for AuditTrail {
    fn append(&self, event: NewAuditEvent) {
        if let Err(mpsc::error::SendError(command)) = self.tx.send(Command::Record(event)) {
            self.lost.fetch_add(1, Ordering::Relaxed);
            if let Command::Record(event) = command {
                error!(event = ?event, "Audit writer stopped, event dropped");
            }
        }
    }
}

async fn run_writer(
    repo: Arc<dyn AuditRepository>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    lost: Arc<AtomicU64>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Record(event) => {
                let event = event.into_event();
                match repo.insert(&event).await {
                    Ok(()) => debug!(action = %event.action, "Audit event written"),
                    Err(e) => {
                        lost.fetch_add(1, Ordering::Relaxed);
                        error!(error = %e, event = ?event, "Failed to write audit event");
                    }
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Audit writer stopped");
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use salesdesk_database::repositories::memory::MemoryAuditRepository;
    use salesdesk_entity::audit::AuditAction;
    use uuid::Uuid;

    use super::*;

    #[derive(Debug)]
    struct FailingRepository;

    #[async_trait]
    impl AuditRepository for FailingRepository {
        async fn insert(&self, _event: &AuditEvent) -> AppResult<()> {
            Err(AppError::database("connection refused"))
        }

        async fn search(
            &self,
            _filter: &AuditFilter,
            page: &PageRequest,
        ) -> AppResult<PageResponse<AuditEvent>> {
            Ok(PageResponse::new(vec![], page.page, page.page_size, 0))
        }
    }

    #[tokio::test]
    async fn appended_events_are_queryable_after_flush() {
        let trail = AuditTrail::new(Arc::new(MemoryAuditRepository::new()));
        let actor = Uuid::new_v4();
        trail.append(NewAuditEvent::new(AuditAction::LoginSuccess).actor(actor));
        trail.append(NewAuditEvent::new(AuditAction::Logout).actor(actor));
        trail.flush().await.unwrap();

        let filter = AuditFilter {
            actor_id: Some(actor),
            ..Default::default()
        };
        let page = trail.query(&filter, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn write_failures_are_counted_not_raised() {
        let trail = AuditTrail::new(Arc::new(FailingRepository));
        trail.append(NewAuditEvent::new(AuditAction::AccessDenied));
        trail.append(NewAuditEvent::new(AuditAction::AccessDenied));
        trail.flush().await.unwrap();

        assert_eq!(trail.lost_events(), 2);
    }

    #[tokio::test]
    async fn bursts_are_stored_in_full() {
        let trail = AuditTrail::new(Arc::new(MemoryAuditRepository::new()));
        let target = Uuid::new_v4();
        for _ in 0..2000 {
            trail.append(NewAuditEvent::new(AuditAction::LoginFailed).target(target));
        }
        trail.flush().await.unwrap();

        let filter = AuditFilter {
            target_id: Some(target),
            ..Default::default()
        };
        let page = trail.query(&filter, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_items, 2000);
        assert_eq!(trail.lost_events(), 0);
    }
}
