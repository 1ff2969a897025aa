//! The write side of the audit trail as seen by other components.

use salesdesk_entity::audit::NewAuditEvent;

/// Fire-and-forget audit writer. Implementations must never block the
/// caller on storage or report a write failure back to it.
pub trait AuditSink: Send + Sync + 'static {
    fn append(&self, event: NewAuditEvent);
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Collects events in memory.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<NewAuditEvent>>,
    }

    impl RecordingSink {
        pub fn actions(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.action.clone())
                .collect()
        }

        pub fn events(&self) -> Vec<NewAuditEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AuditSink for RecordingSink {
        fn append(&self, event: NewAuditEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
