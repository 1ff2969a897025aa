//! Append-only audit trail.

pub mod sink;
pub mod trail;

pub use sink::AuditSink;
pub use trail::AuditTrail;
