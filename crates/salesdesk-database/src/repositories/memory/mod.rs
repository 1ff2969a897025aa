//! In-memory repository implementations.
//!
//! Used by the test suites and by single-node deployments that do not
//! need persistence. Each account's mutable state lives behind one map
//! entry, so per-account updates are serialized by the entry lock.

pub mod account;
pub mod audit;
pub mod binding;
pub mod session;

pub use account::MemoryAccountRepository;
pub use audit::MemoryAuditRepository;
pub use binding::MemoryBindingRepository;
pub use session::MemorySessionRepository;
