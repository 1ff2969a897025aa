//! PostgreSQL repository implementations.

pub mod account;
pub mod audit;
pub mod binding;
pub mod session;

pub use account::PgAccountRepository;
pub use audit::PgAuditRepository;
pub use binding::PgBindingRepository;
pub use session::PgSessionRepository;
