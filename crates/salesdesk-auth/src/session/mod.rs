//! Refresh sessions: the registry, the login/refresh/logout flows and the
//! expired-session sweeper.

pub mod cleanup;
pub mod manager;
pub mod registry;

pub use cleanup::SessionCleanup;
pub use manager::{LoginOutcome, RefreshOutcome, SessionManager};
pub use registry::{AddedSession, SessionRegistry};
