//! Company-scoped authorization and membership management.

pub mod authority;
pub mod membership;
pub mod requirement;

pub use authority::RoleAuthority;
pub use membership::MembershipManager;
pub use requirement::Requirement;
