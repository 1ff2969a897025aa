//! # salesdesk-auth
//!
//! Authentication and multi-tenant authorization for SalesDesk.
//!
//! ## Modules
//!
//! - `token`: access token signing/verification and opaque refresh tokens
//! - `password`: Argon2id hashing and password policy
//! - `revocation`: revoked refresh tokens with TTL
//! - `lockout`: failed login counter and temporary lock
//! - `session`: refresh session registry, login/refresh/logout flows, sweeper
//! - `rbac`: company role, level and permission gates plus membership management
//! - `audit`: fire-and-forget audit trail
//! - `account`: registration, verification, password reset and administration

pub mod account;
pub mod audit;
pub mod lockout;
pub mod password;
pub mod principal;
pub mod rbac;
pub mod revocation;
pub mod services;
pub mod session;
pub mod token;

pub use account::{AccountNotifier, AccountService, LogNotifier, RegisterAccount};
pub use audit::{AuditSink, AuditTrail};
pub use lockout::{FailureOutcome, LockoutPolicy};
pub use password::{PasswordHasher, PasswordValidator};
pub use principal::Principal;
pub use rbac::{MembershipManager, Requirement, RoleAuthority};
pub use revocation::RevocationList;
pub use services::AuthServices;
pub use session::{SessionCleanup, SessionManager, SessionRegistry};
pub use token::{Claims, IssuedTokens, RefreshToken, TokenService};
