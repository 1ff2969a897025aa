//! Company membership entities: roles, permission flags and bindings.

pub mod binding;
pub mod permission;
pub mod role;

pub use binding::CompanyRoleBinding;
pub use permission::{Permission, PermissionSet};
pub use role::CompanyRole;
