//! Platform administration handlers, guarded by the admin global role.

pub mod audit;
pub mod users;
