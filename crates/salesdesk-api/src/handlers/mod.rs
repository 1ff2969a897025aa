//! Route handlers organized by domain.

pub mod admin;
pub mod auth;
pub mod companies;
pub mod health;
pub mod sessions;
