//! # salesdesk-core
//!
//! Core crate for SalesDesk. Contains the cache trait, configuration
//! schemas, pagination and response types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other SalesDesk crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorCode, ErrorKind};
pub use result::AppResult;
