//! # salesdesk-cache
//!
//! Cache provider implementations for SalesDesk. Supports two modes:
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//!   with per-entry expiry
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. The
//! refresh token revocation list and the login rate limiter live here.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
