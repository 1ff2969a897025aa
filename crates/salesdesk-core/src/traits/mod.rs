//! Core traits defined in `salesdesk-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
