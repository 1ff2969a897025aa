//! # salesdesk-api
//!
//! HTTP API layer for the SalesDesk identity core built on Axum.
//!
//! Provides the auth, session, admin and company membership endpoints,
//! middleware (rate limiting, CORS, logging), extractors, DTOs, and the
//! mapping from `AppError` to the JSON error envelope.

pub mod cookie;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
