//! # salesdesk-database
//!
//! PostgreSQL connection management, migrations, and the repository
//! traits used by the identity core. Each trait has a PostgreSQL
//! implementation and an in-memory one for tests and single-node runs.

pub mod connection;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::Repositories;
