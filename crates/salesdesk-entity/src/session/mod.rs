//! Session domain entities.

pub mod model;
pub mod token;

pub use model::{Session, SessionMetadata};
pub use token::RevokedToken;
