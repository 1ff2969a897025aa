//! Request and response DTOs. Field names are camelCase on the wire.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
