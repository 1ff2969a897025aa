//! Access tokens (signed, stateless) and refresh tokens (opaque, stateful).

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod refresh;
pub mod service;

pub use claims::Claims;
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;
pub use refresh::RefreshToken;
pub use service::{IssuedTokens, TokenService};
