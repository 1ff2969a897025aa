//! Opaque refresh tokens.
//!
//! A refresh token is 256 random bits, base64url encoded. Only its SHA-256
//! digest is ever stored or used as a cache key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// A refresh token together with its storage digest.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken {
    token: String,
    digest: String,
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshToken")
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl RefreshToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self::from_raw(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a token presented by a client.
    pub fn from_raw(token: impl Into<String>) -> Self {
        let token = token.into();
        let digest = digest(&token);
        Self { token, digest }
    }

    /// The value handed to the client.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The hex SHA-256 digest stored at rest.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Hex-encoded SHA-256 of a raw token.
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
