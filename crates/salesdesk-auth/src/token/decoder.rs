//! Access token validation.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use salesdesk_core::config::auth::AuthConfig;
use salesdesk_core::error::AppError;

use super::claims::Claims;

/// Verifies HS256 access tokens. Stateless: no store is consulted.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // seconds of clock skew
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decode and validate an access token.
    ///
    /// An expired signature maps to `TOKEN_EXPIRED`; every other failure
    /// (bad signature, malformed token, wrong algorithm) to `TOKEN_INVALID`.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AppError::token_expired(),
                _ => AppError::token_invalid(),
            })
    }
}
