//! Access token signing.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use salesdesk_core::config::auth::AuthConfig;
use salesdesk_core::error::AppError;

use super::claims::Claims;

/// Signs HS256 access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    access_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

impl JwtEncoder {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(config.jwt_access_ttl_minutes as i64),
        }
    }

    /// Sign a fresh access token for `account_id`.
    pub fn encode_access_token(
        &self,
        account_id: Uuid,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = now + self.access_ttl;
        let claims = Claims {
            sub: account_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = self.encode_claims(&claims)?;
        Ok((token, exp))
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))
    }
}
