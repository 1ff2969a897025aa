//! Token issuance, verification and rotation.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use salesdesk_core::config::auth::AuthConfig;
use salesdesk_core::result::AppResult;

use super::claims::Claims;
use super::decoder::JwtDecoder;
use super::encoder::JwtEncoder;
use super::refresh::RefreshToken;

/// An access token plus a freshly generated refresh token.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
    pub refresh_expires_at: DateTime<Utc>,
}

/// A standalone access token.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            refresh_ttl: Duration::days(config.refresh_ttl_days as i64),
        }
    }

    /// Lifetime of a refresh token / session.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_pair(&self, account_id: Uuid) -> AppResult<IssuedTokens> {
        let access = self.issue_access(account_id)?;
        Ok(IssuedTokens {
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: RefreshToken::generate(),
            refresh_expires_at: Utc::now() + self.refresh_ttl,
        })
    }

    pub fn issue_access(&self, account_id: Uuid) -> AppResult<AccessToken> {
        let (token, expires_at) = self.encoder.encode_access_token(account_id)?;
        Ok(AccessToken { token, expires_at })
    }

    /// Fails with `TOKEN_EXPIRED` or `TOKEN_INVALID`.
    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.decoder.decode_access_token(token)
    }

    /// A new opaque identifier to replace `_old`. Nothing is stored here;
    /// the swap happens in the session registry.
    pub fn rotate(&self, _old: &RefreshToken) -> RefreshToken {
        RefreshToken::generate()
    }
}
