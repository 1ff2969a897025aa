//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Refresh token (session) lifetime in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_days: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Minimum zxcvbn score (0-4) a new password must reach.
    #[serde(default = "default_password_strength")]
    pub password_min_strength: u8,
    /// Consecutive failed logins that lock the account.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: i32,
    /// Account lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
    /// Lifetime of email verification codes in minutes.
    #[serde(default = "default_code_ttl")]
    pub verification_code_ttl_minutes: u64,
    /// Lifetime of password reset codes in minutes.
    #[serde(default = "default_code_ttl")]
    pub reset_code_ttl_minutes: u64,
    /// Wrong guesses after which a reset code is discarded.
    #[serde(default = "default_reset_code_attempts")]
    pub reset_code_max_attempts: i32,
    /// Whether login is refused until the email address is verified.
    #[serde(default = "default_true")]
    pub require_email_verification: bool,
    /// Global role that grants user administration and audit access.
    #[serde(default = "default_admin_role")]
    pub admin_global_role: String,
    /// Refresh token cookie attributes.
    #[serde(default)]
    pub cookie: RefreshCookieConfig,
    /// Per-ip throttling of login and registration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_access_ttl_minutes: default_access_ttl(),
            refresh_ttl_days: default_refresh_ttl(),
            password_min_length: default_password_min(),
            password_min_strength: default_password_strength(),
            max_failed_attempts: default_max_failed(),
            lockout_duration_minutes: default_lockout(),
            verification_code_ttl_minutes: default_code_ttl(),
            reset_code_ttl_minutes: default_code_ttl(),
            reset_code_max_attempts: default_reset_code_attempts(),
            require_email_verification: true,
            admin_global_role: default_admin_role(),
            cookie: RefreshCookieConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Refresh token cookie attributes. The cookie is always HttpOnly and
/// SameSite=Strict; only the name, path and Secure flag are tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshCookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Set to `false` only for plain-http local development.
    #[serde(default = "default_true")]
    pub secure: bool,
}

impl Default for RefreshCookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            path: default_cookie_path(),
            secure: true,
        }
    }
}

/// Fixed-window rate limit for unauthenticated endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per window per client ip.
    #[serde(default = "default_rate_max")]
    pub max_requests: u32,
    #[serde(default = "default_rate_window")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_rate_max(),
            window_seconds: default_rate_window(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    7
}

fn default_password_min() -> usize {
    8
}

fn default_password_strength() -> u8 {
    2
}

fn default_max_failed() -> i32 {
    5
}

fn default_lockout() -> u64 {
    15
}

fn default_code_ttl() -> u64 {
    15
}

fn default_reset_code_attempts() -> i32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_admin_role() -> String {
    "it_support".to_string()
}

fn default_cookie_name() -> String {
    "refreshToken".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_rate_max() -> u32 {
    5
}

fn default_rate_window() -> u64 {
    60
}
