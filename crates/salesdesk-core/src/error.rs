//! Unified application error types for SalesDesk.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Every error carries a stable
//! [`ErrorCode`] that clients can branch on; the HTTP layer derives the
//! status from [`AppError::status_code`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Credential or account-state check failed during sign-in.
    Authentication,
    /// A presented token is missing, malformed, expired, revoked or unknown.
    Token,
    /// The caller does not have permission to perform the action.
    Authorization,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, concurrent modification, etc.).
    Conflict,
    /// A rate limit was exceeded.
    RateLimit,
    /// An internal server error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A cache error occurred.
    Cache,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
}

impl ErrorKind {
    /// The error code used when a constructor does not pick a specific one.
    pub fn default_code(&self) -> ErrorCode {
        match self {
            Self::NotFound => ErrorCode::NotFound,
            Self::Authentication => ErrorCode::InvalidCredentials,
            Self::Token => ErrorCode::TokenInvalid,
            Self::Authorization => ErrorCode::Forbidden,
            Self::Validation => ErrorCode::ValidationError,
            Self::Conflict => ErrorCode::Conflict,
            Self::RateLimit => ErrorCode::RateLimited,
            Self::ServiceUnavailable => ErrorCode::ServiceUnavailable,
            Self::Internal
            | Self::Database
            | Self::Cache
            | Self::Configuration
            | Self::Serialization => ErrorCode::InternalServerError,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Token => write!(f, "TOKEN"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Cache => write!(f, "CACHE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// Stable, client-facing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    WeakPassword,
    InvalidCredentials,
    AccountBlocked,
    AccountLocked,
    EmailNotVerified,
    EmailAlreadyRegistered,
    InvalidVerificationCode,
    InvalidResetCode,
    OldPasswordIncorrect,
    Unauthorized,
    TokenInvalid,
    TokenExpired,
    TokenRevoked,
    SessionNotFound,
    Forbidden,
    InsufficientPermission,
    InsufficientRoleLevel,
    UserNotFound,
    UserNotInCompany,
    AlreadyMember,
    NotFound,
    Conflict,
    RateLimited,
    ServiceUnavailable,
    InternalServerError,
}

impl ErrorCode {
    /// Return the wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountBlocked => "ACCOUNT_BLOCKED",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::InvalidVerificationCode => "INVALID_VERIFICATION_CODE",
            Self::InvalidResetCode => "INVALID_RESET_CODE",
            Self::OldPasswordIncorrect => "OLD_PASSWORD_INCORRECT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::InsufficientPermission => "INSUFFICIENT_PERMISSION",
            Self::InsufficientRoleLevel => "INSUFFICIENT_ROLE_LEVEL",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserNotInCompany => "USER_NOT_IN_COMPANY",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout SalesDesk.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind} ({code}): {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// The stable client-facing code.
    pub code: ErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error with the kind's default code.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.default_code(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an explicit code.
    pub fn coded(kind: ErrorKind, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            code: kind.default_code(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Replace the code of an existing error.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a rate-limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    /// Missing or unusable bearer credential.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::coded(ErrorKind::Token, ErrorCode::Unauthorized, message)
    }

    /// Create an authorization error with the generic `FORBIDDEN` code.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Wrong email or password. The message never says which one.
    pub fn invalid_credentials() -> Self {
        Self::coded(
            ErrorKind::Authentication,
            ErrorCode::InvalidCredentials,
            "Invalid email or password",
        )
    }

    pub fn account_blocked() -> Self {
        Self::coded(
            ErrorKind::Authentication,
            ErrorCode::AccountBlocked,
            "Your account has been blocked",
        )
    }

    /// The account is temporarily locked after too many failed attempts.
    pub fn account_locked() -> Self {
        Self::coded(
            ErrorKind::Authentication,
            ErrorCode::AccountLocked,
            "Account is temporarily locked due to too many failed login attempts",
        )
    }

    pub fn email_not_verified() -> Self {
        Self::coded(
            ErrorKind::Authentication,
            ErrorCode::EmailNotVerified,
            "Please verify your email before logging in",
        )
    }

    pub fn token_invalid() -> Self {
        Self::coded(ErrorKind::Token, ErrorCode::TokenInvalid, "Invalid token")
    }

    pub fn token_expired() -> Self {
        Self::coded(ErrorKind::Token, ErrorCode::TokenExpired, "Token has expired")
    }

    pub fn token_revoked() -> Self {
        Self::coded(
            ErrorKind::Token,
            ErrorCode::TokenRevoked,
            "Token has been revoked",
        )
    }

    /// The refresh token does not name an active session.
    pub fn session_not_found() -> Self {
        Self::coded(
            ErrorKind::Token,
            ErrorCode::SessionNotFound,
            "Session not found",
        )
    }

    pub fn insufficient_permission(message: impl Into<String>) -> Self {
        Self::coded(
            ErrorKind::Authorization,
            ErrorCode::InsufficientPermission,
            message,
        )
    }

    pub fn insufficient_role_level(message: impl Into<String>) -> Self {
        Self::coded(
            ErrorKind::Authorization,
            ErrorCode::InsufficientRoleLevel,
            message,
        )
    }

    /// HTTP status code for this error.
    ///
    /// Account-state failures during sign-in (blocked, locked, unverified)
    /// are 403; every other authentication or token failure is 401.
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ErrorKind::Authentication => match self.code {
                ErrorCode::AccountBlocked
                | ErrorCode::AccountLocked
                | ErrorCode::EmailNotVerified => 403,
                _ => 401,
            },
            ErrorKind::Token => 401,
            ErrorKind::Authorization => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::RateLimit => 429,
            ErrorKind::ServiceUnavailable => 503,
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Cache
            | ErrorKind::Configuration
            | ErrorKind::Serialization => 500,
        }
    }

    /// Whether the message is safe to show to the caller.
    pub fn is_operational(&self) -> bool {
        !matches!(
            self.kind,
            ErrorKind::Internal
                | ErrorKind::Database
                | ErrorKind::Cache
                | ErrorKind::Configuration
                | ErrorKind::Serialization
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            code: self.code,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
