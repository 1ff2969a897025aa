//! Password policy for new passwords.

use salesdesk_core::config::auth::AuthConfig;
use salesdesk_core::error::{AppError, ErrorCode, ErrorKind};

/// Enforces a minimum length and a zxcvbn strength floor.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
    min_score: zxcvbn::Score,
}

impl PasswordValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let min_score = match config.password_min_strength {
            0 => zxcvbn::Score::Zero,
            1 => zxcvbn::Score::One,
            2 => zxcvbn::Score::Two,
            3 => zxcvbn::Score::Three,
            _ => zxcvbn::Score::Four,
        };
        Self {
            min_length: config.password_min_length,
            min_score,
        }
    }

    /// Check a candidate password. `user_inputs` (name, email) are
    /// penalized by the strength estimator.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(weak(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        let estimate = zxcvbn::zxcvbn(password, user_inputs);
        if estimate.score() < self.min_score {
            return Err(weak(
                "Password is too weak. Please use a longer or less predictable password.",
            ));
        }

        Ok(())
    }

    pub fn validate_not_same(&self, old_password: &str, new_password: &str) -> Result<(), AppError> {
        if old_password == new_password {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

fn weak(message: impl Into<String>) -> AppError {
    AppError::coded(ErrorKind::Validation, ErrorCode::WeakPassword, message)
}
