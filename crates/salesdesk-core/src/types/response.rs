//! Response envelopes shared by every endpoint.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Successful response body: `{ success, data, message }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }
}

/// Failure body: `{ success: false, data: null, message, errorCode }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub message: String,
    pub error_code: ErrorCode,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            error_code,
        }
    }
}
