use serde::{Deserialize, Serialize};

use crate::types::form_errors::FieldErrors;

/// Error envelope returned by the JSON endpoints.
///
/// `errors` carries per-field messages when the failure is a validation
/// failure; it is omitted otherwise.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message: message.to_string(),
            errors: None,
        }
    }

    pub fn with_errors(code: &str, message: &str, errors: FieldErrors) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(code, message)
        }
    }
}

/// Shape returned by `/api/generate-certificate` when forwarding fails.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyErrorResponse {
    pub error: String,
    pub details: String,
}

impl ProxyErrorResponse {
    pub fn backend(details: impl Into<String>) -> Self {
        Self {
            error: "Backend error".to_string(),
            details: details.into(),
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self {
            error: "Internal server error".to_string(),
            details: details.into(),
        }
    }
}
