use serde::{Deserialize, Serialize};

use crate::types::form_errors::FieldErrors;
use crate::types::login::check_email;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestPasswordData {
    #[serde(default)]
    pub email: String,
}

pub const RESET_LINK_SENT: &str = "Falls deine E-Mail existiert, haben wir dir soeben einen Link zum Zurücksetzen deines Passworts geschickt.";

/// Reply to the password-request form; the page renders it in place.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPasswordResponse {
    Success { success: bool, message: String },
    Failure { success: bool, errors: FieldErrors },
}

impl RequestPasswordResponse {
    pub fn sent() -> Self {
        Self::Success {
            success: true,
            message: RESET_LINK_SENT.to_string(),
        }
    }

    pub fn failed(errors: FieldErrors) -> Self {
        Self::Failure {
            success: false,
            errors,
        }
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::failed(errors)
    }
}

impl RequestPasswordData {
    pub fn validate(&self) -> Result<String, RequestPasswordResponse> {
        check_email(&self.email).map_err(|m| RequestPasswordResponse::single("emailError", m))
    }
}
