use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::types::form_errors::FieldErrors;

// ---------------------------------------------------------------------------
// Sign-in wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInData {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "returnTo")]
    pub return_to: Option<String>,
}

/// Default page the sign-in form returns to on failure.
pub const SIGN_IN_RETURN: &str = "/login";

// ---------------------------------------------------------------------------
// Shared field rules
// ---------------------------------------------------------------------------

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex"));

/// Email rule shared by sign-in, sign-up and the password request.
/// Returns the trimmed address or the German field message.
pub fn check_email(raw: &str) -> Result<String, &'static str> {
    let email = raw.trim();
    if email.is_empty() {
        return Err("E-Mail ist erforderlich");
    }
    if email.chars().count() > 255 {
        return Err("E-Mail ist zu lang");
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Ungültige E-Mail-Adresse");
    }
    Ok(email.to_string())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

impl SignInData {
    pub fn return_to(&self) -> &str {
        self.return_to
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(SIGN_IN_RETURN)
    }

    pub fn validate(&self) -> Result<SignInCredentials, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = check_email(&self.email)
            .map_err(|msg| errors.add("emailError", msg))
            .ok();

        if self.password.is_empty() {
            errors.add("passwordError", "Passwort ist erforderlich");
        }

        match (email, errors.is_empty()) {
            (Some(email), true) => Ok(SignInCredentials {
                email,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}
