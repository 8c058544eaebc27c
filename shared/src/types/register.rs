use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::form_errors::FieldErrors;
use crate::types::login::check_email;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpData {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    /// Checkbox value; browsers send `on` when ticked.
    #[serde(default)]
    pub terms_privacy: Option<String>,
    #[serde(default)]
    pub terms_agb: Option<String>,
    #[serde(default, rename = "returnTo")]
    pub return_to: Option<String>,
}

/// Default page the sign-up form returns to.
pub const SIGN_UP_RETURN: &str = "/registrieren";

pub const SIGN_UP_SUCCESS: &str = "Account erstellt. Bitte verifizieren Sie Ihre E-Mail-Adresse.";

/// Validated sign-up, ready to send to the identity backend. The profile
/// fields travel as user metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip)]
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub terms_privacy: bool,
    pub terms_agb: bool,
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

static NAME_LETTERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-zÄäÖöÜüß\s-]*$").expect("static name regex"));

const FORBIDDEN_CHARS: [char; 3] = ['\'', '"', ';'];

pub fn check_name(raw: &str) -> Result<String, &'static str> {
    if raw.is_empty() {
        return Err("Name ist erforderlich");
    }
    if raw.chars().count() > 100 {
        return Err("Name ist zu lang");
    }
    if raw.contains(FORBIDDEN_CHARS) {
        return Err("Name enthält ungültige Zeichen");
    }
    if !NAME_LETTERS_RE.is_match(raw) {
        return Err("Name darf nur Buchstaben enthalten");
    }
    Ok(raw.to_string())
}

pub fn check_password(raw: &str) -> Result<(), &'static str> {
    let len = raw.chars().count();
    if len < 8 {
        return Err("Mindestens 8 Zeichen erforderlich");
    }
    if len > 100 {
        return Err("Passwort ist zu lang");
    }
    if !raw.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Mindestens ein Großbuchstabe erf.");
    }
    if !raw.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Mindestens ein Kleinbuchstabe erf.");
    }
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        return Err("Mindestens eine Zahl erf.");
    }
    if raw.contains(FORBIDDEN_CHARS) {
        return Err("Passwort enthält ungültige Zeichen");
    }
    Ok(())
}

fn checked(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("on") | Some("true") | Some("1"))
}

impl SignUpData {
    pub fn return_to(&self) -> &str {
        self.return_to
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(SIGN_UP_RETURN)
    }

    /// Collects one message per failing field, keyed `<field>Error`.
    pub fn validate(&self) -> Result<NewAccount, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = check_name(&self.first_name)
            .map_err(|m| errors.add("firstNameError", m))
            .ok();
        let last_name = check_name(&self.last_name)
            .map_err(|m| errors.add("lastNameError", m))
            .ok();
        let email = check_email(&self.email)
            .map_err(|m| errors.add("emailError", m))
            .ok();

        if let Err(m) = check_password(&self.password) {
            errors.add("passwordError", m);
        }

        if self.confirm_password.is_empty() {
            errors.add("confirmPasswordError", "Ist erforderlich");
        } else if self.confirm_password != self.password {
            errors.add("confirmPasswordError", "Passwörter stimmen nicht überein");
        }

        let terms_privacy = checked(&self.terms_privacy);
        if !terms_privacy {
            errors.add(
                "termsPrivacyError",
                "Du musst die Datenschutzerklärung akzeptieren",
            );
        }

        let terms_agb = checked(&self.terms_agb);
        if !terms_agb {
            errors.add("termsAgbError", "Du musst die AGB akzeptieren");
        }

        match (first_name, last_name, email) {
            (Some(first_name), Some(last_name), Some(email)) if errors.is_empty() => {
                Ok(NewAccount {
                    email,
                    password: self.password.clone(),
                    first_name,
                    last_name,
                    terms_privacy,
                    terms_agb,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SignUpData {
        SignUpData {
            first_name: "Jörg".into(),
            last_name: "Müller-Lüdenscheid".into(),
            email: "joerg@example.de".into(),
            password: "Baumhaus42".into(),
            confirm_password: "Baumhaus42".into(),
            terms_privacy: Some("on".into()),
            terms_agb: Some("on".into()),
            return_to: None,
        }
    }

    #[test]
    fn valid_sign_up_passes() {
        let account = valid().validate().unwrap();
        assert_eq!(account.first_name, "Jörg");
        assert!(account.terms_agb && account.terms_privacy);
    }

    #[test]
    fn password_rules_report_first_failure() {
        assert_eq!(check_password("kurz"), Err("Mindestens 8 Zeichen erforderlich"));
        assert_eq!(check_password("alleklein1"), Err("Mindestens ein Großbuchstabe erf."));
        assert_eq!(check_password("ALLEGROSS1"), Err("Mindestens ein Kleinbuchstabe erf."));
        assert_eq!(check_password("OhneZahlen"), Err("Mindestens eine Zahl erf."));
        assert_eq!(check_password("Mit;Semi1"), Err("Passwort enthält ungültige Zeichen"));
    }

    #[test]
    fn name_rejects_digits_and_quotes() {
        assert_eq!(check_name("R2D2"), Err("Name darf nur Buchstaben enthalten"));
        assert_eq!(check_name("O'Neil"), Err("Name enthält ungültige Zeichen"));
    }

    #[test]
    fn mismatched_confirmation_is_reported() {
        let mut data = valid();
        data.confirm_password = "Anders123".into();
        let errors = data.validate().unwrap_err();
        assert_eq!(
            errors.get("confirmPasswordError"),
            Some("Passwörter stimmen nicht überein")
        );
    }

    #[test]
    fn unticked_terms_are_both_reported() {
        let mut data = valid();
        data.terms_privacy = None;
        data.terms_agb = Some("off".into());
        let errors = data.validate().unwrap_err();
        assert!(errors.contains("termsPrivacyError"));
        assert!(errors.contains("termsAgbError"));
        assert_eq!(errors.len(), 2);
    }
}
