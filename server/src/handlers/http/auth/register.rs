use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response};
use shared::types::{FieldErrors, SIGN_UP_SUCCESS, SignUpData, append_error_params};
use tracing::{info, warn};

use crate::AppState;
use crate::backend::BackendError;
use crate::handlers::http::auth::{FORM_BODY_LIMIT, backend_error_param, base_url, request_host};
use crate::handlers::http::utils::{deliver_redirect, parse_form, read_body};

const SIGN_UP_FAILED: &str = "Fehler beim Erstellen des Accounts.";

/// Error cases for sign-up
pub enum RegistrationError {
    Invalid(FieldErrors),
    Backend(BackendError),
}

impl RegistrationError {
    fn to_params(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Invalid(errors) => errors.iter().collect(),
            // The backend does not tell a duplicate address apart from other
            // refusals, so both read as a generic failure.
            Self::Backend(e) => vec![backend_error_param(e, SIGN_UP_FAILED, SIGN_UP_FAILED)],
        }
    }
}

/// `POST /registrieren`
pub async fn handle_register<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    info!("Processing sign-up request");

    let host = request_host(&req);
    let base_url = base_url(host.as_deref(), &state).await;
    let body = read_body(req.into_body(), FORM_BODY_LIMIT)
        .await
        .context("Failed to read sign-up form")?;
    let form: SignUpData = parse_form(&body).context("Malformed sign-up form")?;

    sign_up(form, &base_url, &state).await
}

/// Validate and create the account. Success and failure both return to the
/// form; success carries the verification hint as `success`.
pub async fn sign_up(
    form: SignUpData,
    base_url: &str,
    state: &AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let return_to = form.return_to().to_string();

    let target = match attempt_sign_up(&form, state).await {
        Ok(()) => append_error_params(&return_to, base_url, [("success", SIGN_UP_SUCCESS)]),
        Err(e) => append_error_params(&return_to, base_url, e.to_params()),
    };

    deliver_redirect(&target)
}

async fn attempt_sign_up(form: &SignUpData, state: &AppState) -> Result<(), RegistrationError> {
    let account = form.validate().map_err(|errors| {
        warn!("Sign-up form invalid: {} field(s)", errors.len());
        RegistrationError::Invalid(errors)
    })?;

    state.auth.sign_up(&account).await.map_err(|e| {
        warn!("Sign-up for {} failed: {}", account.email, e);
        RegistrationError::Backend(e)
    })?;

    info!("Account created for {}", account.email);
    Ok(())
}
