use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response};
use shared::types::{FieldErrors, SignInData, append_error_params};
use tracing::{error, info, warn};

use crate::AppState;
use crate::auth::token::{TokenError, issue_token};
use crate::backend::BackendError;
use crate::handlers::http::auth::{FORM_BODY_LIMIT, backend_error_param, base_url, request_host};
use crate::handlers::http::utils::{
    create_token_cookie, deliver_redirect, deliver_redirect_with_cookie, parse_form, read_body,
};

/// Where a signed-in user lands.
pub const SIGN_IN_TARGET: &str = "/";

const SIGN_IN_FAILED: &str = "Fehler beim Einloggen";

/// Why a sign-in did not go through
pub enum LoginError {
    Invalid(FieldErrors),
    Backend(BackendError),
    Token(TokenError),
}

impl LoginError {
    fn to_params(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Invalid(errors) => errors.iter().collect(),
            Self::Backend(e) => vec![backend_error_param(e, "Falsche E-Mail oder Passwort", SIGN_IN_FAILED)],
            Self::Token(_) => vec![("authError", SIGN_IN_FAILED)],
        }
    }
}

/// `POST /login`
pub async fn handle_login<B>(req: Request<B>, state: AppState) -> Result<Response<BoxBody<Bytes, Infallible>>>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    info!("Processing sign-in request");

    let host = request_host(&req);
    let base_url = base_url(host.as_deref(), &state).await;
    let body = read_body(req.into_body(), FORM_BODY_LIMIT)
        .await
        .context("Failed to read sign-in form")?;
    let form: SignInData = parse_form(&body).context("Malformed sign-in form")?;

    sign_in(form, &base_url, &state).await
}

/// Validate, authenticate against the backend, then issue the token cookie.
/// Every failure redirects back to the form with error parameters.
pub async fn sign_in(
    form: SignInData,
    base_url: &str,
    state: &AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let return_to = form.return_to().to_string();

    match attempt_sign_in(&form, state).await {
        Ok(token) => {
            let production = state.config.read().await.site.environment.is_production();
            let cookie = create_token_cookie(&token, production)
                .context("Failed to create token cookie")?;
            deliver_redirect_with_cookie(SIGN_IN_TARGET, Some(cookie))
        }
        Err(login_error) => {
            let target = append_error_params(&return_to, base_url, login_error.to_params());
            deliver_redirect(&target)
        }
    }
}

async fn attempt_sign_in(form: &SignInData, state: &AppState) -> Result<String, LoginError> {
    let credentials = form.validate().map_err(|errors| {
        warn!("Sign-in form invalid: {} field(s)", errors.len());
        LoginError::Invalid(errors)
    })?;

    let session = state
        .auth
        .sign_in(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            warn!("Sign-in for {} failed: {}", credentials.email, e);
            LoginError::Backend(e)
        })?;

    let roles = state.auth.user_roles(&session).await.unwrap_or_else(|e| {
        warn!("Could not load roles for {}: {}", session.user.id, e);
        Vec::new()
    });

    let email = session.user.email.as_deref().unwrap_or(&credentials.email);
    let token = issue_token(state.jwt_secret.as_bytes(), &session.user.id, Some(email), roles)
        .map_err(|e| {
            error!("Token signing failed: {}", e);
            LoginError::Token(e)
        })?;

    info!("User {} signed in", session.user.id);
    Ok(token)
}
