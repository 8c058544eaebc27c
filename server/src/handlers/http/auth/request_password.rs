use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use shared::types::{RequestPasswordData, RequestPasswordResponse};
use tracing::{info, warn};

use crate::AppState;
use crate::handlers::http::auth::{FORM_BODY_LIMIT, backend_error_param, base_url, request_host};
use crate::handlers::http::utils::{deliver_serialized_json, parse_form, read_body};

/// Page the mailed link opens.
pub const RESET_PASSWORD_PATH: &str = "/reset-password";

/// `POST /request-password`. Always answers 200; the body says whether the
/// mail went out.
pub async fn handle_request_password<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    info!("Processing password reset request");

    let host = request_host(&req);
    let base_url = base_url(host.as_deref(), &state).await;
    let body = read_body(req.into_body(), FORM_BODY_LIMIT)
        .await
        .context("Failed to read password request form")?;
    let form: RequestPasswordData = parse_form(&body).context("Malformed password request form")?;

    let reply = request_password(form, &base_url, &state).await;
    deliver_serialized_json(&reply, StatusCode::OK)
}

pub async fn request_password(
    form: RequestPasswordData,
    base_url: &str,
    state: &AppState,
) -> RequestPasswordResponse {
    let email = match form.validate() {
        Ok(email) => email,
        Err(reply) => return reply,
    };

    let redirect_to = format!("{}{}", base_url.trim_end_matches('/'), RESET_PASSWORD_PATH);

    match state.auth.request_password_reset(&email, &redirect_to).await {
        Ok(()) => {
            info!("Password reset link requested for {}", email);
            RequestPasswordResponse::sent()
        }
        Err(e) => {
            warn!("Password reset for {} failed: {}", email, e);
            let (field, message) = backend_error_param(
                &e,
                "Es gab ein Problem beim Versenden der E-Mail.",
                "Ein unerwarteter Fehler ist aufgetreten.",
            );
            RequestPasswordResponse::single(field, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendErrorKind;
    use crate::test_support::{GeneratorOutcome, MockAuth, MockGenerator, test_state};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn generator() -> Arc<MockGenerator> {
        Arc::new(MockGenerator::new(GeneratorOutcome::Reply(json!({}))))
    }

    async fn reply_for(email: &str, auth: Arc<MockAuth>) -> Value {
        let state = test_state(auth, generator());
        let form = RequestPasswordData {
            email: email.into(),
        };
        let reply = request_password(form, "https://baum.example/", &state).await;
        serde_json::to_value(reply).unwrap()
    }

    #[tokio::test]
    async fn sent_link_points_at_reset_page() {
        let auth = Arc::new(MockAuth::default());
        let reply = reply_for(" anna@example.de ", auth.clone()).await;

        assert_eq!(reply["success"], true);
        assert!(reply["message"].as_str().unwrap().starts_with("Falls deine E-Mail existiert"));
        assert_eq!(
            auth.calls(),
            vec!["reset:anna@example.de:https://baum.example/reset-password".to_string()]
        );
    }

    #[tokio::test]
    async fn invalid_email_is_answered_without_backend() {
        let auth = Arc::new(MockAuth::default());
        let reply = reply_for("kein-at", auth.clone()).await;

        assert_eq!(reply["success"], false);
        assert_eq!(reply["errors"]["emailError"], "Ungültige E-Mail-Adresse");
        assert!(auth.calls().is_empty());
    }

    #[tokio::test]
    async fn backend_failures_map_to_messages() {
        let rejected = reply_for(
            "anna@example.de",
            Arc::new(MockAuth::failing(BackendErrorKind::Rejected)),
        )
        .await;
        assert_eq!(
            rejected["errors"]["authError"],
            "Es gab ein Problem beim Versenden der E-Mail."
        );

        let offline = reply_for(
            "anna@example.de",
            Arc::new(MockAuth::failing(BackendErrorKind::Connection)),
        )
        .await;
        assert!(offline["errors"]["connectionError"].is_string());
    }
}
