use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response};
use tracing::info;

use crate::AppState;
use crate::auth::{LOGIN_PATH, TOKEN_COOKIE};
use crate::handlers::http::utils::{delete_cookie, deliver_redirect_with_cookie};

/// Handle sign-out: drop the token cookie and go back to the sign-in page.
/// The token itself stays valid until it expires; nothing server-side
/// remembers it.
pub async fn handle_logout<B>(
    _req: Request<B>,
    _state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("User signed out");

    let clear_cookie = delete_cookie(TOKEN_COOKIE).context("Failed to build sign-out cookie")?;
    deliver_redirect_with_cookie(LOGIN_PATH, Some(clear_cookie))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{GeneratorOutcome, MockAuth, MockGenerator, test_state};
    use http_body_util::Empty;
    use hyper::{StatusCode, header};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn sign_out_expires_cookie_and_redirects() {
        let state = test_state(
            Arc::new(MockAuth::default()),
            Arc::new(MockGenerator::new(GeneratorOutcome::Reply(json!({})))),
        );
        let req = Request::post("/logout").body(Empty::<Bytes>::new()).unwrap();

        let res = handle_logout(req, state).await.unwrap();

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/login");
        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("access_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
