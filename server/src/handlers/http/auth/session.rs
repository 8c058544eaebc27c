use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use shared::types::{JwtClaims, UserRole};
use tracing::debug;

use crate::AppState;
use crate::handlers::http::utils::{deliver_error_json, deliver_serialized_json};

#[derive(Debug, Serialize)]
struct SessionUser<'a> {
    id: &'a str,
    email: Option<&'a str>,
    roles: &'a [UserRole],
}

#[derive(Debug, Serialize)]
struct SessionResponse<'a> {
    status: &'static str,
    user: SessionUser<'a>,
}

/// Report who the current token belongs to. The gate attaches the claims
/// of a valid cookie to every `/api` request; without them the caller is
/// anonymous.
pub async fn handle_session<B>(
    req: Request<B>,
    _state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let Some(claims) = req.extensions().get::<JwtClaims>() else {
        return deliver_error_json("UNAUTHORIZED", "Nicht angemeldet", StatusCode::UNAUTHORIZED);
    };

    debug!("Session lookup for {}", claims.sub);

    deliver_serialized_json(
        &SessionResponse {
            status: "success",
            user: SessionUser {
                id: &claims.sub,
                email: claims.email.as_deref(),
                roles: &claims.roles,
            },
        },
        StatusCode::OK,
    )
}
