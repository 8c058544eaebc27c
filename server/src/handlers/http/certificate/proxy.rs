use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde_json::Value;
use shared::types::ProxyErrorResponse;
use tracing::{error, info};

use crate::AppState;
use crate::backend::GeneratorError;
use crate::handlers::http::utils::{deliver_serialized_json, read_body};

/// `POST /api/generate-certificate`: pass a ready-made payload straight to
/// the generator and relay its answer.
pub async fn handle_generate_proxy<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = state.config.read().await.server.max_body_bytes;

    let payload = match read_body(req.into_body(), limit).await {
        Ok(body) => serde_json::from_slice::<Value>(&body).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let payload = match payload {
        Ok(payload) => payload,
        Err(details) => {
            error!("Unreadable generate-certificate request: {}", details);
            return deliver_serialized_json(
                &ProxyErrorResponse::internal(details),
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };

    match state.generator.generate(&payload).await {
        Ok(reply) => {
            info!("Relayed certificate generation");
            deliver_serialized_json(&reply, StatusCode::OK)
        }
        Err(GeneratorError::Status { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            deliver_serialized_json(&ProxyErrorResponse::backend(body), status)
        }
        Err(e) => {
            error!("Error in generate-certificate relay: {}", e);
            deliver_serialized_json(
                &ProxyErrorResponse::internal(e.to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
