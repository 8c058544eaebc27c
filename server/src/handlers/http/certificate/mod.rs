pub mod create;
pub mod preview;
pub mod proxy;

pub use create::handle_create_certificate;
pub use preview::handle_metadata_preview;
pub use proxy::handle_generate_proxy;

use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode, header};
use shared::types::fields;
use tracing::warn;

use crate::AppState;
use crate::certificate::{ImageMetadata, ImageUpload, extract_metadata};
use crate::handlers::http::utils::{
    BodyError, MultipartForm, deliver_error_json, get_header_value, parse_multipart, read_body,
};

/// Buffer and parse a multipart upload. The inner `Err` is a ready-made
/// client error (413 or 400).
pub async fn read_upload_form<B>(
    req: Request<B>,
    state: &AppState,
) -> Result<Result<MultipartForm, Response<BoxBody<Bytes, Infallible>>>>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = state.config.read().await.server.max_body_bytes;
    let content_type = get_header_value(req.headers(), header::CONTENT_TYPE.as_str());

    let body = match read_body(req.into_body(), limit).await {
        Ok(body) => body,
        Err(BodyError::TooLarge(_)) => {
            return deliver_error_json(
                "PAYLOAD_TOO_LARGE",
                "Das Bild darf maximal 10 MB groß sein",
                StatusCode::PAYLOAD_TOO_LARGE,
            )
            .map(Err);
        }
        Err(e) => return Err(e).context("Failed to read upload"),
    };

    match parse_multipart(content_type.as_deref(), body).await {
        Ok(form) => Ok(Ok(form)),
        Err(e) => {
            warn!("Rejected upload form: {}", e);
            deliver_error_json(
                "BAD_REQUEST",
                "Formular konnte nicht gelesen werden",
                StatusCode::BAD_REQUEST,
            )
            .map(Err)
        }
    }
}

/// The `treeImage` part, if one was sent.
pub fn take_tree_image(form: &mut MultipartForm) -> Option<ImageUpload> {
    form.take_file(fields::TREE_IMAGE).map(|file| ImageUpload {
        name: file.file_name,
        mime_type: file.content_type,
        bytes: file.bytes,
    })
}

/// EXIF of an accepted upload. Unreadable metadata is logged and treated
/// as absent.
pub fn read_metadata(upload: &ImageUpload) -> Option<ImageMetadata> {
    if upload.validate().is_err() {
        return None;
    }
    match extract_metadata(&upload.bytes) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Could not read metadata of {}: {}", upload.name, e);
            None
        }
    }
}
