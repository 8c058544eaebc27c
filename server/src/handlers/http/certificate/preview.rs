use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use shared::types::{FieldErrors, LocationBlock, MetadataBlock, fields};
use tracing::{debug, info};

use crate::AppState;
use crate::certificate::{ImageUpload, LocationSource, UploadError, location_block};
use crate::handlers::http::certificate::{read_metadata, read_upload_form, take_tree_image};
use crate::handlers::http::utils::{deliver_serialized_json, deliver_validation_errors};

/// What the form shows right after a photo is picked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPreview {
    pub status: &'static str,
    pub metadata: Option<MetadataBlock>,
    /// Orientation the photo will be straightened from.
    pub orientation: Option<&'static str>,
    pub location: Option<LocationBlock>,
}

/// `POST /zertifikate/metadaten`
pub async fn handle_metadata_preview<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut form = match read_upload_form(req, &state).await? {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection),
    };

    let upload = take_tree_image(&mut form);
    let upload = match check_upload(upload) {
        Ok(upload) => upload,
        Err(errors) => return deliver_validation_errors(errors),
    };

    let preview = preview_for(&upload)?;
    deliver_serialized_json(&preview, StatusCode::OK)
}

fn check_upload(upload: Option<ImageUpload>) -> Result<ImageUpload, FieldErrors> {
    let result = upload
        .ok_or(UploadError::Missing)
        .and_then(|u| u.validate().map(|_| u));

    result.map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.add(fields::TREE_IMAGE, e.user_message());
        errors
    })
}

pub fn preview_for(upload: &ImageUpload) -> Result<MetadataPreview> {
    let metadata = read_metadata(upload);

    let location = match metadata.as_ref().and_then(|m| m.location()) {
        Some(point) => Some(
            location_block(&LocationSource::Exif(point)).context("Failed to render location code")?,
        ),
        None => None,
    };

    match &metadata {
        Some(_) => info!("Read metadata of {} (gps: {})", upload.name, location.is_some()),
        None => debug!("{} carries no readable metadata", upload.name),
    }

    Ok(MetadataPreview {
        status: "success",
        orientation: metadata.as_ref().and_then(|m| m.orientation).map(|o| o.label()),
        metadata: metadata.as_ref().map(|m| m.to_block()),
        location,
    })
}
