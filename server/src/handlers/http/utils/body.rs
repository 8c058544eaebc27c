use std::collections::HashMap;
use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("failed to read request body: {0}")]
    Read(String),

    #[error("missing multipart boundary")]
    MissingBoundary,

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),
}

/// Collect a request body, refusing anything larger than `limit` bytes.
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            debug!("Read request body: {} bytes", bytes.len());
            Ok(bytes)
        }
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Request body rejected, limit is {} bytes", limit);
            Err(BodyError::TooLarge(limit))
        }
        Err(e) => Err(BodyError::Read(e.to_string())),
    }
}

/// Decode an `application/x-www-form-urlencoded` body into a typed form.
/// Every value arrives as a string; the target type decides what is optional.
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    let fields: Map<String, Value> = form_urlencoded::parse(body)
        .into_owned()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    serde_json::from_value(Value::Object(fields))
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Text fields and files of one `multipart/form-data` submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Text value of `name`, empty when absent.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Text value of `name`, `None` when the field was not sent at all.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Parse a buffered multipart body. A file input left empty by the browser
/// (no name, no bytes) is treated as absent.
pub async fn parse_multipart(
    content_type: Option<&str>,
    body: Bytes,
) -> Result<MultipartForm, BodyError> {
    let boundary = content_type
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(BodyError::MissingBoundary)?;

    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut form = MultipartForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_default();
                let bytes = field.bytes().await?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                debug!("Multipart file {}: {} ({} bytes)", name, file_name, bytes.len());
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                );
            }
            None => {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }
    }

    Ok(form)
}
