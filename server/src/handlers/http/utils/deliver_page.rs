use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http::HeaderValue;
use http_body_util::{BodyExt, Empty, Full, combinators::BoxBody};
use hyper::{Response, StatusCode, header};
use std::convert::Infallible;
use tracing::{debug, error, info};

use crate::handlers::http::utils::headers;

#[derive(Debug, Clone, Copy)]
pub enum CacheStrategy {
    Yes,      // 1 year
    Explicit, // No cache at all
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStrategy::Yes => write!(f, "Yes (1 year)"),
            CacheStrategy::Explicit => write!(f, "Explicit (no-cache)"),
        }
    }
}

/// Expand tilde (~) in path to home directory
fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path_ref: &Path = path.as_ref();
    let path_str: &str = path_ref.to_str().unwrap_or("");

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut home_path: PathBuf = PathBuf::from(home);
            home_path.push(rest);
            return home_path;
        }
    }

    path_ref.to_path_buf()
}

/// Deliver a file from disk with caching headers.
/// This is the core function that handles all file-based deliveries
pub async fn deliver_page_with_status<P: AsRef<Path>>(
    file_path: P,
    status: StatusCode,
    cache: CacheStrategy,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let expanded_path: PathBuf = expand_tilde(file_path);

    debug!(
        "Reading static file from: {} (cache: {})",
        expanded_path.display(),
        cache
    );

    let content: Vec<u8> = tokio::fs::read(&expanded_path)
        .await
        .with_context(|| format!("Failed to read static file: {}", expanded_path.display()))?;

    let content_bytes: Bytes = Bytes::from(content);
    let mime_type: &str = get_mime_type(&expanded_path);

    debug!(
        "Delivering static page with status: {}, size: {} bytes, mime: {}, cache: {}",
        status,
        content_bytes.len(),
        mime_type,
        cache
    );

    let response: Response<BoxBody<Bytes, Infallible>> = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, mime_type)
        .body(full(content_bytes))
        .map_err(|e| anyhow!("Failed to build response: {}", e))?;

    let response_with_cache = match cache {
        CacheStrategy::Yes => headers::add_cache_headers_with_max_age(response, None),
        CacheStrategy::Explicit => headers::add_no_cache_headers(response),
    };
    Ok(response_with_cache)
}

/// Helper function to determine MIME type from file extension
pub fn get_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|s| s.to_str()) {
        // Web documents
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("webmanifest") => "application/manifest+json",

        // Images
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}

/// Delivers a redirect response
pub fn deliver_redirect(location: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_redirect_with_cookie(location, None)
}

/// Delivers a redirect response, optionally setting a cookie
pub fn deliver_redirect_with_cookie(
    location: &str,
    cookie: Option<HeaderValue>,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Delivering redirect to: {}", location);

    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location);

    if let Some(c) = cookie {
        builder = builder.header(header::SET_COOKIE, c);
    }
    let response = builder.body(empty()).map_err(|e: http::Error| {
        error!("Failed to build redirect response to {}: {}", location, e);
        anyhow!("Failed to build redirect response: {}", e)
    })?;

    Ok(response)
}

/// Temporary redirect that keeps the method; used by the gate.
pub fn temporary_redirect(location: &'static str) -> Response<BoxBody<Bytes, Infallible>> {
    let mut response = Response::new(empty());
    *response.status_mut() = StatusCode::TEMPORARY_REDIRECT;
    response
        .headers_mut()
        .insert(header::LOCATION, HeaderValue::from_static(location));
    headers::add_no_cache_headers(response)
}

/// Helper function to create an empty body
pub fn empty() -> BoxBody<Bytes, Infallible> {
    Empty::<Bytes>::new().boxed()
}

/// Helper function to create a full body from various types
/// Made public for use in error handling
pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, Infallible> {
    let bytes: Bytes = chunk.into();
    let full_body: Full<Bytes> = Full::new(bytes);
    full_body.boxed()
}
