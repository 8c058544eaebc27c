use anyhow::{Result, anyhow};
use hyper::Request;
use hyper::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::token::{COOKIE_MAX_AGE, TOKEN_COOKIE};

/// `Host` of the current request (port included), stored by the gate for
/// handlers that build absolute links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHost(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
}

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| {
        debug!("Retrieved header: {}", name);
        s.to_string()
    })
}

/// Extract cookie value by name
pub fn get_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                let name = parts.next()?.trim();
                let value = parts.next()?.trim();
                if name == cookie_name {
                    debug!("Cookie found: {}", cookie_name);
                    Some(value.to_string())
                } else {
                    None
                }
            })
        })
}

/// Host the browser addressed, port included.
pub fn get_host<B>(req: &Request<B>) -> Option<String> {
    get_header_value(req.headers(), "host")
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()))
        .filter(|host| !host.is_empty())
}

/// Set a cookie with options
pub fn set_cookie(
    name: &str,
    value: &str,
    max_age: Option<Duration>,
    path: Option<&str>,
    http_only: bool,
    secure: bool,
    same_site: SameSite,
) -> Result<HeaderValue> {
    let mut cookie = format!("{}={}", name, value);

    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", age.as_secs()));
    }

    if let Some(p) = path {
        cookie.push_str(&format!("; Path={}", p));
    }

    if http_only {
        cookie.push_str("; HttpOnly");
    }

    if secure {
        cookie.push_str("; Secure");
    }

    cookie.push_str(match same_site {
        SameSite::Strict => "; SameSite=Strict",
        SameSite::Lax => "; SameSite=Lax",
    });

    debug!("Setting cookie: {}", name);

    HeaderValue::from_str(&cookie).map_err(|e| {
        warn!("Failed to create cookie header for {}: {}", name, e);
        anyhow!("Invalid cookie value: {}", e)
    })
}

/// Identity cookie written after a successful sign-in. Readable by page
/// scripts, `Secure` only in production.
pub fn create_token_cookie(token: &str, secure: bool) -> Result<HeaderValue> {
    debug!(
        "Creating token cookie with max_age: {:?}, secure: {}",
        COOKIE_MAX_AGE, secure
    );
    set_cookie(
        TOKEN_COOKIE,
        token,
        Some(COOKIE_MAX_AGE),
        Some("/"),
        false,
        secure,
        SameSite::Lax,
    )
}

/// Delete a cookie by setting it to expire
pub fn delete_cookie(name: &str) -> Result<HeaderValue> {
    debug!("Deleting cookie: {}", name);
    set_cookie(
        name,
        "",
        Some(Duration::from_secs(0)),
        Some("/"),
        false,
        false,
        SameSite::Lax,
    )
}

/// Add no-cache headers for non-static files
pub fn add_no_cache_headers<T>(mut res: hyper::Response<T>) -> hyper::Response<T> {
    let headers = res.headers_mut();

    headers.insert(
        "cache-control",
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert("pragma", HeaderValue::from_static("no-cache"));
    headers.insert("expires", HeaderValue::from_static("0"));
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );

    debug!("Added no-cache headers");
    res
}

/// Add custom cache headers with specified max-age
pub fn add_cache_headers_with_max_age<T>(
    mut res: hyper::Response<T>,
    max_age_seconds: Option<u64>,
) -> hyper::Response<T> {
    let headers = res.headers_mut();
    let time = max_age_seconds.unwrap_or(31536000);

    let cache_control = format!("public, max-age={}", time);
    headers.insert(
        "cache-control",
        HeaderValue::from_str(&cache_control)
            .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=3600")),
    );
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );

    debug!("Added cache headers with max-age: {} seconds", time);
    res
}
