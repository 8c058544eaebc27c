//! Route classification and the allow/redirect decision made for every
//! request before it reaches a handler.

use shared::types::JwtClaims;

use crate::auth::token::{TokenError, verify_token};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Pages reachable without a session, matched on the first path segment.
pub const PUBLIC_ROUTES: [&str; 3] = ["login", "registrieren", "request-password"];

/// First segment of API routes. The gate never redirects these.
pub const API_SEGMENT: &str = "api";

const STATIC_PREFIXES: [&str; 2] = ["/static/", "/favicon.ico"];
const STATIC_SUFFIXES: [&str; 7] = [".svg", ".png", ".jpg", ".jpeg", ".avif", ".gif", ".webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Bypasses the gate entirely; no hostname stamping.
    StaticAsset,
    Public,
    Api,
    Protected,
}

#[derive(Debug)]
pub enum RedirectReason {
    MissingToken,
    InvalidToken(TokenError),
}

#[derive(Debug)]
pub enum GateDecision {
    /// Forward to the router. `claims` is set when a valid token came along.
    Pass { claims: Option<JwtClaims> },
    Redirect(RedirectReason),
}

fn first_segment(path: &str) -> &str {
    path.trim_start_matches('/').split('/').next().unwrap_or("")
}

pub fn is_static_asset(path: &str) -> bool {
    if STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    STATIC_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Segment matching: `/login-settings` is protected, `/login/x` is public.
pub fn classify(path: &str) -> RouteClass {
    if is_static_asset(path) {
        return RouteClass::StaticAsset;
    }
    let segment = first_segment(path);
    if segment == API_SEGMENT {
        RouteClass::Api
    } else if PUBLIC_ROUTES.contains(&segment) {
        RouteClass::Public
    } else {
        RouteClass::Protected
    }
}

/// Decide what happens to a request. Public and API routes always pass;
/// a token presented on them is still decoded so handlers can see who is
/// calling, but an invalid one is ignored there.
pub fn decide(path: &str, token: Option<&str>, secret: &[u8]) -> GateDecision {
    let class = classify(path);
    let verified = token.filter(|t| !t.is_empty()).map(|t| verify_token(secret, t));

    match class {
        RouteClass::StaticAsset | RouteClass::Public | RouteClass::Api => GateDecision::Pass {
            claims: verified.and_then(Result::ok),
        },
        RouteClass::Protected => match verified {
            None => GateDecision::Redirect(RedirectReason::MissingToken),
            Some(Err(e)) => GateDecision::Redirect(RedirectReason::InvalidToken(e)),
            Some(Ok(claims)) => GateDecision::Pass {
                claims: Some(claims),
            },
        },
    }
}
