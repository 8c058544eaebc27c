use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use shared::types::{JwtClaims, UserRole};
use thiserror::Error;

/// Cookie that carries the identity token.
pub const TOKEN_COOKIE: &str = "access_token";

/// Token lifetime. Fixed, not configurable.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cookie lifetime. Deliberately longer than [`TOKEN_TTL`]: after the token
/// expires the browser keeps sending it and every protected request is
/// redirected to `/login` until the user signs in again.
pub const COOKIE_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Sign a token for a freshly authenticated user, valid for [`TOKEN_TTL`].
pub fn issue_token(
    secret: &[u8],
    user_id: &str,
    email: Option<&str>,
    roles: Vec<UserRole>,
) -> Result<String, TokenError> {
    issue_token_at(secret, user_id, email, roles, unix_now())
}

/// Like [`issue_token`] with an explicit issue time (seconds since epoch).
pub fn issue_token_at(
    secret: &[u8],
    user_id: &str,
    email: Option<&str>,
    roles: Vec<UserRole>,
    issued_at: u64,
) -> Result<String, TokenError> {
    let claims = JwtClaims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        roles,
        iat: issued_at as usize,
        exp: (issued_at + TOKEN_TTL.as_secs()) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Check signature and expiry. No clock leeway: a token is rejected the
/// second its `exp` passes.
pub fn verify_token(secret: &[u8], token: &str) -> Result<JwtClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_aud = false;

    decode::<JwtClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(e.to_string()),
        })
}
