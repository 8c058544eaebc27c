use serde::{Deserialize, Serialize};

/// A role as stored by the identity backend (`roles` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: String,
    pub name: String,
}

/// Claims embedded in the `access_token` cookie.
///
/// Issued once at sign-in and verified (signature + expiry) on every
/// protected request. Nothing on the server persists it; the client owns the
/// only copy until sign-out or expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Identity backend user id.
    pub sub: String,

    /// Email address the user signed in with.
    #[serde(default)]
    pub email: Option<String>,

    /// Roles resolved at sign-in. A role change needs a fresh sign-in to show
    /// up here.
    #[serde(default)]
    pub roles: Vec<UserRole>,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: usize,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: usize,
}

impl JwtClaims {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}
