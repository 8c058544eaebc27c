//! Remote services the back office talks to: the hosted auth/user store and
//! the certificate generator. Both sit behind traits so handlers can be
//! exercised without a network.

pub mod generator;
pub mod supabase;

use async_trait::async_trait;
use shared::types::{NewAccount, UserRole};
use thiserror::Error;

pub use generator::{CertificateGenerator, GeneratorError, HttpCertificateGenerator};
pub use supabase::SupabaseClient;

/// Broad failure category. Handlers choose the user-facing message from
/// this, never from the error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Service unreachable or timed out.
    Connection,
    /// Service answered and refused (bad credentials, duplicate account...).
    Rejected,
    /// Anything else, including replies we could not read.
    Unexpected,
}

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_connect() || e.is_timeout() || e.is_request() {
            BackendErrorKind::Connection
        } else {
            BackendErrorKind::Unexpected
        };
        Self::new(kind, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUser {
    pub id: String,
    pub email: Option<String>,
}

/// Result of a successful password sign-in.
#[derive(Debug, Clone)]
pub struct BackendSession {
    pub access_token: String,
    pub user: BackendUser,
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError>;

    /// Roles assigned to the session's user, read with the session's own token.
    async fn user_roles(&self, session: &BackendSession) -> Result<Vec<UserRole>, BackendError>;

    async fn sign_up(&self, account: &NewAccount) -> Result<(), BackendError>;

    /// Ask the service to mail a reset link that lands on `redirect_to`.
    async fn request_password_reset(&self, email: &str, redirect_to: &str)
    -> Result<(), BackendError>;
}
