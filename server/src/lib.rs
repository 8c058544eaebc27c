//! Back office for tree certificates.
//!
//! Requests pass through an authentication gate before reaching the router.
//! Certificate uploads are checked, stamped with their location and handed
//! to an external generator; sign-in, sign-up and password reset talk to a
//! hosted identity backend.

pub mod auth;
pub mod backend;
pub mod certificate;
pub mod handlers;
pub mod service;
pub mod tower_middle;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use shared::config::LiveConfig;

use crate::backend::{AuthBackend, CertificateGenerator};

/// Everything a handler needs, cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Hot-reloadable settings. Read briefly, never across an `.await`.
    pub config: LiveConfig,
    /// Resolved once at startup; a reload does not rotate it.
    pub jwt_secret: Arc<str>,
    pub auth: Arc<dyn AuthBackend>,
    pub generator: Arc<dyn CertificateGenerator>,
}
