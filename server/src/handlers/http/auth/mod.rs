pub mod login;
pub mod logout;
pub mod register;
pub mod request_password;
pub mod session;

pub use login::handle_login;
pub use logout::handle_logout;
pub use register::handle_register;
pub use request_password::handle_request_password;
pub use session::handle_session;

use hyper::Request;

use crate::AppState;
use crate::backend::{BackendError, BackendErrorKind};
use crate::handlers::http::utils::RequestHost;

/// Url-encoded auth forms are small; anything bigger is not a form post.
pub const FORM_BODY_LIMIT: usize = 64 * 1024;

pub const CONNECTION_ERROR: &str = "Keine Internetverbindung. Bitte überprüfen Sie Ihre Netzwerkverbindung und versuchen Sie es erneut.";

/// Query/JSON parameter for a backend failure: connection problems get
/// their own key so the page can show them in preference to `authError`.
pub fn backend_error_param(
    e: &BackendError,
    rejected: &'static str,
    unexpected: &'static str,
) -> (&'static str, &'static str) {
    match e.kind {
        BackendErrorKind::Connection => ("connectionError", CONNECTION_ERROR),
        BackendErrorKind::Rejected => ("authError", rejected),
        BackendErrorKind::Unexpected => ("authError", unexpected),
    }
}

/// Host the gate recorded for this request.
pub fn request_host<B>(req: &Request<B>) -> Option<String> {
    req.extensions().get::<RequestHost>().map(|h| h.0.clone())
}

/// Base URL for links and return targets.
pub async fn base_url(host: Option<&str>, state: &AppState) -> String {
    state.config.read().await.site.base_url(host)
}
