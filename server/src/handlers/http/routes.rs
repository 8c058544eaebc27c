use std::convert::Infallible;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Method, Request, Response, StatusCode};
use tracing::debug;

use crate::AppState;
use crate::handlers::http::{auth, certificate, menu, utils::*};

// ---------------------------------------------------------------------------
// Handler type
// ---------------------------------------------------------------------------
//
// Access control happens before the router, in the gate layer. Handlers
// that need the caller read `JwtClaims` from the request extensions.

type RouteHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

struct Route {
    method: Method,
    path: String,
    handler: RouteHandler,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
    web_dir: Option<String>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .field("web_dir", &self.web_dir)
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            web_dir: None,
        }
    }

    /// Serve pages from `web_dir` instead of the configured directory.
    pub fn with_web_dir(mut self, web_dir: String) -> Self {
        self.web_dir = Some(web_dir);
        self
    }

    fn add<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            handler: Box::new(move |req, state| Box::pin(handler(req, state))),
        });
        self
    }

    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.add(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.add(Method::POST, path, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        if let Some(route) = self.find(&method, &path) {
            return (route.handler)(req, state).await;
        }

        // No registered route matched: pages and static files for GET.
        if method == Method::GET {
            if let Some(response) = self.try_serve_static(&path, &state).await? {
                return Ok(response);
            }
        }

        debug!("No route for {} {}", method, path);
        deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    fn find(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.method == *method && Self::path_matches(&route.path, path))
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);
        let clean = match clean.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        if route_path == clean {
            return true;
        }

        // Segment-by-segment matching for `:param` wildcards.
        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return false;
        }

        route_segs
            .iter()
            .zip(path_segs.iter())
            .all(|(r, p)| r.starts_with(':') || r == p)
    }

    // ── Static file fallback ──────────────────────────────────────────────────

    async fn try_serve_static(
        &self,
        path: &str,
        state: &AppState,
    ) -> Result<Option<Response<BoxBody<Bytes, Infallible>>>> {
        let web_dir = match &self.web_dir {
            Some(dir) => dir.clone(),
            None => state.config.read().await.paths.web_dir.clone(),
        };

        let Some((file, cache)) = resolve_file(path) else {
            return Ok(None);
        };

        let file_path = format!("{}/{}", web_dir.trim_end_matches('/'), file);
        if !tokio::fs::try_exists(&file_path).await.unwrap_or(false) {
            return Ok(None);
        }

        let response = deliver_page_with_status(&file_path, StatusCode::OK, cache)
            .await
            .with_context(|| format!("Failed to deliver {}", file_path))?;
        Ok(Some(response))
    }
}

/// Map a request path to a file under the web directory. Pages are
/// `<path>.html` and never cached; `/static/` files get long-lived caching.
pub fn resolve_file(path: &str) -> Option<(String, CacheStrategy)> {
    let relative = path.trim_start_matches('/');

    if relative.split('/').any(|seg| seg == ".." || seg.starts_with('.')) {
        return None;
    }

    if relative.starts_with("static/") || relative == "favicon.ico" {
        return Some((relative.to_string(), CacheStrategy::Yes));
    }

    let page = relative.trim_end_matches('/');
    if page.is_empty() || page == "index.html" {
        return Some(("index.html".to_string(), CacheStrategy::Explicit));
    }

    let is_page_path = page
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '/');
    if is_page_path {
        return Some((format!("{}.html", page), CacheStrategy::Explicit));
    }

    match Path::new(page).extension().and_then(|e| e.to_str()) {
        Some("html") => Some((page.to_string(), CacheStrategy::Explicit)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Application router
//
// The gate in front of the router has already decided whether the caller
// may see a path; handlers here never repeat that check.
// ---------------------------------------------------------------------------

pub fn build_router(web_dir: Option<String>) -> Router {
    let mut router = Router::new();
    if let Some(dir) = web_dir {
        router = router.with_web_dir(dir);
    }

    router
        // ── API (never gated) ───────────────────────────────────────────────
        .get("/api/health", |_req, _state| async move {
            deliver_json(r#"{"status":"success","health":"ok"}"#, StatusCode::OK)
        })
        .get("/api/menu", |req, state| async move {
            menu::handle_menu(req, state).await.context("Menu lookup failed")
        })
        .get("/api/session", |req, state| async move {
            auth::handle_session(req, state).await.context("Session lookup failed")
        })
        .post("/api/generate-certificate", |req, state| async move {
            certificate::handle_generate_proxy(req, state)
                .await
                .context("Certificate relay failed")
        })
        // ── Auth forms ──────────────────────────────────────────────────────
        .post("/login", |req, state| async move {
            auth::handle_login(req, state).await.context("Sign-in failed")
        })
        .post("/registrieren", |req, state| async move {
            auth::handle_register(req, state).await.context("Sign-up failed")
        })
        .post("/request-password", |req, state| async move {
            auth::handle_request_password(req, state)
                .await
                .context("Password request failed")
        })
        .post("/logout", |req, state| async move {
            auth::handle_logout(req, state).await.context("Sign-out failed")
        })
        // ── Certificates (behind the gate) ──────────────────────────────────
        .post("/zertifikate/erstellen", |req, state| async move {
            certificate::handle_create_certificate(req, state)
                .await
                .context("Certificate creation failed")
        })
        .post("/zertifikate/metadaten", |req, state| async move {
            certificate::handle_metadata_preview(req, state)
                .await
                .context("Metadata preview failed")
        })
}
