use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::header::HeaderValue;
use hyper::{Request, Response};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::auth::{GateDecision, LOGIN_PATH, RedirectReason, TOKEN_COOKIE, decide, gate};
use crate::handlers::http::utils::{
    RequestHost, get_cookie, get_host, temporary_redirect,
};

/// Response header carrying the host the request was addressed to.
pub const HOSTNAME_HEADER: &str = "x-hostname";

/// Tower layer for the authentication gate
///
/// Protected pages without a valid `access_token` cookie are redirected to
/// the sign-in page before any handler runs.
#[derive(Clone)]
pub struct AuthGateLayer {
    secret: Arc<[u8]>,
}

impl AuthGateLayer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: Arc::from(secret),
        }
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGateService {
            inner,
            secret: self.secret.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthGateService<S> {
    inner: S,
    secret: Arc<[u8]>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for AuthGateService<S>
where
    S: Service<Request<ReqBody>, Response = Response<BoxBody<Bytes, Infallible>>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        let path = req.uri().path().to_string();

        if gate::is_static_asset(&path) {
            return Box::pin(inner.call(req));
        }

        let token = get_cookie(req.headers(), TOKEN_COOKIE);

        let claims = match decide(&path, token.as_deref(), &self.secret) {
            GateDecision::Pass { claims } => claims,
            GateDecision::Redirect(reason) => {
                match reason {
                    RedirectReason::MissingToken => {
                        debug!("No token for {}, redirecting to sign-in", path)
                    }
                    RedirectReason::InvalidToken(e) => {
                        warn!("Token verification failed for {}: {}", path, e)
                    }
                }
                return Box::pin(async { Ok::<_, S::Error>(temporary_redirect(LOGIN_PATH)) });
            }
        };

        let host = get_host(&req);
        if let Some(host) = &host {
            req.extensions_mut().insert(RequestHost(host.clone()));
        }
        if let Some(claims) = claims {
            req.extensions_mut().insert(claims);
        }

        Box::pin(async move {
            let mut response = inner.call(req).await?;

            if let Some(value) = host.and_then(|h| HeaderValue::from_str(&h).ok()) {
                response.headers_mut().insert(HOSTNAME_HEADER, value);
            }

            Ok::<_, S::Error>(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_token, token::issue_token_at};
    use crate::handlers::http::utils::full;
    use hyper::{StatusCode, header};
    use shared::types::JwtClaims;
    use tower::{ServiceBuilder, ServiceExt, service_fn};

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    /// Echoes the subject of the claims the gate attached, or "anonymous",
    /// followed by the stored host.
    async fn echo(req: Request<()>) -> Result<Response<BoxBody<Bytes, Infallible>>, Infallible> {
        let who = req
            .extensions()
            .get::<JwtClaims>()
            .map(|c| c.sub.clone())
            .unwrap_or_else(|| "anonymous".into());
        let host = req
            .extensions()
            .get::<RequestHost>()
            .map(|h| h.0.clone())
            .unwrap_or_default();
        Ok(Response::new(full(format!("{who}@{host}"))))
    }

    async fn send(path: &str, cookie: Option<String>) -> Response<BoxBody<Bytes, Infallible>> {
        let mut builder = Request::get(path).header(header::HOST, "baum.example:3000");
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        ServiceBuilder::new()
            .layer(AuthGateLayer::new(SECRET))
            .service(service_fn(echo))
            .oneshot(builder.body(()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn protected_page_without_token_redirects() {
        let res = send("/zertifikate", None).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()[header::LOCATION], "/login");
        assert!(res.headers().get(HOSTNAME_HEADER).is_none());
    }

    #[tokio::test]
    async fn expired_token_redirects() {
        let token = issue_token_at(SECRET, "u-1", None, Vec::new(), 1_000).unwrap();
        let res = send("/", Some(format!("access_token={token}"))).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_redirects() {
        let token =
            issue_token(b"another-secret-another-secret-xx", "u-9", None, Vec::new()).unwrap();
        let res = send("/zertifikate/erstellen", Some(format!("access_token={token}"))).await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()[header::LOCATION], "/login");
        assert!(res.headers().get(HOSTNAME_HEADER).is_none());
        let body = http_body_util::BodyExt::collect(res.into_body()).await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn unbalanced_bracket_host_is_stamped_as_sent() {
        let req = Request::get("/login").header(header::HOST, "[").body(()).unwrap();
        let res = ServiceBuilder::new()
            .layer(AuthGateLayer::new(SECRET))
            .service(service_fn(echo))
            .oneshot(req)
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[HOSTNAME_HEADER], "[");
        let body = http_body_util::BodyExt::collect(res.into_body()).await.unwrap().to_bytes();
        assert_eq!(&body[..], b"anonymous@[");
    }

    #[tokio::test]
    async fn valid_token_passes_with_claims_and_hostname() {
        let token = issue_token(SECRET, "u-7", Some("a@b.de"), Vec::new()).unwrap();
        let res = send("/zertifikate", Some(format!("theme=dark; access_token={token}"))).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[HOSTNAME_HEADER], "baum.example:3000");
        let body = http_body_util::BodyExt::collect(res.into_body()).await.unwrap().to_bytes();
        assert_eq!(&body[..], b"u-7@baum.example:3000");
    }

    #[tokio::test]
    async fn public_and_api_routes_pass_without_token() {
        for path in ["/login", "/registrieren", "/request-password", "/api/menu"] {
            let res = send(path, None).await;
            assert_eq!(res.status(), StatusCode::OK, "{path}");
            assert_eq!(res.headers()[HOSTNAME_HEADER], "baum.example:3000");
        }
    }

    #[tokio::test]
    async fn look_alike_of_public_route_is_protected() {
        let res = send("/login-settings", None).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn static_assets_bypass_the_gate() {
        let res = send("/static/app.css", Some("access_token=garbage".into())).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(HOSTNAME_HEADER).is_none());

        let res = send("/baum.webp", None).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
