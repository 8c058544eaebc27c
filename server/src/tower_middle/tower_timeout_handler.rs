use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Request, Response, StatusCode};
use tokio::time;
use tower::{Layer, Service};

use crate::handlers::http::utils::full;

const TIMEOUT_BODY: &str =
    r#"{"status":"error","code":"REQUEST_TIMEOUT","message":"Request timed out"}"#;

/// Tower layer for request timeouts
///
/// If the inner service does not respond within the configured
/// duration, a 408 Request Timeout response is returned.
#[derive(Clone)]
pub struct TimeoutLayer {
    duration: Duration,
}

impl TimeoutLayer {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            duration: self.duration,
        }
    }
}

#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    duration: Duration,
}

fn timeout_response() -> Response<BoxBody<Bytes, Infallible>> {
    let mut response = Response::new(full(TIMEOUT_BODY));
    *response.status_mut() = StatusCode::REQUEST_TIMEOUT;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

impl<S, ReqBody> Service<Request<ReqBody>> for TimeoutService<S>
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

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let duration = self.duration;
        let path = req.uri().path().to_string();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match time::timeout(duration, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("Request to {} timed out after {:?}", path, duration);
                    Ok(timeout_response())
                }
            }
        })
    }
}
