use std::task::{Context, Poll};

use hyper::service::Service as HyperService;
use hyper::{Request, Response};
use tower::Service as TowerService;

/// Adapter to make Hyper services work with Tower middleware
///
/// `AppService` implements `hyper::service::Service` (`call(&self)`), the
/// gate and timeout layers need `tower::Service`. This adapter bridges them.
#[derive(Clone)]
pub struct HyperToTowerAdapter<S> {
    inner: S,
}

impl<S> HyperToTowerAdapter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> TowerService<Request<ReqBody>> for HyperToTowerAdapter<S>
where
    S: HyperService<Request<ReqBody>, Response = Response<ResBody>> + Clone,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Hyper services are always ready
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        self.inner.call(req)
    }
}
