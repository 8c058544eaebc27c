use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response};
use tracing::error;

use crate::AppState;
use crate::handlers::http::routes::Router;
use crate::handlers::http::utils::internal_error_response;

/// The innermost service: routes a request and turns handler failures
/// into a generic 500 so the connection never sees an error.
#[derive(Clone)]
pub struct AppService {
    router: Arc<Router>,
    state: AppState,
}

impl AppService {
    pub fn new(router: Arc<Router>, state: AppState) -> Self {
        Self { router, state }
    }
}

impl Service<Request<Incoming>> for AppService {
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let router = self.router.clone();
        let state = self.state.clone();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();

            match router.route(req, state).await {
                Ok(response) => Ok(response),
                Err(e) => {
                    error!("{} {} failed: {:#}", method, path, e);
                    Ok(internal_error_response())
                }
            }
        })
    }
}
