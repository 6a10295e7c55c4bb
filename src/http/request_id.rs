//! Request identification.
//!
//! # Responsibilities
//! - Attach a unique request ID as early as possible for tracing
//! - Preserve an ID supplied by an upstream proxy
//!
//! # Design Decisions
//! - UUID v4; no coordination needed between instances
//! - Implemented as a plain tower layer so it sits in front of the router

use std::task::{Context, Poll};

use axum::http::{HeaderName, HeaderValue, Request};
use tower::{Layer, Service};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Layer attaching an `x-request-id` header to incoming requests.
#[derive(Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service produced by [`RequestIdLayer`].
#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if !req.headers().contains_key(&REQUEST_ID_HEADER) {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                req.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::service_fn;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_id_attached_when_absent() {
        let svc = RequestIdLayer.layer(service_fn(|req: Request<Body>| async move {
            Ok::<_, std::convert::Infallible>(
                req.headers().get(&REQUEST_ID_HEADER).cloned(),
            )
        }));

        let id = svc
            .oneshot(Request::builder().body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(id.is_some());
    }

    #[tokio::test]
    async fn test_upstream_id_preserved() {
        let svc = RequestIdLayer.layer(service_fn(|req: Request<Body>| async move {
            Ok::<_, std::convert::Infallible>(
                req.headers().get(&REQUEST_ID_HEADER).cloned(),
            )
        }));

        let req = Request::builder()
            .header("x-request-id", "upstream-7")
            .body(Body::empty())
            .unwrap();
        let id = svc.oneshot(req).await.unwrap().unwrap();
        assert_eq!(id, "upstream-7");
    }
}
