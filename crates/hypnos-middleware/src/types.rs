//! HTTP types and the downstream continuation.
//!
//! The host framework - routing, extraction, transport - is an external
//! collaborator. The gate only needs plain `http` request/response values
//! and a way to hand a request onward, which is what [`Next`] provides.

use bytes::Bytes;
use http_body_util::Full;

pub use hypnos_core::BoxFuture;

/// The HTTP request type seen by the gate.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by the gate or the downstream handler.
pub type Response = http::Response<Full<Bytes>>;

/// The downstream handler continuation.
///
/// Wraps whatever comes after the gate - the route handler, or the rest of
/// the host framework's stack. Consumed by [`run`](Next::run), so it can
/// be invoked at most once per request.
pub struct Next {
    inner: Box<dyn FnOnce(Request) -> BoxFuture<'static, Response> + Send>,
}

impl Next {
    /// Wraps a downstream handler.
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce(Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        Self {
            inner: Box::new(handler),
        }
    }

    /// Invokes the downstream handler.
    pub async fn run(self, request: Request) -> Response {
        (self.inner)(request).await
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[tokio::test]
    async fn next_invokes_the_wrapped_handler() {
        let next = Next::new(|_req| {
            Box::pin(async {
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::from("OK")))
                    .unwrap()
            })
        });

        let request: Request = http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = next.run(request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn next_passes_the_request_through() {
        let next = Next::new(|req: Request| {
            Box::pin(async move {
                http::Response::builder()
                    .body(Full::new(Bytes::from(req.uri().path().to_owned())))
                    .unwrap()
            })
        });

        let request: Request = http::Request::builder()
            .uri("/echo/path")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = next.run(request).await;
        use http_body_util::BodyExt;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("/echo/path"));
    }
}
