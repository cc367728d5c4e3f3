//! Deferred-error capture middleware.
//!
//! Puts a [`TransportError`] for every non-2xx response into the deferred-error
//! slot of the request's [`RequestContext`]. The completion handler later finds
//! it there and reports the server's status and body instead of whatever the
//! body decoder made of the response.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};
use verdict_core::{RequestContext, TransportError};

use crate::{Error, Request, Response, Result};

/// Layer that stashes non-2xx responses in the request's deferred-error slot.
///
/// Requests without a [`RequestContext`] pass through untouched.
///
/// # Example
///
/// ```ignore
/// use verdict::middleware::ErrorCaptureLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(ErrorCaptureLayer::new())
///     .service(client);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorCaptureLayer;

impl ErrorCaptureLayer {
    /// Create a new error capture layer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for ErrorCaptureLayer {
    type Service = ErrorCapture<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorCapture { inner }
    }
}

/// Service that stashes non-2xx responses in the request's deferred-error slot.
#[derive(Debug, Clone)]
pub struct ErrorCapture<S> {
    inner: S,
}

impl<S> ErrorCapture<S> {
    /// Create a new error capture service wrapping the given service.
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Service<Request> for ErrorCapture<S>
where
    S: Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let context = request.context().cloned();

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let response = inner.call(request).await?;

            if let Some(context) = context
                && !response.is_success()
            {
                capture(&context, &response);
            }

            Ok(response)
        })
    }
}

fn capture(context: &RequestContext, response: &Response<Bytes>) {
    let body = Some(response.body().clone()).filter(|body| !body.is_empty());
    let error = TransportError::from_status(response.status(), body);

    tracing::debug!(
        request_id = context.id(),
        status = response.status(),
        "captured error response"
    );
    context.deferred().put(error);
}
