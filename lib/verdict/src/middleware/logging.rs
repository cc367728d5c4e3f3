//! Exchange logging.
//!
//! Every exchange runs inside an `exchange` span carrying the request id, so
//! the pipeline's own logs for that request nest under it. The outcome line
//! says whether the deferred slot already holds the error the classifier will
//! find first.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, debug, info, info_span, warn};
use verdict_core::RequestContext;

use crate::{Error, Request, Response, Result};

/// Layer logging one span per exchange.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    headers: bool,
}

impl LoggingLayer {
    /// Outcome lines only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome lines, plus request and response headers at debug level.
    #[must_use]
    pub const fn with_headers() -> Self {
        Self { headers: true }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            headers: self.headers,
        }
    }
}

/// Service produced by [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    headers: bool,
}

impl<S> Service<Request> for Logging<S>
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
        let span = info_span!(
            "exchange",
            request_id = context.as_ref().map(RequestContext::id),
            method = %request.method(),
            url = %request.url(),
        );
        if self.headers {
            span.in_scope(|| debug!(headers = ?request.headers(), "request headers"));
        }

        let headers = self.headers;
        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();
                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() => {
                        info!(status = response.status(), elapsed_ms, "exchange completed");
                    }
                    Ok(response) => {
                        let deferred = context
                            .as_ref()
                            .is_some_and(|ctx| !ctx.deferred().is_empty());
                        warn!(
                            status = response.status(),
                            elapsed_ms, deferred, "exchange answered with an error status"
                        );
                    }
                    Err(err) => {
                        warn!(
                            error = %err,
                            truncated = err.is_truncated(),
                            timeout = err.is_timeout(),
                            elapsed_ms,
                            "exchange failed"
                        );
                    }
                }
                if headers && let Ok(response) = &result {
                    debug!(headers = ?response.headers(), "response headers");
                }

                result
            }
            .instrument(span),
        )
    }
}
