//! Session cookie middleware.
//!
//! This middleware sends the cookie held by a [`CookieStore`] as the `Cookie`
//! header of every outgoing request. The completion handler fills the store
//! from `Set-Cookie` response headers.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};
use verdict_core::CookieStore;

use crate::{Error, Request, Response, Result};

/// Name of the request header carrying the session cookie.
const COOKIE_HEADER: &str = "Cookie";

/// Layer that adds the stored session cookie to requests.
///
/// A request that already sets a `Cookie` header keeps it.
///
/// # Example
///
/// ```ignore
/// use verdict::CookieStore;
/// use verdict::middleware::CookieJarLayer;
/// use tower::ServiceBuilder;
///
/// let store = CookieStore::new();
/// let service = ServiceBuilder::new()
///     .layer(CookieJarLayer::new(store.clone()))
///     .service(client);
/// ```
#[derive(Debug, Clone)]
pub struct CookieJarLayer {
    store: CookieStore,
}

impl CookieJarLayer {
    /// Create a new cookie jar layer reading from `store`.
    #[must_use]
    pub const fn new(store: CookieStore) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for CookieJarLayer {
    type Service = CookieJar<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieJar {
            inner,
            store: self.store.clone(),
        }
    }
}

/// Service that adds the stored session cookie to requests.
#[derive(Debug, Clone)]
pub struct CookieJar<S> {
    inner: S,
    store: CookieStore,
}

impl<S> CookieJar<S> {
    /// Create a new cookie jar service wrapping the given service.
    pub const fn new(inner: S, store: CookieStore) -> Self {
        Self { inner, store }
    }
}

impl<S> Service<Request> for CookieJar<S>
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

    fn call(&mut self, mut request: Request) -> Self::Future {
        let has_cookie = request
            .headers()
            .keys()
            .any(|name| name.eq_ignore_ascii_case(COOKIE_HEADER));

        if !has_cookie && let Some(cookie) = self.store.get() {
            request
                .headers_mut()
                .insert(COOKIE_HEADER.to_string(), cookie);
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(request).await })
    }
}
