//! Outgoing requests.
//!
//! # Example
//!
//! ```
//! use verdict_core::{Method, Request, RequestContext};
//!
//! let ctx = RequestContext::new();
//! let url = url::Url::parse("https://api.example.com/items").expect("valid URL");
//! let request = Request::new(Method::GET, url)
//!     .with_header("Accept", "application/json")
//!     .with_context(ctx.clone());
//!
//! assert_eq!(request.context().map(RequestContext::id), Some(ctx.id()));
//! ```

use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, Method};
use url::Url;

use crate::RequestContext;

/// A request on its way to the transport.
///
/// The [`RequestContext`] rides in the extensions, where middleware finds the
/// request's deferred-error slot.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    extensions: Extensions,
}

/// A request taken apart by the transport.
#[derive(Debug)]
pub struct RequestParts {
    /// HTTP method.
    pub method: Method,
    /// Target URL.
    pub url: Url,
    /// Header names and values.
    pub headers: HashMap<String, String>,
    /// Body bytes, if any.
    pub body: Option<Bytes>,
    /// Extensions, handed on to the wire request.
    pub extensions: Extensions,
}

impl Request {
    /// Creates a request without headers, body or context.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
            extensions: Extensions::new(),
        }
    }

    /// Creates a `GET` request.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Sets a header, replacing any value under the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attaches a completion context.
    #[must_use]
    pub fn with_context(mut self, ctx: RequestContext) -> Self {
        self.extensions.insert(ctx);
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers, for middleware.
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Header value stored under exactly `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Body bytes.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Mutable access to extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// The attached completion context.
    #[must_use]
    pub fn context(&self) -> Option<&RequestContext> {
        self.extensions.get::<RequestContext>()
    }

    /// Takes the request apart.
    #[must_use]
    pub fn into_parts(self) -> RequestParts {
        RequestParts {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            extensions: self.extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://api.example.com")
            .and_then(|base| base.join(path))
            .expect("valid URL")
    }

    #[test]
    fn header_and_body() {
        let request = Request::new(Method::POST, url("/login"))
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"user":"alice"}"#);

        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(
            request.body(),
            Some(&Bytes::from_static(br#"{"user":"alice"}"#))
        );
        assert!(request.context().is_none());
    }

    #[test]
    fn context_travels_in_extensions() {
        let ctx = RequestContext::new();
        let request = Request::get(url("/items")).with_context(ctx.clone());

        let parts = request.into_parts();
        assert_eq!(parts.url.path(), "/items");
        assert_eq!(
            parts.extensions.get::<RequestContext>().map(RequestContext::id),
            Some(ctx.id())
        );
    }
}
