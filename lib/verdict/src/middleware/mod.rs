//! Tower middleware layers for the verdict HTTP client.
//!
//! Layers wrap the raw transport and see every request before the completion
//! handler does. The first layer added to the builder is the outermost one.
//!
//! # Available Layers
//!
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`
//! - [`ErrorCaptureLayer`] - Stashes non-2xx responses in the request's deferred-error slot
//! - [`CookieJarLayer`] - Sends the stored session cookie with every request
//!
//! # Example
//!
//! ```ignore
//! use verdict::{CookieStore, HyperClient};
//! use verdict::middleware::ErrorCaptureLayer;
//!
//! let cookies = CookieStore::new();
//! let client = HyperClient::builder()
//!     .with_logging()
//!     .with_cookie_jar(cookies)
//!     .layer(ErrorCaptureLayer::new())
//!     .build();
//! ```

mod cookie_jar;
mod error_capture;
mod logging;

pub use cookie_jar::{CookieJar, CookieJarLayer};
pub use error_capture::{ErrorCapture, ErrorCaptureLayer};
pub use logging::{Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
