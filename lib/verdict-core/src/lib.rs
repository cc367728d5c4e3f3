//! Outcome classification and listener dispatch for HTTP call results.
//!
//! For every completed request, verdict decides which single outcome applies and
//! delivers it to a chain of listeners, exactly once:
//! - [`Completion`] - What the transport hands over (result or [`TransportError`])
//! - [`RequestContext`] and [`DeferredErrorSlot`] - Per-request state, including an
//!   error stashed by an interceptor before the completion handler runs
//! - [`Classifier`] - Maps the raw signals to one [`ErrorSignal`]
//! - [`Listener`] and [`ChainNode`] - The six-event interface and listener chains
//! - [`dispatch`] - Ordered delivery with listener fault containment
//! - [`CookieExtractor`] and [`CookieStore`] - Cookie republishing
//! - [`Pipeline`] - The completion handler tying it all together
//! - [`HttpClient`], [`Request`], [`Response`] - The transport boundary
//! - [`Error`] and [`Result`] - Error handling

mod chain;
mod classify;
mod client;
mod config;
mod context;
mod cookie;
mod error;
mod listener;
mod payload;
mod pipeline;
pub mod prelude;
mod request;
mod response;
mod signal;
mod transport;

pub use chain::{ChainNode, Delivery, dispatch};
pub use classify::{Classifier, HTTP_ERROR_BAD_REQUEST};
pub use client::HttpClient;
pub use config::{
    DEFAULT_BAD_REQUEST_MARKERS, DEFAULT_COOKIE_HEADER, PipelineConfig, PipelineConfigBuilder,
};
pub use context::{DeferredErrorSlot, Exchange, RequestContext};
pub use cookie::{CookieExtractor, CookieStore};
pub use error::{Error, Result};
pub use listener::{Event, HandlerResult, Listener};
pub use payload::{EmptyListResult, Payload, coerce_empty, from_json, is_empty_list_rendering};
pub use pipeline::Pipeline;
pub use request::{Request, RequestParts};
pub use response::Response;
pub use signal::{ErrorSignal, SignalKind};
pub use transport::{BoxError, Cause, Completion, ErrorResponse, Headers, TransportError};

// Re-export http crate types for methods, status codes and headers
pub use http::{Method, StatusCode, header};
