//! HTTP transport and request manager for verdict.
//!
//! This crate provides:
//! - [`HyperClient`] - The HTTP client (hyper-util, rustls, connection pooling)
//! - [`RequestManager`] - Executes requests and delivers each outcome to a listener chain
//! - [`middleware`] - Tower layers for logging, deferred-error capture and cookies
//!
//! Classification and dispatch live in `verdict-core` and are re-exported here.
//!
//! # Example
//!
//! ```ignore
//! use verdict::prelude::*;
//!
//! let cookies = CookieStore::new();
//! let client = HyperClient::builder()
//!     .with_defaults()
//!     .with_cookie_jar(cookies.clone())
//!     .build();
//! let pipeline = Pipeline::with_config(&PipelineConfig::default(), cookies);
//! let manager = RequestManager::with_pipeline(client, pipeline);
//! ```

mod client;
mod config;
mod manager;
pub mod middleware;
pub mod prelude;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::ClientConfig;
pub use manager::RequestManager;

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use verdict_core::{
    BoxError, Cause, ChainNode, Classifier, Completion, CookieExtractor, CookieStore,
    DEFAULT_BAD_REQUEST_MARKERS, DEFAULT_COOKIE_HEADER, DeferredErrorSlot, Delivery,
    EmptyListResult, Error, ErrorResponse, ErrorSignal, Event, Exchange, HTTP_ERROR_BAD_REQUEST,
    HandlerResult, Headers, HttpClient, Listener, Payload, Pipeline, PipelineConfig,
    PipelineConfigBuilder, Request, RequestContext, RequestParts, Response, Result, SignalKind,
    TransportError, coerce_empty, dispatch, from_json, is_empty_list_rendering,
};

// Re-export http types for methods, status codes and headers
pub use verdict_core::{Method, StatusCode, header};
