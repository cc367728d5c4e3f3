//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use verdict_core::prelude::*;
//! ```

pub use crate::{
    Cause, ChainNode, Completion, CookieStore, Delivery, Error, ErrorSignal, HandlerResult,
    HttpClient, Listener, Method, Payload, Pipeline, PipelineConfig, Request, RequestContext,
    Response, Result, SignalKind, TransportError,
};
