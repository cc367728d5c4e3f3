//! Per-request state: the deferred-error slot and the raw exchange record.
//!
//! A [`RequestContext`] is created for every request and travels in the request
//! extensions, so an interceptor can stash an error in the request's own
//! [`DeferredErrorSlot`] before the completion handler runs. Two requests never
//! share a slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::{Headers, TransportError};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Single-slot holder for an error discovered outside the completion handler.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct DeferredErrorSlot {
    inner: Arc<Mutex<Option<TransportError>>>,
}

impl DeferredErrorSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an error, replacing any previous one.
    pub fn put(&self, error: TransportError) {
        let previous = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(error);

        if let Some(previous) = previous {
            tracing::debug!(error = %previous, "deferred error overwritten");
        }
    }

    /// Removes and returns the stored error.
    pub fn take(&self) -> Option<TransportError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Empties the slot. Clearing an empty slot is a no-op.
    pub fn clear(&self) {
        drop(self.take());
    }

    /// Returns `true` if no error is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Raw exchange recorded by the pipeline before classification.
#[derive(Debug, Clone)]
pub enum Exchange {
    /// The transport returned a response.
    Response {
        /// HTTP status code.
        status: u16,
        /// Response headers.
        headers: Headers,
    },
    /// The transport failed.
    Failed(TransportError),
}

/// State scoped to one request.
///
/// Clones share the same slot and exchange record, so a listener can keep a
/// clone and inspect the raw exchange while handling events.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: u64,
    deferred: DeferredErrorSlot,
    exchange: Arc<RwLock<Option<Exchange>>>,
}

impl RequestContext {
    /// Creates a context with a fresh request id and an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            deferred: DeferredErrorSlot::new(),
            exchange: Arc::new(RwLock::new(None)),
        }
    }

    /// Process-unique request id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The request's deferred-error slot.
    #[must_use]
    pub const fn deferred(&self) -> &DeferredErrorSlot {
        &self.deferred
    }

    /// Records the raw exchange, replacing any earlier record.
    pub fn record(&self, exchange: Exchange) {
        *self
            .exchange
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(exchange);
    }

    /// The recorded exchange, if the request has completed.
    #[must_use]
    pub fn exchange(&self) -> Option<Exchange> {
        self.exchange
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Status of the recorded response, `None` on failure or before completion.
    #[must_use]
    pub fn response_status(&self) -> Option<u16> {
        match self.exchange()? {
            Exchange::Response { status, .. } => Some(status),
            Exchange::Failed(_) => None,
        }
    }

    /// The recorded transport error, `None` on success or before completion.
    #[must_use]
    pub fn transport_error(&self) -> Option<TransportError> {
        match self.exchange()? {
            Exchange::Failed(error) => Some(error),
            Exchange::Response { .. } => None,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
