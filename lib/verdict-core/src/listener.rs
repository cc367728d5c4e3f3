//! The six-event listener interface.

use crate::{BoxError, Cause};

/// Result of a listener handler. An `Err` is a listener fault.
pub type HandlerResult = std::result::Result<(), BoxError>;

/// Receives the classified outcome of a request.
///
/// Only [`Listener::on_success`] is required; every other handler has a default.
///
/// # Example
///
/// ```
/// use verdict_core::{HandlerResult, Listener};
///
/// struct PrintStatus;
///
/// impl Listener<serde_json::Value> for PrintStatus {
///     fn on_success(&self, _value: Option<&serde_json::Value>, status: u16) -> HandlerResult {
///         tracing::info!(status, "loaded");
///         Ok(())
///     }
///
///     fn after_result(&self, had_error: bool) -> HandlerResult {
///         tracing::debug!(had_error, "done");
///         Ok(())
///     }
/// }
/// ```
pub trait Listener<T>: Send + Sync {
    /// Called on success (also for a coerced empty list).
    fn on_success(&self, value: Option<&T>, status: u16) -> HandlerResult;

    /// Called when the transport succeeded but the payload reports an error.
    fn on_error_from_server(&self, value: &T) -> HandlerResult {
        let _ = value;
        Ok(())
    }

    /// Called on a status-bearing failure.
    fn on_http_error(&self, status: u16, message: Option<&str>, body: Option<&str>) -> HandlerResult {
        let _ = (status, message, body);
        Ok(())
    }

    /// Called on a failure without a usable status, and for contained listener faults.
    fn on_exception_error(&self, cause: Option<&Cause>, message: Option<&str>) -> HandlerResult {
        match cause {
            Some(cause) => tracing::error!(error = %cause, detail = message, "unhandled exception"),
            None => tracing::error!(detail = message, "unhandled exception"),
        }
        Ok(())
    }

    /// Called instead of every other handler when [`Listener::needs_cancel`] is `true`.
    fn on_cancel(&self) -> HandlerResult {
        Ok(())
    }

    /// Called last, once per non-cancelled request.
    fn after_result(&self, had_error: bool) -> HandlerResult {
        let _ = had_error;
        Ok(())
    }

    /// Polled once when the request completes.
    fn needs_cancel(&self) -> bool {
        false
    }
}

/// One event delivered through a chain.
#[derive(Debug)]
pub enum Event<'a, T> {
    /// See [`Listener::on_success`].
    Success {
        /// Decoded result.
        value: Option<&'a T>,
        /// HTTP status code.
        status: u16,
    },
    /// See [`Listener::on_error_from_server`].
    ErrorFromServer {
        /// Payload carrying the error.
        value: &'a T,
    },
    /// See [`Listener::on_http_error`].
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: Option<&'a str>,
        /// Response body.
        body: Option<&'a str>,
    },
    /// See [`Listener::on_exception_error`].
    ExceptionError {
        /// Underlying fault.
        cause: Option<&'a Cause>,
        /// Error message.
        message: Option<&'a str>,
    },
    /// See [`Listener::on_cancel`].
    Cancel,
    /// See [`Listener::after_result`].
    AfterResult {
        /// Whether the request ended in error.
        had_error: bool,
    },
}

impl<T> Event<'_, T> {
    /// Calls the handler matching this event.
    pub fn deliver_to(&self, listener: &dyn Listener<T>) -> HandlerResult {
        match *self {
            Self::Success { value, status } => listener.on_success(value, status),
            Self::ErrorFromServer { value } => listener.on_error_from_server(value),
            Self::HttpError {
                status,
                message,
                body,
            } => listener.on_http_error(status, message, body),
            Self::ExceptionError { cause, message } => listener.on_exception_error(cause, message),
            Self::Cancel => listener.on_cancel(),
            Self::AfterResult { had_error } => listener.after_result(had_error),
        }
    }

    /// Handler name, for log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Success { .. } => "on_success",
            Self::ErrorFromServer { .. } => "on_error_from_server",
            Self::HttpError { .. } => "on_http_error",
            Self::ExceptionError { .. } => "on_exception_error",
            Self::Cancel => "on_cancel",
            Self::AfterResult { .. } => "after_result",
        }
    }
}
