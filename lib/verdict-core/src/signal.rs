//! The normalized outcome of a request.

use std::fmt;

use crate::Cause;

/// Outcome of one request attempt, exactly one per completion.
#[derive(Debug, Clone)]
pub enum ErrorSignal<T> {
    /// The call succeeded.
    Success {
        /// Decoded result, `None` when the body was empty.
        value: Option<T>,
        /// HTTP status code.
        status: u16,
    },
    /// The transport succeeded but the payload reports a domain error.
    ServerError {
        /// The payload carrying the error.
        value: T,
    },
    /// A bare empty-array payload, replaced by the declared empty result.
    EmptyListCoercion {
        /// The coerced empty result.
        value: T,
        /// HTTP status code.
        status: u16,
    },
    /// A status-bearing failure.
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: Option<String>,
        /// Response body as text.
        body: Option<String>,
    },
    /// A failure with no usable status code.
    TransportException {
        /// Underlying fault.
        cause: Option<Cause>,
        /// Error message.
        message: Option<String>,
    },
    /// The listener asked for cancellation before delivery.
    Cancelled,
}

impl<T> ErrorSignal<T> {
    /// Discriminant of this signal.
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        match self {
            Self::Success { .. } => SignalKind::Success,
            Self::ServerError { .. } => SignalKind::ServerError,
            Self::EmptyListCoercion { .. } => SignalKind::EmptyListCoercion,
            Self::HttpError { .. } => SignalKind::HttpError,
            Self::TransportException { .. } => SignalKind::TransportException,
            Self::Cancelled => SignalKind::Cancelled,
        }
    }

    /// Value handed to `after_result`.
    #[must_use]
    pub const fn had_error(&self) -> bool {
        self.kind().had_error()
    }

    /// Returns `true` for [`ErrorSignal::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Discriminant of an [`ErrorSignal`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// See [`ErrorSignal::Success`].
    Success,
    /// See [`ErrorSignal::ServerError`].
    ServerError,
    /// See [`ErrorSignal::EmptyListCoercion`].
    EmptyListCoercion,
    /// See [`ErrorSignal::HttpError`].
    HttpError,
    /// See [`ErrorSignal::TransportException`].
    TransportException,
    /// See [`ErrorSignal::Cancelled`].
    Cancelled,
}

impl SignalKind {
    /// Returns `true` for every kind except the two success kinds.
    #[must_use]
    pub const fn had_error(self) -> bool {
        !matches!(self, Self::Success | Self::EmptyListCoercion)
    }

    /// Short name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ServerError => "server_error",
            Self::EmptyListCoercion => "empty_list",
            Self::HttpError => "http_error",
            Self::TransportException => "transport_exception",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
