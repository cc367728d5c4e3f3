//! Error types for verdict.
//!
//! Transport failures never surface as [`Error`] to callers of the request
//! manager: they are converted into a [`crate::TransportError`] and classified.
//! The `Display` text is what the classifier matches its markers against, so a
//! [`Error::Truncated`] reads `"truncated response: ..."`.

use derive_more::{Display, Error, From};

use crate::Cause;

/// Main error type for verdict operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// No response head could be read from the server.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS handshake or certificate failure.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// The exchange did not complete within the configured timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The response started but ended before its body was complete.
    #[display("truncated response: {_0}")]
    #[from(skip)]
    Truncated(#[error(not(source))] String),

    /// The request could not be turned into a wire request.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// A value could not be encoded as JSON.
    #[display("could not encode JSON: {_0}")]
    #[from]
    Encode(serde_json::Error),

    /// A response body did not match the expected payload type.
    #[display("could not decode JSON at '{path}': {message}")]
    #[from(skip)]
    Decode {
        /// JSON path to the offending value (e.g., "items[0].id").
        path: String,
        /// Decoder message.
        message: String,
    },

    /// A listener handler failed and the chain did not contain the fault.
    #[display("listener failed: {_0}")]
    #[from(skip)]
    Listener(#[error(not(source))] Cause),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create a truncated-response error.
    #[must_use]
    pub fn truncated(message: impl Into<String>) -> Self {
        Self::Truncated(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a decode error with path context.
    #[must_use]
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if the response body ended early.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated(_))
    }

    /// Returns `true` if a listener fault escaped the chain.
    #[must_use]
    pub const fn is_listener(&self) -> bool {
        matches!(self, Self::Listener(_))
    }
}
