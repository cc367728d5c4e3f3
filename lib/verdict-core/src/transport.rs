//! What the transport hands over when a request completes.
//!
//! A [`Completion`] is either a decoded result with its status and headers, or a
//! [`TransportError`] describing why the round-trip failed.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::Error;

/// Shared error cause, handed by reference to every listener of a chain.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Boxed error returned by listener handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Response headers in the order they were received.
///
/// Names keep the case the transport delivered, and duplicates are allowed.
pub type Headers = Vec<(String, String)>;

/// Status and body of the response attached to a failed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    status: u16,
    body: Option<Bytes>,
}

impl ErrorResponse {
    /// Creates a new error response.
    #[must_use]
    pub const fn new(status: u16, body: Option<Bytes>) -> Self {
        Self { status, body }
    }

    /// HTTP status code, `0` when the transport never saw one.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Raw response body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Response body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }
}

/// Failure reported by the transport for one request.
#[derive(Debug, Clone, Default)]
pub struct TransportError {
    message: Option<String>,
    cause: Option<Cause>,
    response: Option<ErrorResponse>,
}

impl TransportError {
    /// Creates a transport error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Creates a transport error from an underlying cause, using its text as message.
    #[must_use]
    pub fn from_cause<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: Some(cause.to_string()),
            cause: Some(Arc::new(cause)),
            response: None,
        }
    }

    /// Creates the error reported for a non-2xx response.
    ///
    /// The message is the status line, for example `"404 Not Found"`.
    #[must_use]
    pub fn from_status(status: u16, body: Option<Bytes>) -> Self {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|status| status.canonical_reason());
        let message = match reason {
            Some(reason) => format!("{status} {reason}"),
            None => status.to_string(),
        };
        Self::new(message).with_response(status, body)
    }

    /// Sets the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Attaches the response that came with the failure.
    #[must_use]
    pub fn with_response(mut self, status: u16, body: Option<Bytes>) -> Self {
        self.response = Some(ErrorResponse::new(status, body));
        self
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Underlying cause.
    #[must_use]
    pub const fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Response attached to the failure.
    #[must_use]
    pub const fn response(&self) -> Option<&ErrorResponse> {
        self.response.as_ref()
    }

    /// Nested status code, if a response with a non-zero status is attached.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response
            .as_ref()
            .map(ErrorResponse::status)
            .filter(|status| *status != 0)
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Option<Cause>, Option<ErrorResponse>) {
        (self.message, self.cause, self.response)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, self.status()) {
            (Some(message), _) => f.write_str(message),
            (None, Some(status)) => write!(f, "transport failure with status {status}"),
            (None, None) => f.write_str("transport failure"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl From<Error> for TransportError {
    fn from(err: Error) -> Self {
        Self::from_cause(err)
    }
}

/// Outcome of one transport round-trip, as delivered to the completion handler.
#[derive(Debug)]
pub enum Completion<T> {
    /// The round-trip completed and the body was decoded.
    Success {
        /// Decoded body, `None` when the response carried none.
        result: Option<T>,
        /// HTTP status code.
        status: u16,
        /// Response headers.
        headers: Headers,
    },
    /// The round-trip failed.
    Failure(TransportError),
}

impl<T> Completion<T> {
    /// Successful completion without headers.
    #[must_use]
    pub const fn success(result: Option<T>, status: u16) -> Self {
        Self::Success {
            result,
            status,
            headers: Vec::new(),
        }
    }

    /// Failed completion.
    #[must_use]
    pub const fn failure(error: TransportError) -> Self {
        Self::Failure(error)
    }

    /// Returns `true` for the success path.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
