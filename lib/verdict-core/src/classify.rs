//! Maps the raw signals of a completed request to one [`ErrorSignal`].

use std::sync::Arc;

use crate::config::DEFAULT_BAD_REQUEST_MARKERS;
use crate::payload::is_empty_list_rendering;
use crate::{Completion, DeferredErrorSlot, ErrorSignal, Payload, TransportError};

/// Status reported when a failure message matches a bad-request marker.
pub const HTTP_ERROR_BAD_REQUEST: u16 = 400;

/// Outcome classifier.
///
/// Precedence: cancellation, then a deferred error, then the success or failure
/// path of the completion itself. The deferred slot is emptied on every path.
#[derive(Debug, Clone)]
pub struct Classifier {
    bad_request_markers: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_BAD_REQUEST_MARKERS)
    }
}

impl Classifier {
    /// Creates a classifier with the given bad-request markers.
    #[must_use]
    pub fn new<I, S>(bad_request_markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bad_request_markers: bad_request_markers.into_iter().map(Into::into).collect(),
        }
    }

    /// Classifies a completion.
    ///
    /// `cancel_requested` is read once; the `deferred` slot is taken before anything
    /// else, so it is empty when this returns.
    pub fn classify<T: Payload>(
        &self,
        completion: Completion<T>,
        cancel_requested: bool,
        deferred: &DeferredErrorSlot,
    ) -> ErrorSignal<T> {
        let deferred = deferred.take();

        if cancel_requested {
            tracing::warn!("operation cancelled before delivery");
            return ErrorSignal::Cancelled;
        }

        if let Some(error) = deferred {
            return Self::from_deferred(error);
        }

        match completion {
            Completion::Success { result, status, .. } => Self::from_success(result, status),
            Completion::Failure(error) => self.from_failure(error),
        }
    }

    fn from_deferred<T>(error: TransportError) -> ErrorSignal<T> {
        let status = error.status();
        let (message, cause, response) = error.into_parts();

        match status {
            Some(status) => ErrorSignal::HttpError {
                status,
                message,
                body: response.and_then(|response| response.body_text()),
            },
            None => ErrorSignal::TransportException { cause, message },
        }
    }

    fn from_success<T: Payload>(result: Option<T>, status: u16) -> ErrorSignal<T> {
        let Some(value) = result else {
            return ErrorSignal::Success {
                value: None,
                status,
            };
        };

        if value.is_success() {
            return ErrorSignal::Success {
                value: Some(value),
                status,
            };
        }

        if is_empty_list_rendering(&value.rendering()) {
            return match T::empty_list() {
                Ok(value) => ErrorSignal::EmptyListCoercion { value, status },
                Err(err) => ErrorSignal::TransportException {
                    message: Some(err.to_string()),
                    cause: Some(Arc::new(err)),
                },
            };
        }

        ErrorSignal::ServerError { value }
    }

    fn from_failure<T>(&self, error: TransportError) -> ErrorSignal<T> {
        tracing::error!(error = %error, "request failed");

        if let Some(message) = error.message()
            && self.is_bad_request(message)
        {
            return ErrorSignal::HttpError {
                status: HTTP_ERROR_BAD_REQUEST,
                message: Some(message.to_string()),
                body: None,
            };
        }

        let (message, cause, _) = error.into_parts();
        ErrorSignal::TransportException { cause, message }
    }

    fn is_bad_request(&self, message: &str) -> bool {
        self.bad_request_markers
            .iter()
            .any(|marker| message.contains(marker.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use bytes::Bytes;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    enum Reply {
        Bare(Vec<String>),
        Body {
            #[serde(default)]
            success: bool,
            #[serde(default)]
            error: Option<String>,
        },
    }

    impl Payload for Reply {
        fn is_success(&self) -> bool {
            matches!(self, Self::Body { success: true, .. })
        }
    }

    fn ok_reply() -> Reply {
        Reply::Body {
            success: true,
            error: None,
        }
    }

    fn classify(
        completion: Completion<Reply>,
        cancel_requested: bool,
        slot: &DeferredErrorSlot,
    ) -> ErrorSignal<Reply> {
        Classifier::default().classify(completion, cancel_requested, slot)
    }

    fn failed_reply() -> Reply {
        Reply::Body {
            success: false,
            error: Some("quota exceeded".to_string()),
        }
    }

    #[test]
    fn cancellation_wins_and_clears_slot() {
        let slot = DeferredErrorSlot::new();
        slot.put(TransportError::new("stale").with_response(500, None));

        let signal = classify(Completion::success(Some(ok_reply()), 200), true, &slot);

        check!(signal.is_cancelled());
        check!(slot.is_empty());
    }

    #[test]
    fn success_keeps_value_and_status() {
        let slot = DeferredErrorSlot::new();
        let signal = classify(Completion::success(Some(ok_reply()), 201), false, &slot);

        let_assert!(ErrorSignal::Success { value: Some(value), status } = signal);
        check!(value == ok_reply());
        check!(status == 201);
    }

    #[test]
    fn missing_result_is_success() {
        let slot = DeferredErrorSlot::new();
        let signal = classify(Completion::success(None, 204), false, &slot);

        let_assert!(ErrorSignal::Success { value: None, status: 204 } = signal);
    }

    #[test]
    fn empty_array_is_coerced() {
        let slot = DeferredErrorSlot::new();
        let raw = Reply::Bare(Vec::new());
        let signal = classify(Completion::success(Some(raw), 200), false, &slot);

        let_assert!(ErrorSignal::EmptyListCoercion { value, status: 200 } = signal);
        check!(value == Reply::Body { success: false, error: None });
    }

    #[test]
    fn non_empty_array_is_server_error() {
        let slot = DeferredErrorSlot::new();
        let raw = Reply::Bare(vec!["a".to_string()]);
        let signal = classify(Completion::success(Some(raw.clone()), 200), false, &slot);

        let_assert!(ErrorSignal::ServerError { value } = signal);
        check!(value == raw);
    }

    #[test]
    fn failed_payload_is_server_error() {
        let slot = DeferredErrorSlot::new();
        let signal = classify(Completion::success(Some(failed_reply()), 200), false, &slot);

        let_assert!(ErrorSignal::ServerError { value } = signal);
        check!(value == failed_reply());
    }

    #[test]
    fn deferred_status_becomes_http_error() {
        let slot = DeferredErrorSlot::new();
        slot.put(
            TransportError::new("404 Not Found")
                .with_response(404, Some(Bytes::from_static(b"not found"))),
        );

        let failure = TransportError::new("connection reset");
        let signal = classify(Completion::failure(failure), false, &slot);

        let_assert!(ErrorSignal::HttpError { status, message, body } = signal);
        check!(status == 404);
        check!(message.as_deref() == Some("404 Not Found"));
        check!(body.as_deref() == Some("not found"));
        check!(slot.is_empty());
    }

    #[test]
    fn deferred_error_overrides_success_path() {
        let slot = DeferredErrorSlot::new();
        slot.put(TransportError::new("interceptor saw a reset"));

        let signal = classify(Completion::success(Some(ok_reply()), 200), false, &slot);

        let_assert!(ErrorSignal::TransportException { message, .. } = signal);
        check!(message.as_deref() == Some("interceptor saw a reset"));
    }

    #[test]
    fn deferred_zero_status_is_transport_exception() {
        let slot = DeferredErrorSlot::new();
        slot.put(TransportError::new("no status").with_response(0, None));

        let signal = classify(Completion::success(None, 200), false, &slot);

        check!(signal.kind() == crate::SignalKind::TransportException);
    }

    #[test]
    fn bad_request_marker_ignores_nested_status() {
        let slot = DeferredErrorSlot::new();
        let failure = TransportError::new("400 Bad Request").with_response(422, None);
        let signal = classify(Completion::failure(failure), false, &slot);

        let_assert!(ErrorSignal::HttpError { status, message, body } = signal);
        check!(status == 400);
        check!(message.as_deref() == Some("400 Bad Request"));
        check!(body.is_none());
    }

    #[test]
    fn truncated_response_is_bad_request() {
        let slot = DeferredErrorSlot::new();
        let failure = TransportError::from(crate::Error::truncated(
            "error reading a body from connection: end of file before message length reached",
        ));
        let signal = classify(Completion::failure(failure), false, &slot);

        let_assert!(ErrorSignal::HttpError { status, message, body } = signal);
        check!(status == 400);
        let_assert!(Some(message) = message);
        check!(message.starts_with("truncated response: "));
        check!(body.is_none());
    }

    #[test]
    fn io_eof_is_bad_request() {
        let slot = DeferredErrorSlot::new();
        let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        let signal = classify(Completion::failure(TransportError::from_cause(eof)), false, &slot);

        check!(signal.kind() == crate::SignalKind::HttpError);
    }

    #[test]
    fn other_failure_is_transport_exception() {
        let slot = DeferredErrorSlot::new();
        let failure = TransportError::from(crate::Error::connection("refused"));
        let signal = classify(Completion::failure(failure), false, &slot);

        let_assert!(ErrorSignal::TransportException { cause: Some(cause), message } = signal);
        check!(cause.to_string() == "connection error: refused");
        check!(message.as_deref() == Some("connection error: refused"));
    }

    #[test]
    fn custom_markers() {
        let slot = DeferredErrorSlot::new();
        let classifier = Classifier::new(["rejected by gateway"]);

        let failure = TransportError::new("400 Bad Request");
        let signal: ErrorSignal<Reply> = classifier.classify(Completion::failure(failure), false, &slot);
        check!(signal.kind() == crate::SignalKind::TransportException);

        let failure = TransportError::new("request rejected by gateway");
        let signal: ErrorSignal<Reply> = classifier.classify(Completion::failure(failure), false, &slot);
        check!(signal.kind() == crate::SignalKind::HttpError);
    }

    #[test]
    fn sequential_requests_do_not_share_errors() {
        let classifier = Classifier::default();
        let slot = DeferredErrorSlot::new();
        slot.put(TransportError::new("503").with_response(503, None));

        let first = classifier.classify(Completion::success(Some(ok_reply()), 200), false, &slot);
        check!(first.kind() == crate::SignalKind::HttpError);

        let second = classifier.classify(Completion::success(Some(ok_reply()), 200), false, &slot);
        check!(second.kind() == crate::SignalKind::Success);
    }
}
