//! Listener chains and outcome dispatch.
//!
//! A [`ChainNode`] wraps one listener and may point at a previous and a next node.
//! Every event reaches the previous node first, then the node's own listener, then
//! the next node. Neighbours can themselves have neighbours; traversal is depth-first
//! and does not detect cycles.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use verdict_core::{ChainNode, ErrorSignal, HandlerResult, Listener, dispatch};
//!
//! struct Audit;
//!
//! impl Listener<String> for Audit {
//!     fn on_success(&self, value: Option<&String>, status: u16) -> HandlerResult {
//!         tracing::info!(?value, status, "audit");
//!         Ok(())
//!     }
//! }
//!
//! struct Screen;
//!
//! impl Listener<String> for Screen {
//!     fn on_success(&self, _value: Option<&String>, _status: u16) -> HandlerResult {
//!         Ok(())
//!     }
//! }
//!
//! let audit = Arc::new(ChainNode::new(Audit));
//! let node = ChainNode::new(Screen).with_previous(audit);
//!
//! let signal = ErrorSignal::Success { value: Some("hello".to_string()), status: 200 };
//! let delivery = dispatch(&node, signal).expect("delivered");
//! assert!(!delivery.had_error());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::{Cause, Error, ErrorSignal, Event, Listener, Result, SignalKind};

/// One listener plus its optional neighbours and suppression flags.
pub struct ChainNode<T> {
    listener: Arc<dyn Listener<T>>,
    previous: Option<Arc<ChainNode<T>>>,
    next: Option<Arc<ChainNode<T>>>,
    ignore_previous: bool,
    ignore_next: bool,
    contain_faults: bool,
}

impl<T> fmt::Debug for ChainNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainNode")
            .field("has_previous", &self.previous.is_some())
            .field("has_next", &self.next.is_some())
            .field("ignore_previous", &self.ignore_previous)
            .field("ignore_next", &self.ignore_next)
            .field("contain_faults", &self.contain_faults)
            .finish_non_exhaustive()
    }
}

impl<T> ChainNode<T> {
    /// Creates a node without neighbours that contains listener faults.
    pub fn new<L>(listener: L) -> Self
    where
        L: Listener<T> + 'static,
    {
        Self::from_arc(Arc::new(listener))
    }

    /// Creates a node around a shared listener.
    #[must_use]
    pub fn from_arc(listener: Arc<dyn Listener<T>>) -> Self {
        Self {
            listener,
            previous: None,
            next: None,
            ignore_previous: false,
            ignore_next: false,
            contain_faults: true,
        }
    }

    /// Sets the node notified before this one.
    #[must_use]
    pub fn with_previous(mut self, previous: Arc<Self>) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Sets the node notified after this one.
    #[must_use]
    pub fn with_next(mut self, next: Arc<Self>) -> Self {
        self.next = Some(next);
        self
    }

    /// Skip the previous node for every event.
    #[must_use]
    pub const fn ignore_previous(mut self, ignore: bool) -> Self {
        self.ignore_previous = ignore;
        self
    }

    /// Skip the next node for every event.
    #[must_use]
    pub const fn ignore_next(mut self, ignore: bool) -> Self {
        self.ignore_next = ignore;
        self
    }

    /// Whether listener faults are re-routed to `on_exception_error` (default `true`)
    /// or returned to the caller.
    #[must_use]
    pub const fn contain_faults(mut self, contain: bool) -> Self {
        self.contain_faults = contain;
        self
    }

    /// The node's own listener.
    #[must_use]
    pub fn listener(&self) -> &dyn Listener<T> {
        &*self.listener
    }

    /// Previous node, if set.
    #[must_use]
    pub fn previous(&self) -> Option<&Arc<Self>> {
        self.previous.as_ref()
    }

    /// Next node, if set.
    #[must_use]
    pub fn next(&self) -> Option<&Arc<Self>> {
        self.next.as_ref()
    }

    /// Returns `true` if faults are contained.
    #[must_use]
    pub const fn contains_faults(&self) -> bool {
        self.contain_faults
    }

    /// Polls the node's own listener for cancellation.
    #[must_use]
    pub fn needs_cancel(&self) -> bool {
        self.listener.needs_cancel()
    }

    /// Delivers one event to previous, self and next, in that order.
    ///
    /// Stops at the first handler that fails and returns its fault.
    pub fn deliver(&self, event: &Event<'_, T>) -> std::result::Result<(), Cause> {
        if let Some(previous) = self.previous.as_ref().filter(|_| !self.ignore_previous) {
            previous.deliver(event)?;
        }

        event.deliver_to(&*self.listener).map_err(|err| {
            tracing::warn!(handler = event.name(), error = %err, "listener fault");
            Cause::from(err)
        })?;

        if let Some(next) = self.next.as_ref().filter(|_| !self.ignore_next) {
            next.deliver(event)?;
        }

        Ok(())
    }
}

/// What [`dispatch`] delivered.
#[derive(Debug, Clone)]
pub struct Delivery {
    kind: SignalKind,
    had_error: bool,
    fault: Option<Cause>,
}

impl Delivery {
    /// Kind of the classified signal.
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Final `had_error` flag (forced to `true` by a contained fault).
    #[must_use]
    pub const fn had_error(&self) -> bool {
        self.had_error
    }

    /// Listener fault that was contained, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<&Cause> {
        self.fault.as_ref()
    }
}

/// Which part of the delivery a fault interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Event,
    AfterResult,
}

/// Delivers a classified signal through a chain.
///
/// The mapped event goes through previous/self/next, then `after_result` does the
/// same, except for [`ErrorSignal::Cancelled`] which only triggers `on_cancel`.
///
/// # Errors
///
/// Returns [`Error::Listener`] when a handler fails and the node does not contain
/// faults, or when a handler fails while a contained fault is being reported.
pub fn dispatch<T>(node: &ChainNode<T>, signal: ErrorSignal<T>) -> Result<Delivery> {
    let kind = signal.kind();
    let mut had_error = signal.had_error();
    let cancelled = signal.is_cancelled();

    let Err((stage, fault)) = deliver_signal(node, &signal, had_error) else {
        tracing::debug!(kind = %kind, had_error, "outcome delivered");
        return Ok(Delivery {
            kind,
            had_error,
            fault: None,
        });
    };

    if !node.contain_faults {
        return Err(Error::Listener(fault));
    }

    had_error = true;
    tracing::warn!(kind = %kind, error = %fault, "listener fault contained");

    node.deliver(&Event::ExceptionError {
        cause: Some(&fault),
        message: None,
    })
    .map_err(Error::Listener)?;

    if !cancelled && stage == Stage::Event {
        node.deliver(&Event::AfterResult { had_error })
            .map_err(Error::Listener)?;
    }

    Ok(Delivery {
        kind,
        had_error,
        fault: Some(fault),
    })
}

fn deliver_signal<T>(
    node: &ChainNode<T>,
    signal: &ErrorSignal<T>,
    had_error: bool,
) -> std::result::Result<(), (Stage, Cause)> {
    let event = match signal {
        ErrorSignal::Success { value, status } => Event::Success {
            value: value.as_ref(),
            status: *status,
        },
        ErrorSignal::EmptyListCoercion { value, status } => Event::Success {
            value: Some(value),
            status: *status,
        },
        ErrorSignal::ServerError { value } => Event::ErrorFromServer { value },
        ErrorSignal::HttpError {
            status,
            message,
            body,
        } => Event::HttpError {
            status: *status,
            message: message.as_deref(),
            body: body.as_deref(),
        },
        ErrorSignal::TransportException { cause, message } => Event::ExceptionError {
            cause: cause.as_ref(),
            message: message.as_deref(),
        },
        ErrorSignal::Cancelled => {
            return node.deliver(&Event::Cancel).map_err(|f| (Stage::Event, f));
        }
    };

    node.deliver(&event).map_err(|f| (Stage::Event, f))?;
    node.deliver(&Event::AfterResult { had_error })
        .map_err(|f| (Stage::AfterResult, f))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert2::{check, let_assert};

    use super::*;
    use crate::{BoxError, HandlerResult};

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Records every event as `"<name>:<handler>(<args>)"`.
    struct Recorder {
        name: &'static str,
        journal: Journal,
        fail_on: Option<&'static str>,
        cancel: bool,
    }

    impl Recorder {
        fn node(name: &'static str, journal: &Journal) -> ChainNode<String> {
            ChainNode::new(Self {
                name,
                journal: Arc::clone(journal),
                fail_on: None,
                cancel: false,
            })
        }

        fn failing(name: &'static str, journal: &Journal, fail_on: &'static str) -> ChainNode<String> {
            ChainNode::new(Self {
                name,
                journal: Arc::clone(journal),
                fail_on: Some(fail_on),
                cancel: false,
            })
        }

        fn record(&self, handler: &'static str, args: String) -> HandlerResult {
            self.journal
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(format!("{}:{handler}({args})", self.name));
            if self.fail_on == Some(handler) {
                return Err(BoxError::from(format!("{} broke in {handler}", self.name)));
            }
            Ok(())
        }
    }

    impl Listener<String> for Recorder {
        fn on_success(&self, value: Option<&String>, status: u16) -> HandlerResult {
            self.record("on_success", format!("{value:?},{status}"))
        }

        fn on_error_from_server(&self, value: &String) -> HandlerResult {
            self.record("on_error_from_server", value.clone())
        }

        fn on_http_error(&self, status: u16, message: Option<&str>, body: Option<&str>) -> HandlerResult {
            self.record("on_http_error", format!("{status},{message:?},{body:?}"))
        }

        fn on_exception_error(&self, cause: Option<&Cause>, message: Option<&str>) -> HandlerResult {
            let cause = cause.map(ToString::to_string);
            self.record("on_exception_error", format!("{cause:?},{message:?}"))
        }

        fn on_cancel(&self) -> HandlerResult {
            self.record("on_cancel", String::new())
        }

        fn after_result(&self, had_error: bool) -> HandlerResult {
            self.record("after_result", had_error.to_string())
        }

        fn needs_cancel(&self) -> bool {
            self.cancel
        }
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn trio(journal: &Journal) -> ChainNode<String> {
        Recorder::node("self", journal)
            .with_previous(Arc::new(Recorder::node("prev", journal)))
            .with_next(Arc::new(Recorder::node("next", journal)))
    }

    fn all_signals() -> Vec<ErrorSignal<String>> {
        vec![
            ErrorSignal::Success {
                value: Some("ok".to_string()),
                status: 200,
            },
            ErrorSignal::EmptyListCoercion {
                value: String::new(),
                status: 200,
            },
            ErrorSignal::ServerError {
                value: "denied".to_string(),
            },
            ErrorSignal::HttpError {
                status: 404,
                message: Some("404 Not Found".to_string()),
                body: Some("not found".to_string()),
            },
            ErrorSignal::TransportException {
                cause: None,
                message: Some("reset".to_string()),
            },
            ErrorSignal::Cancelled,
        ]
    }

    #[test]
    fn success_goes_previous_self_next_then_after_result() {
        let journal = journal();
        let node = trio(&journal);

        let delivery = dispatch(
            &node,
            ErrorSignal::Success {
                value: Some("ok".to_string()),
                status: 200,
            },
        )
        .expect("delivered");

        check!(!delivery.had_error());
        check!(delivery.kind() == SignalKind::Success);
        check!(
            entries(&journal)
                == [
                    "prev:on_success(Some(\"ok\"),200)",
                    "self:on_success(Some(\"ok\"),200)",
                    "next:on_success(Some(\"ok\"),200)",
                    "prev:after_result(false)",
                    "self:after_result(false)",
                    "next:after_result(false)",
                ]
        );
    }

    #[test]
    fn server_error_reports_had_error() {
        let journal = journal();
        let node = Recorder::node("self", &journal);

        let delivery = dispatch(
            &node,
            ErrorSignal::ServerError {
                value: "denied".to_string(),
            },
        )
        .expect("delivered");

        check!(delivery.had_error());
        check!(entries(&journal) == ["self:on_error_from_server(denied)", "self:after_result(true)"]);
    }

    #[test]
    fn http_error_carries_status_message_and_body() {
        let journal = journal();
        let node = Recorder::node("self", &journal);

        dispatch(
            &node,
            ErrorSignal::HttpError {
                status: 400,
                message: Some("400 Bad Request".to_string()),
                body: None,
            },
        )
        .expect("delivered");

        check!(
            entries(&journal)
                == [
                    "self:on_http_error(400,Some(\"400 Bad Request\"),None)",
                    "self:after_result(true)",
                ]
        );
    }

    #[test]
    fn cancel_skips_after_result() {
        let journal = journal();
        let node = trio(&journal);

        let delivery = dispatch(&node, ErrorSignal::Cancelled).expect("delivered");

        check!(delivery.kind() == SignalKind::Cancelled);
        check!(entries(&journal) == ["prev:on_cancel()", "self:on_cancel()", "next:on_cancel()"]);
    }

    #[test]
    fn ignore_next_suppresses_next_for_every_event() {
        for signal in all_signals() {
            let journal = journal();
            let node = trio(&journal).ignore_next(true);

            dispatch(&node, signal).expect("delivered");

            let entries = entries(&journal);
            check!(!entries.is_empty());
            check!(entries.iter().all(|entry| !entry.starts_with("next:")));
            check!(entries.iter().any(|entry| entry.starts_with("prev:")));
        }
    }

    #[test]
    fn ignore_previous_suppresses_previous() {
        let journal = journal();
        let node = trio(&journal).ignore_previous(true);

        dispatch(&node, ErrorSignal::Cancelled).expect("delivered");

        check!(entries(&journal) == ["self:on_cancel()", "next:on_cancel()"]);
    }

    #[test]
    fn nested_neighbours_are_traversed_depth_first() {
        let journal = journal();
        let outer = Arc::new(Recorder::node("outer", &journal));
        let previous = Recorder::node("prev", &journal).with_previous(outer);
        let node = Recorder::node("self", &journal).with_previous(Arc::new(previous));

        dispatch(&node, ErrorSignal::Cancelled).expect("delivered");

        check!(entries(&journal) == ["outer:on_cancel()", "prev:on_cancel()", "self:on_cancel()"]);
    }

    #[test]
    fn contained_fault_is_rerouted_to_exception_path() {
        let journal = journal();
        let node = Recorder::failing("self", &journal, "on_success")
            .with_previous(Arc::new(Recorder::node("prev", &journal)))
            .with_next(Arc::new(Recorder::node("next", &journal)));

        let delivery = dispatch(
            &node,
            ErrorSignal::Success {
                value: None,
                status: 200,
            },
        )
        .expect("contained");

        check!(delivery.had_error());
        let_assert!(Some(fault) = delivery.fault());
        check!(fault.to_string() == "self broke in on_success");

        let cause = "Some(\"self broke in on_success\"),None";
        check!(
            entries(&journal)
                == [
                    "prev:on_success(None,200)".to_string(),
                    "self:on_success(None,200)".to_string(),
                    format!("prev:on_exception_error({cause})"),
                    format!("self:on_exception_error({cause})"),
                    format!("next:on_exception_error({cause})"),
                    "prev:after_result(true)".to_string(),
                    "self:after_result(true)".to_string(),
                    "next:after_result(true)".to_string(),
                ]
        );
    }

    #[test]
    fn fault_in_after_result_does_not_repeat_it() {
        let journal = journal();
        let node = Recorder::failing("self", &journal, "after_result");

        let delivery = dispatch(
            &node,
            ErrorSignal::Success {
                value: None,
                status: 204,
            },
        )
        .expect("contained");

        check!(delivery.had_error());
        check!(
            entries(&journal)
                == [
                    "self:on_success(None,204)",
                    "self:after_result(false)",
                    "self:on_exception_error(Some(\"self broke in after_result\"),None)",
                ]
        );
    }

    #[test]
    fn fault_in_cancel_is_contained_without_after_result() {
        let journal = journal();
        let node = Recorder::failing("self", &journal, "on_cancel");

        let delivery = dispatch(&node, ErrorSignal::Cancelled).expect("contained");

        check!(delivery.fault().is_some());
        check!(
            entries(&journal)
                == [
                    "self:on_cancel()",
                    "self:on_exception_error(Some(\"self broke in on_cancel\"),None)",
                ]
        );
    }

    #[test]
    fn uncontained_fault_propagates() {
        let journal = journal();
        let node = Recorder::failing("self", &journal, "on_error_from_server").contain_faults(false);

        let err = dispatch(
            &node,
            ErrorSignal::ServerError {
                value: "denied".to_string(),
            },
        )
        .expect_err("propagated");

        check!(err.is_listener());
        check!(entries(&journal) == ["self:on_error_from_server(denied)"]);
    }

    #[test]
    fn fault_while_reporting_fault_propagates() {
        let journal = journal();
        let node = Recorder::failing("self", &journal, "on_exception_error");

        let err = dispatch(
            &node,
            ErrorSignal::TransportException {
                cause: None,
                message: Some("reset".to_string()),
            },
        )
        .expect_err("second fault");

        check!(err.is_listener());
    }

    #[test]
    fn needs_cancel_reads_own_listener() {
        let journal = journal();
        let node = ChainNode::new(Recorder {
            name: "self",
            journal: Arc::clone(&journal),
            fail_on: None,
            cancel: true,
        });

        check!(node.needs_cancel());
        check!(!Recorder::node("other", &journal).needs_cancel());
    }
}
