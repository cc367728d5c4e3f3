//! The completion handler: cookies, cancellation, classification, dispatch.

use tracing::{Level, span};

use crate::{
    ChainNode, Classifier, Completion, CookieExtractor, CookieStore, Delivery, Exchange, Payload,
    PipelineConfig, RequestContext, Result, dispatch,
};

/// Turns one transport completion into exactly one delivered outcome.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use verdict_core::{
///     ChainNode, Completion, HandlerResult, Listener, Payload, Pipeline, RequestContext,
///     SignalKind,
/// };
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Ack {
///     ok: bool,
/// }
///
/// impl Payload for Ack {
///     fn is_success(&self) -> bool {
///         self.ok
///     }
/// }
///
/// struct Quiet;
///
/// impl Listener<Ack> for Quiet {
///     fn on_success(&self, _value: Option<&Ack>, _status: u16) -> HandlerResult {
///         Ok(())
///     }
/// }
///
/// let pipeline = Pipeline::new();
/// let ctx = RequestContext::new();
/// let node = ChainNode::new(Quiet);
///
/// let delivery = pipeline
///     .complete(&ctx, &node, Completion::success(Some(Ack { ok: false }), 200))
///     .expect("delivered");
/// assert_eq!(delivery.kind(), SignalKind::ServerError);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    classifier: Classifier,
    cookies: Option<CookieExtractor>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Creates a pipeline with the default configuration and a private cookie store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&PipelineConfig::default(), CookieStore::new())
    }

    /// Creates a pipeline publishing cookies to `store`.
    #[must_use]
    pub fn with_config(config: &PipelineConfig, store: CookieStore) -> Self {
        let cookies = config
            .extract_cookies
            .then(|| CookieExtractor::with_header(config.cookie_header.clone(), store));

        Self {
            classifier: Classifier::new(config.bad_request_markers.iter().cloned()),
            cookies,
        }
    }

    /// The classifier in use.
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The cookie store, when cookie extraction is enabled.
    #[must_use]
    pub fn cookie_store(&self) -> Option<&CookieStore> {
        self.cookies.as_ref().map(CookieExtractor::store)
    }

    /// Handles a completion for the request described by `ctx`.
    ///
    /// Cookie extraction runs on the success path before the cancellation poll, so a
    /// cancelled request can still update the cookie store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Listener`] when a listener fault is not contained.
    pub fn complete<T: Payload>(
        &self,
        ctx: &RequestContext,
        node: &ChainNode<T>,
        completion: Completion<T>,
    ) -> Result<Delivery> {
        let span = span!(Level::DEBUG, "completion", request_id = ctx.id());
        let _entered = span.enter();

        match &completion {
            Completion::Success {
                status, headers, ..
            } => {
                ctx.record(Exchange::Response {
                    status: *status,
                    headers: headers.clone(),
                });
                if let Some(cookies) = &self.cookies {
                    cookies.extract(headers);
                }
            }
            Completion::Failure(error) => ctx.record(Exchange::Failed(error.clone())),
        }

        let cancel_requested = node.needs_cancel();
        let signal = self
            .classifier
            .classify(completion, cancel_requested, ctx.deferred());

        dispatch(node, signal)
    }
}
