//! Issues requests and routes their completions through the pipeline.

use bytes::Bytes;
use verdict_core::{
    ChainNode, Completion, Delivery, HttpClient, Payload, Pipeline, RequestContext, TransportError,
    from_json,
};

use crate::{Request, Response, Result};

/// Couples an [`HttpClient`] with the [`Pipeline`] that handles its completions.
///
/// # Example
///
/// ```ignore
/// use verdict::{ChainNode, HyperClient, Request, RequestManager};
///
/// let manager = RequestManager::new(HyperClient::builder().with_defaults().build());
/// let request = Request::get("https://api.example.com/items".parse()?);
///
/// let delivery = manager.call(request, &ChainNode::new(ItemsListener)).await?;
/// println!("{}", delivery.kind());
/// ```
#[derive(Debug, Clone)]
pub struct RequestManager<C> {
    client: C,
    pipeline: Pipeline,
}

impl<C: HttpClient> RequestManager<C> {
    /// Create a manager with the default pipeline.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self::with_pipeline(client, Pipeline::new())
    }

    /// Create a manager with a custom pipeline.
    #[must_use]
    pub const fn with_pipeline(client: C, pipeline: Pipeline) -> Self {
        Self { client, pipeline }
    }

    /// The underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The completion pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Execute `request` and deliver its outcome to `chain`.
    ///
    /// A [`RequestContext`] is attached to the request when it has none, so
    /// middleware always finds a deferred-error slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Listener`] when a listener fault is not contained.
    /// Transport failures are delivered to the chain, not returned.
    pub async fn call<T: Payload>(
        &self,
        mut request: Request,
        chain: &ChainNode<T>,
    ) -> Result<Delivery> {
        let context = if let Some(context) = request.context() {
            context.clone()
        } else {
            let context = RequestContext::new();
            request.extensions_mut().insert(context.clone());
            context
        };

        let completion = into_completion(self.client.execute(request).await);
        self.pipeline.complete(&context, chain, completion)
    }
}

/// Converts what the client returned into a completion.
///
/// A non-2xx status is a failure carrying the status line and body. A 2xx with an
/// empty body succeeds without a result. A bare `[]` decodes only when `T`
/// accepts a sequence (see [`Payload`]); otherwise it is a decode failure.
fn into_completion<T: Payload>(outcome: Result<Response<Bytes>>) -> Completion<T> {
    let response = match outcome {
        Ok(response) => response,
        Err(err) => return Completion::Failure(err.into()),
    };

    let (status, headers, body) = response.into_parts();

    if !(200..300).contains(&status) {
        let body = Some(body).filter(|body| !body.is_empty());
        return Completion::Failure(TransportError::from_status(status, body));
    }

    if body.is_empty() {
        return Completion::Success {
            result: None,
            status,
            headers,
        };
    }

    match from_json::<T>(&body) {
        Ok(result) => Completion::Success {
            result: Some(result),
            status,
            headers,
        },
        Err(err) => Completion::Failure(TransportError::from(err).with_response(status, Some(body))),
    }
}
