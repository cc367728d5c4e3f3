//! The bundled transport: hyper-util's pooled client over rustls.
//!
//! Whatever goes wrong on the wire is turned into an [`Error`] whose text names
//! the whole source chain, since that text is what the classifier matches its
//! bad-request markers against. A body cut short, or a connection closed in the
//! middle of a response, becomes [`Error::Truncated`].

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{self, Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tower::util::BoxCloneSyncService;
use tower::{Layer, ServiceExt};
use tower_service::Service;
use verdict_core::{CookieStore, Headers, RequestParts};

use crate::config::ClientConfig;
use crate::middleware::{CookieJarLayer, ErrorCaptureLayer, LoggingLayer};
use crate::{Error, Request, Response, Result};

/// Type-erased middleware stack.
pub type BoxedService = BoxCloneSyncService<Request, Response<Bytes>, Error>;

/// Future returned by the services of the stack.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

type Wrap = Box<dyn FnOnce(BoxedService) -> BoxedService + Send>;

/// Innermost service, sending requests over hyper.
#[derive(Clone)]
struct Wire {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
    canonical_names: bool,
}

impl Wire {
    fn new(config: &ClientConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build(https_connector(config.connect_timeout));

        Self {
            client,
            timeout: config.timeout,
            canonical_names: config.canonical_header_names,
        }
    }

    async fn send(self, request: Request) -> Result<Response<Bytes>> {
        let Self {
            client,
            timeout,
            canonical_names,
        } = self;

        let exchange = async move {
            let response = client
                .request(wire_request(request.into_parts())?)
                .await
                .map_err(|err| send_error(&err))?;

            let (head, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|err| Error::truncated(error_chain(&err)))?
                .to_bytes();

            let headers = response_headers(&head.headers, canonical_names);
            Ok(Response::new(head.status.as_u16(), headers, body))
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }
}

impl Service<Request> for Wire {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        Box::pin(self.clone().send(request))
    }
}

fn wire_request(parts: RequestParts) -> Result<http::Request<Full<Bytes>>> {
    let mut builder = http::Request::builder()
        .method(parts.method)
        .uri(parts.url.as_str());
    for (name, value) in &parts.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let mut request = builder
        .body(parts.body.map_or_else(Full::default, Full::new))
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    *request.extensions_mut() = parts.extensions;

    Ok(request)
}

fn send_error(err: &legacy::Error) -> Error {
    let message = error_chain(err);

    if closed_mid_response(err) {
        Error::truncated(message)
    } else if !err.is_connect()
        && (message.contains("certificate") || message.contains("tls") || message.contains("ssl"))
    {
        Error::tls(message)
    } else {
        Error::connection(message)
    }
}

/// `true` when hyper saw the connection close before the response head was complete.
fn closed_mid_response(err: &(dyn StdError + 'static)) -> bool {
    std::iter::successors(Some(err), |&err| err.source())
        .filter_map(|err| err.downcast_ref::<hyper::Error>())
        .any(hyper::Error::is_incomplete_message)
}

/// `"a: b: c"` for an error `a` caused by `b` caused by `c`.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    std::iter::successors(Some(err), |&err| err.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// Headers in arrival order, skipping values that are not visible ASCII.
fn response_headers(headers: &http::HeaderMap, canonical: bool) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?.to_string();
            let name = if canonical {
                canonical_header_name(name.as_str())
            } else {
                name.to_string()
            };
            Some((name, value))
        })
        .collect()
}

/// `set-cookie` becomes `Set-Cookie`, `x-request-id` becomes `X-Request-Id`.
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    let roots: rustls::RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let tls = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// HTTP client over hyper-util, wrapped in the configured middleware.
///
/// # Example
///
/// ```ignore
/// use verdict::HyperClient;
///
/// // Logging plus capture of non-2xx responses into the request's deferred slot
/// let client = HyperClient::builder().with_defaults().build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: BoxedService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// A client with default settings and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// A client with custom settings and no middleware.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        HyperClientBuilder {
            config,
            layers: Vec::new(),
        }
        .build()
    }

    /// Start building a client.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// The transport settings.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl verdict_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        self.service.clone().oneshot(request).await
    }
}

/// Builder for [`HyperClient`].
///
/// Layers wrap in the order they are added: the first one sees the request first.
///
/// ```ignore
/// use verdict::{CookieStore, HyperClient};
///
/// let cookies = CookieStore::new();
/// let client = HyperClient::builder()
///     .with_logging()
///     .with_cookie_jar(cookies.clone())
///     .with_error_capture()
///     .build();
/// ```
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfig,
    layers: Vec<Wrap>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Bound one exchange, body included.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Bound connection establishment.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Keep response header names lowercase, as hyper delivers them.
    #[must_use]
    pub const fn raw_header_names(mut self) -> Self {
        self.config.canonical_header_names = false;
        self
    }

    /// Add a tower layer around everything added so far.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + 'static,
        L::Service: Service<Request, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layers
            .push(Box::new(move |inner| BoxedService::new(layer.layer(inner))));
        self
    }

    /// Logging, then error capture.
    #[must_use]
    pub fn with_defaults(self) -> Self {
        self.with_logging().with_error_capture()
    }

    /// Log one span per exchange.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log one span per exchange, with headers at debug level.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::with_headers())
    }

    /// Stash non-2xx responses in the request's deferred-error slot.
    #[must_use]
    pub fn with_error_capture(self) -> Self {
        self.layer(ErrorCaptureLayer::new())
    }

    /// Send the cookie held by `store` with every request.
    #[must_use]
    pub fn with_cookie_jar(self, store: CookieStore) -> Self {
        self.layer(CookieJarLayer::new(store))
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let Self { config, layers } = self;

        let service = layers
            .into_iter()
            .rev()
            .fold(BoxedService::new(Wire::new(&config)), |inner, wrap| {
                wrap(inner)
            });

        HyperClient { service, config }
    }
}
