//! HTTP transport using hyper-util.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::{
    Error, PinningPolicy, Request, Response, Result, ServiceConfig,
    config::{ClientConfig, ClientConfigBuilder},
    connector::{https_connector, pinned_connector},
    middleware::LoggingLayer,
    pinning::PIN_MISMATCH,
};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased transport service, the unit tower layers are stacked on.
pub type BoxedService = BoxCloneService<Request, Response, Error>;

/// Future type for the tower `Service` implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Makes a [`BoxedService`] `Sync`, as [`crate::HttpClient`] requires.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request) -> ServiceFuture {
        // Clone under the lock, call outside of it
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

// ============================================================================
// Raw Client
// ============================================================================

type HyperTransport = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// The innermost service: two hyper clients, the second one pinned.
#[derive(Clone)]
struct RawHyperClient {
    inner: HyperTransport,
    pinned: Option<HyperTransport>,
    config: ClientConfig,
}

impl RawHyperClient {
    fn new(config: ClientConfig) -> Self {
        let inner = Self::transport(&config, https_connector(config.connect_timeout));
        Self {
            inner,
            pinned: None,
            config,
        }
    }

    fn with_pinning(mut self, policy: &PinningPolicy) -> Result<Self> {
        let connector = pinned_connector(policy, self.config.connect_timeout)?;
        self.pinned = Some(Self::transport(&self.config, connector));
        Ok(self)
    }

    fn transport(config: &ClientConfig, connector: HttpsConnector<HttpConnector>) -> HyperTransport {
        Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build(connector)
    }

    /// Pick the hyper client for `request`.
    fn select(&self, request: &Request) -> Result<&HyperTransport> {
        if !request.is_pinned() {
            return Ok(&self.inner);
        }
        if request.url().scheme() != "https" {
            return Err(Error::pinning(format!(
                "pinned request to {} is not sent over https",
                request.url()
            )));
        }
        self.pinned
            .as_ref()
            .ok_or_else(|| Error::pinning("the transport was built without a pinning policy"))
    }

    fn build_hyper_request(request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = body.map_or_else(Full::default, Full::new);
        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let client = self.select(&request)?;
        let url = request.url().clone();
        let hyper_request = Self::build_hyper_request(request)?;

        let response = tokio::time::timeout(self.config.timeout, client.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Self::map_hyper_error(&e))?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(url, status, response_headers, body))
    }

    fn map_hyper_error(err: &hyper_util::client::legacy::Error) -> Error {
        // hyper only says "client error (Connect)"; the cause is in the chain
        let mut msg = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }

        if msg.contains(PIN_MISMATCH) {
            return Error::pinning(msg);
        }

        let lower = msg.to_lowercase();
        if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<Request> for RawHyperClient {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

// ============================================================================
// Public Client
// ============================================================================

/// Default transport of generated services: hyper-util with connection
/// pooling, rustls, optional certificate pinning and tower middleware.
///
/// # Example
///
/// ```ignore
/// use sprig::HyperClient;
/// use std::time::Duration;
///
/// let client = HyperClient::new();
///
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(5))
///     .with_logging()
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: SyncService,
    config: ClientConfig,
    pinning: Option<PinningPolicy>,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .field("pinning", &self.pinning.as_ref().map(PinningPolicy::mode))
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a client with the default configuration, no pinning and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with a custom configuration, no pinning and no middleware.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperClient::new(config.clone());
        Self {
            service: SyncService::new(BoxCloneService::new(raw)),
            config,
            pinning: None,
        }
    }

    /// Create the transport a service group needs: pinned when its
    /// configuration carries a [`PinningPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] if the pinned TLS configuration cannot be built.
    pub fn for_service(service: &ServiceConfig) -> Result<Self> {
        let builder = Self::builder();
        match service.pinning() {
            Some(policy) => builder.pinning(policy.clone()),
            None => builder,
        }
        .build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Pinning policy of the pinned connection pool, if any.
    #[must_use]
    pub const fn pinning(&self) -> Option<&PinningPolicy> {
        self.pinning.as_ref()
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl sprig_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.service.call(request).await
    }
}

impl Service<Request> for HyperClient {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`HyperClient`].
///
/// ```ignore
/// use sprig::{HyperClient, PinningPolicy};
///
/// let client = HyperClient::builder()
///     .pinning(PinningPolicy::certificate(["ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="])?)
///     .with_logging()
///     .build()?;
/// ```
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    pinning: Option<PinningPolicy>,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("pinning", &self.pinning)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_max_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_max_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Serve pinned requests over a connection pool enforcing `policy`.
    ///
    /// Without a policy, pinned requests fail with [`Error::Pinning`].
    #[must_use]
    pub fn pinning(mut self, policy: PinningPolicy) -> Self {
        self.pinning = Some(policy);
        self
    }

    /// Add a tower layer.
    ///
    /// First added is outermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers
            .push(Arc::new(move |service| BoxCloneService::new(layer.layer(service))));
        self
    }

    /// Log every request and its outcome at `info`.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log every request with its headers at `debug`.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] if the pinned TLS configuration cannot be built.
    pub fn build(self) -> Result<HyperClient> {
        let config = self.config.build();
        let mut raw = RawHyperClient::new(config.clone());
        if let Some(policy) = &self.pinning {
            raw = raw.with_pinning(policy)?;
        }

        // Applied innermost first, so the first added layer ends up outermost
        let mut service: BoxedService = BoxCloneService::new(raw);
        for layer_fn in self.layers.into_iter().rev() {
            service = layer_fn(service);
        }

        Ok(HyperClient {
            service: SyncService::new(service),
            config,
            pinning: self.pinning,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use url::Url;

    use super::*;
    use crate::{ErrorKind, HttpClient, Method};

    const PIN: &str = "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";

    fn pinned_request(url: &str) -> Request {
        let_assert!(Ok(url) = Url::parse(url));
        let mut request = Request::builder(Method::Get, url).build();
        request.set_pinned(true);
        request
    }

    #[test]
    fn client_default() {
        let client = HyperClient::new();
        check!(client.config().timeout == Duration::from_secs(30));
        check!(client.pinning().is_none());
    }

    #[test]
    fn client_builder() {
        let_assert!(
            Ok(client) = HyperClient::builder()
                .timeout(Duration::from_secs(60))
                .pool_max_idle_per_host(16)
                .with_logging()
                .build()
        );

        check!(client.config().timeout == Duration::from_secs(60));
        check!(client.config().pool_max_idle_per_host == 16);
    }

    #[test]
    fn client_for_pinned_service() {
        let_assert!(Ok(policy) = PinningPolicy::certificate([PIN]));
        let_assert!(
            Ok(service) = ServiceConfig::builder("https://jsonplaceholder.typicode.com")
                .pinning(policy.clone())
                .build()
        );

        let_assert!(Ok(client) = HyperClient::for_service(&service));
        check!(client.pinning() == Some(&policy));
        check!(format!("{client:?}").contains("Certificate"));
    }

    #[tokio::test]
    async fn pinned_request_over_http_fails() {
        let_assert!(Ok(policy) = PinningPolicy::certificate([PIN]));
        let_assert!(Ok(client) = HyperClient::builder().pinning(policy).build());

        let_assert!(Err(error) = client.execute(pinned_request("http://127.0.0.1:9/posts")).await);
        check!(error.kind() == ErrorKind::Pinning);
    }

    #[tokio::test]
    async fn pinned_request_without_policy_fails() {
        let client = HyperClient::new();

        let_assert!(Err(error) = client.execute(pinned_request("https://127.0.0.1:9/posts")).await);
        check!(error.kind() == ErrorKind::Pinning);
    }
}
