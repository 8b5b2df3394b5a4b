//! Service-group configuration and the capability shared by generated types.

use url::Url;

use crate::interceptor::{HookKey, Interceptors};
use crate::pinning::{PinningPolicy, is_excluded};
use crate::{Decoder, Request, Response, Result};

/// Configuration of one service group: base URL, decoder and pinning.
///
/// Set once at construction of a generated type and exposed read-only.
///
/// # Example
///
/// ```
/// use sprig_core::{Decoder, KeyDecoding, ServiceConfig};
///
/// let config = ServiceConfig::builder("https://my-url.com/api/")
///     .decoder(Decoder::new(KeyDecoding::FromSnakeCase))
///     .verbose(true)
///     .build()
///     .expect("valid config");
///
/// assert_eq!(config.endpoint("/posts").expect("url").as_str(), "https://my-url.com/api/posts");
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    base_url: Url,
    decoder: Decoder,
    pinning: Option<PinningPolicy>,
    pinning_exclusions: Vec<String>,
    verbose: bool,
}

impl ServiceConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            decoder: Decoder::default(),
            pinning: None,
            pinning_exclusions: Vec::new(),
            verbose: false,
        }
    }

    /// Parse the base URL and use defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the URL does not parse.
    pub fn parse(base_url: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    /// Creates a new [`ServiceConfigBuilder`].
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ServiceConfigBuilder {
        ServiceConfigBuilder::new(base_url)
    }

    /// Base URL every template is appended to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Response decoder.
    #[must_use]
    pub const fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Pinning policy, if any.
    #[must_use]
    pub const fn pinning(&self) -> Option<&PinningPolicy> {
        self.pinning.as_ref()
    }

    /// URL prefixes exempt from pinning.
    #[must_use]
    pub fn pinning_exclusions(&self) -> &[String] {
        &self.pinning_exclusions
    }

    /// Whether requests are logged at `info` rather than `debug`.
    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The base URL with `path` appended, as a string.
    ///
    /// Unlike [`Url::join`], the base path is kept: `https://a.com/api/` and
    /// `/posts` give `https://a.com/api/posts`.
    #[must_use]
    pub fn endpoint_key(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// The base URL with `path` appended.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the result does not parse.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&self.endpoint_key(path))?)
    }

    /// Interception key for a path relative to the base URL, or `"all"`.
    #[must_use]
    pub fn hook_key(&self, path: Option<&str>) -> HookKey {
        match path {
            None => HookKey::All,
            Some(path) => HookKey::url(
                self.endpoint(path)
                    .map_or_else(|_| self.endpoint_key(path), String::from),
            ),
        }
    }

    /// Whether a request to `url` must be pinned.
    #[must_use]
    pub fn pinning_applies(&self, url: &Url) -> bool {
        self.pinning.is_some() && !is_excluded(url, &self.pinning_exclusions)
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug, Clone)]
pub struct ServiceConfigBuilder {
    base_url: String,
    decoder: Option<Decoder>,
    pinning: Option<PinningPolicy>,
    pinning_exclusions: Vec<String>,
    verbose: Option<bool>,
}

impl ServiceConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            decoder: None,
            pinning: None,
            pinning_exclusions: Vec::new(),
            verbose: None,
        }
    }

    /// Set the response decoder.
    #[must_use]
    pub const fn decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Set the certificate pinning policy.
    #[must_use]
    pub fn pinning(mut self, policy: PinningPolicy) -> Self {
        self.pinning = Some(policy);
        self
    }

    /// Exempt URLs starting with `prefix` from pinning.
    #[must_use]
    pub fn exclude_from_pinning(mut self, prefix: impl Into<String>) -> Self {
        self.pinning_exclusions.push(prefix.into());
        self
    }

    /// Log requests at `info` level.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the base URL does not parse.
    pub fn build(self) -> Result<ServiceConfig> {
        Ok(ServiceConfig {
            base_url: Url::parse(&self.base_url)?,
            decoder: self.decoder.unwrap_or_default(),
            pinning: self.pinning,
            pinning_exclusions: self.pinning_exclusions,
            verbose: self.verbose.unwrap_or(false),
        })
    }
}

/// Capability shared by the live and mock types generated for a service group.
///
/// Hook registration goes through `&mut self`, so it cannot overlap with
/// in-flight operations.
pub trait Service {
    /// Configuration set at construction.
    fn config(&self) -> &ServiceConfig;

    /// Interception registry.
    fn interceptors(&self) -> &Interceptors;

    /// Mutable interception registry.
    fn interceptors_mut(&mut self) -> &mut Interceptors;

    /// Base URL of the service group.
    fn base_url(&self) -> &Url {
        self.config().base_url()
    }

    /// Register a hook run before sending requests to `path` (relative to the
    /// base URL), or to every request when `path` is `None`.
    fn register_before_send<F>(&mut self, path: Option<&str>, hook: F)
    where
        Self: Sized,
        F: Fn(Request) -> Request + Send + Sync + 'static,
    {
        let key = self.config().hook_key(path);
        self.interceptors_mut().register_before_send(key, hook);
    }

    /// Register a hook run on responses from `path` (relative to the base
    /// URL), or on every response when `path` is `None`.
    fn register_on_response<F>(&mut self, path: Option<&str>, hook: F)
    where
        Self: Sized,
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        let key = self.config().hook_key(path);
        self.interceptors_mut().register_on_response(key, hook);
    }

    /// Register a before-send hook for resolved URLs matching a regex.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidRequest`] for an invalid pattern.
    fn register_before_send_matching<F>(&mut self, pattern: &str, hook: F) -> Result<()>
    where
        Self: Sized,
        F: Fn(Request) -> Request + Send + Sync + 'static,
    {
        self.interceptors_mut()
            .register_before_send_matching(pattern, hook)
    }

    /// Register an on-response hook for resolved URLs matching a regex.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidRequest`] for an invalid pattern.
    fn register_on_response_matching<F>(&mut self, pattern: &str, hook: F) -> Result<()>
    where
        Self: Sized,
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.interceptors_mut()
            .register_on_response_matching(pattern, hook)
    }
}
