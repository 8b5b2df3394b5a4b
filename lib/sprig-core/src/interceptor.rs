//! Interception registry: URL-keyed before-send and on-response hooks.
//!
//! Hooks are stored under a [`HookKey`]. At dispatch time the registry is
//! consulted with the lookup keys of the request, in this order:
//!
//! 1. the `"all"` hook,
//! 2. the hook registered for the exact resolved URL,
//! 3. the hook registered for the raw template URL,
//! 4. every pattern hook whose regex matches the resolved URL.
//!
//! A specific registration never suppresses the `"all"` hook: both run.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::{Error, Request, Response, Result};

/// Sentinel key of hooks applied to every request.
pub const ALL: &str = "all";

/// Hook run on a request before it is sent.
pub type BeforeSendHook = Arc<dyn Fn(Request) -> Request + Send + Sync>;

/// Hook run on a response before its status is validated.
pub type OnResponseHook = Arc<dyn Fn(Response) -> Response + Send + Sync>;

/// Registry key of a hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookKey {
    /// Applies to every request.
    All,
    /// Applies to one absolute URL string.
    Url(String),
}

impl HookKey {
    /// Key for an absolute URL string; `"all"` maps to [`HookKey::All`].
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        if url == ALL { Self::All } else { Self::Url(url) }
    }
}

/// The URLs a dispatched request is looked up under.
#[derive(Debug, Clone, Copy)]
pub struct LookupKeys<'a> {
    /// Resolved URL, query included.
    pub resolved: &'a str,
    /// Base URL joined with the raw template.
    pub raw: &'a str,
}

struct Registry<H> {
    exact: HashMap<HookKey, H>,
    patterns: Vec<(Regex, H)>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            patterns: Vec::new(),
        }
    }
}

impl<H: Clone> Clone for Registry<H> {
    fn clone(&self) -> Self {
        Self {
            exact: self.exact.clone(),
            patterns: self.patterns.clone(),
        }
    }
}

impl<H> Registry<H> {
    fn matching<'a>(&'a self, keys: LookupKeys<'a>) -> impl Iterator<Item = &'a H> + 'a {
        let all = self.exact.get(&HookKey::All);
        let resolved = self.exact.get(&HookKey::Url(keys.resolved.to_string()));
        let raw = (keys.raw != keys.resolved)
            .then(|| self.exact.get(&HookKey::Url(keys.raw.to_string())))
            .flatten();
        let patterns = self
            .patterns
            .iter()
            .filter(move |(pattern, _)| pattern.is_match(keys.resolved))
            .map(|(_, hook)| hook);

        all.into_iter().chain(resolved).chain(raw).chain(patterns)
    }

    fn describe(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .exact
            .keys()
            .map(|key| match key {
                HookKey::All => ALL.to_string(),
                HookKey::Url(url) => url.clone(),
            })
            .collect();
        keys.sort();
        keys.extend(self.patterns.iter().map(|(pattern, _)| format!("/{pattern}/")));
        keys
    }
}

/// Before-send and on-response hook maps owned by a generated service.
#[derive(Default, Clone)]
pub struct Interceptors {
    before_send: Registry<BeforeSendHook>,
    on_response: Registry<OnResponseHook>,
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("before_send", &self.before_send.describe())
            .field("on_response", &self.on_response.describe())
            .finish()
    }
}

impl Interceptors {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a before-send hook, replacing any hook under the same key.
    pub fn register_before_send<F>(&mut self, key: HookKey, hook: F)
    where
        F: Fn(Request) -> Request + Send + Sync + 'static,
    {
        self.before_send.exact.insert(key, Arc::new(hook));
    }

    /// Register an on-response hook, replacing any hook under the same key.
    pub fn register_on_response<F>(&mut self, key: HookKey, hook: F)
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.on_response.exact.insert(key, Arc::new(hook));
    }

    /// Register a before-send hook for every resolved URL matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when the pattern is not a valid regex.
    pub fn register_before_send_matching<F>(&mut self, pattern: &str, hook: F) -> Result<()>
    where
        F: Fn(Request) -> Request + Send + Sync + 'static,
    {
        let pattern = compile(pattern)?;
        self.before_send.patterns.push((pattern, Arc::new(hook)));
        Ok(())
    }

    /// Register an on-response hook for every resolved URL matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when the pattern is not a valid regex.
    pub fn register_on_response_matching<F>(&mut self, pattern: &str, hook: F) -> Result<()>
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        let pattern = compile(pattern)?;
        self.on_response.patterns.push((pattern, Arc::new(hook)));
        Ok(())
    }

    /// Run every matching before-send hook, `"all"` first.
    #[must_use]
    pub fn apply_before_send(&self, request: Request, keys: LookupKeys<'_>) -> Request {
        self.before_send.matching(keys).fold(request, |request, hook| {
            tracing::trace!(url = keys.resolved, "applying before-send hook");
            hook(request)
        })
    }

    /// Run every matching on-response hook, `"all"` first.
    #[must_use]
    pub fn apply_on_response(&self, response: Response, keys: LookupKeys<'_>) -> Response {
        self.on_response.matching(keys).fold(response, |response, hook| {
            tracing::trace!(url = keys.resolved, "applying on-response hook");
            hook(response)
        })
    }

    /// Whether no hook is registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before_send.exact.is_empty()
            && self.before_send.patterns.is_empty()
            && self.on_response.exact.is_empty()
            && self.on_response.patterns.is_empty()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::invalid_request(format!("invalid interception pattern: {e}")))
}
