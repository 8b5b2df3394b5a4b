//! Request execution collaborator called by generated operations.
//!
//! One linear pipeline, no retries:
//! before-send hooks → pinning decision → transport → on-response hooks →
//! status validation → decoding.

use serde::de::DeserializeOwned;

use crate::interceptor::LookupKeys;
use crate::{Error, HttpClient, Interceptors, Request, Response, Result, ServiceConfig};

/// Per-call context handed to the dispatch functions.
#[derive(Debug, Clone, Copy)]
pub struct Dispatch<'a> {
    raw_url: &'a str,
    config: &'a ServiceConfig,
    interceptors: &'a Interceptors,
}

impl<'a> Dispatch<'a> {
    /// Context for one call.
    ///
    /// `raw_url` is the base URL joined with the template, placeholders intact.
    #[must_use]
    pub const fn new(raw_url: &'a str, config: &'a ServiceConfig, interceptors: &'a Interceptors) -> Self {
        Self {
            raw_url,
            config,
            interceptors,
        }
    }

    /// Raw template URL.
    #[must_use]
    pub const fn raw_url(&self) -> &'a str {
        self.raw_url
    }
}

/// Execute `request` and return the validated response.
///
/// # Errors
///
/// Returns the transport error, or [`Error::UnexpectedResponse`] for a
/// non-2xx status (after on-response hooks ran).
pub async fn perform_request<C>(client: &C, request: Request, dispatch: Dispatch<'_>) -> Result<Response>
where
    C: HttpClient,
{
    let resolved = request.url().to_string();
    let keys = LookupKeys {
        resolved: &resolved,
        raw: dispatch.raw_url,
    };

    let mut request = dispatch.interceptors.apply_before_send(request, keys);
    let pinned = dispatch.config.pinning_applies(request.url());
    request.set_pinned(pinned);
    tracing::trace!(url = %request.url(), pinned, "pinning decision");

    let method = request.method();
    if dispatch.config.is_verbose() {
        tracing::info!(%method, url = %request.url(), "sending request");
    } else {
        tracing::debug!(%method, url = %request.url(), "sending request");
    }

    let response = client.execute(request).await?;
    let response = dispatch.interceptors.apply_on_response(response, keys);

    let status = response.status();
    if dispatch.config.is_verbose() {
        tracing::info!(%method, url = %resolved, status, bytes = response.body().len(), "received response");
    } else {
        tracing::debug!(%method, url = %resolved, status, "received response");
    }

    if !response.is_success() {
        let body = response.into_body();
        let body = (!body.is_empty()).then_some(body);
        return Err(Error::unexpected_response(status, body));
    }

    Ok(response)
}

/// Execute `request` and decode a required value.
///
/// # Errors
///
/// See [`perform_request`]; decoding failures are [`Error::FailedToMapResponse`].
pub async fn perform_request_and_decode<C, T>(client: &C, request: Request, dispatch: Dispatch<'_>) -> Result<T>
where
    C: HttpClient,
    T: DeserializeOwned,
{
    let response = perform_request(client, request, dispatch).await?;
    dispatch.config.decoder().decode(response.body())
}

/// Execute `request` and decode an optional value; an empty or `null` body is `None`.
///
/// # Errors
///
/// See [`perform_request_and_decode`].
pub async fn perform_request_and_decode_optional<C, T>(
    client: &C,
    request: Request,
    dispatch: Dispatch<'_>,
) -> Result<Option<T>>
where
    C: HttpClient,
    T: DeserializeOwned,
{
    let response = perform_request(client, request, dispatch).await?;
    dispatch.config.decoder().decode_optional(response.body())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use bytes::Bytes;
    use url::Url;

    use super::*;
    use crate::{HookKey, Method, PinningPolicy};

    /// Transport answering every request with a canned response.
    struct Canned {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<(String, bool, Option<String>)>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for Canned {
        async fn execute(&self, request: Request) -> Result<Response> {
            self.seen.lock().expect("lock").push((
                request.url().to_string(),
                request.is_pinned(),
                request.header("X-Hook").map(str::to_string),
            ));
            Ok(Response::new(
                request.url().clone(),
                self.status,
                HashMap::new(),
                Bytes::from_static(self.body.as_bytes()),
            ))
        }
    }

    fn config() -> ServiceConfig {
        ServiceConfig::parse("https://jsonplaceholder.typicode.com").expect("config")
    }

    fn request(path: &str) -> Request {
        let url = Url::parse("https://jsonplaceholder.typicode.com")
            .and_then(|base| base.join(path))
            .expect("url");
        Request::builder(Method::Get, url).build()
    }

    #[tokio::test]
    async fn decodes_success() {
        let client = Canned::new(200, r#"{"id":2}"#);
        let config = config();
        let interceptors = Interceptors::new();
        let dispatch = Dispatch::new("https://jsonplaceholder.typicode.com/posts/%7Bid%7D", &config, &interceptors);

        let value: serde_json::Value = perform_request_and_decode(&client, request("/posts/2"), dispatch)
            .await
            .expect("decoded");
        check!(value["id"] == 2);
    }

    #[tokio::test]
    async fn non_success_is_unexpected_response() {
        let client = Canned::new(404, "{}");
        let config = config();
        let interceptors = Interceptors::new();
        let dispatch = Dispatch::new("", &config, &interceptors);

        let_assert!(Err(err) = perform_request(&client, request("/posts/9/comments/1"), dispatch).await);
        check!(err.status() == Some(404));
        check!(err.description() == Some("Not Found"));
        check!(err.body().map(Bytes::as_ref) == Some(b"{}".as_slice()));
    }

    #[tokio::test]
    async fn empty_body_is_none_for_optional() {
        let client = Canned::new(204, "");
        let config = config();
        let interceptors = Interceptors::new();
        let dispatch = Dispatch::new("", &config, &interceptors);

        let value: Option<serde_json::Value> =
            perform_request_and_decode_optional(&client, request("/posts"), dispatch)
                .await
                .expect("decoded");
        check!(value.is_none());
    }

    #[tokio::test]
    async fn hooks_run_around_transport() {
        let client = Canned::new(200, "[1]");
        let config = config();
        let calls = Arc::new(Mutex::new(0));
        let mut interceptors = Interceptors::new();
        interceptors.register_before_send(HookKey::All, |mut request: Request| {
            request.set_header("X-Hook", "all");
            request
        });
        let counter = Arc::clone(&calls);
        interceptors.register_on_response(
            HookKey::url("https://jsonplaceholder.typicode.com/posts"),
            move |response: Response| {
                *counter.lock().expect("lock") += 1;
                response.with_body("[1,2]")
            },
        );
        let dispatch = Dispatch::new("https://jsonplaceholder.typicode.com/posts", &config, &interceptors);

        let value: Vec<u8> = perform_request_and_decode(&client, request("/posts"), dispatch)
            .await
            .expect("decoded");

        check!(value == vec![1, 2]);
        check!(*calls.lock().expect("lock") == 1);
        let seen = client.seen.lock().expect("lock");
        check!(seen.first().and_then(|(_, _, hook)| hook.as_deref()) == Some("all"));
    }

    #[tokio::test]
    async fn pinning_flag_respects_exclusions() {
        let client = Canned::new(200, "null");
        let policy = PinningPolicy::certificate(["47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="])
            .expect("policy");
        let config = ServiceConfig::builder("https://jsonplaceholder.typicode.com")
            .pinning(policy)
            .exclude_from_pinning("https://jsonplaceholder.typicode.com/public")
            .build()
            .expect("config");
        let interceptors = Interceptors::new();

        for path in ["/posts", "/public/logo"] {
            let dispatch = Dispatch::new("", &config, &interceptors);
            perform_request(&client, request(path), dispatch).await.expect("response");
        }

        let seen = client.seen.lock().expect("lock");
        let pinned: Vec<bool> = seen.iter().map(|(_, pinned, _)| *pinned).collect();
        check!(pinned == vec![true, false]);
    }
}
