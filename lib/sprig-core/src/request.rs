//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, query items, and bodies.
//!
//! # Example
//!
//! ```
//! use sprig_core::{Method, QueryItem, Request};
//!
//! let url = "https://api.example.com/posts".parse().expect("valid URL");
//! let request = Request::builder(Method::Get, url)
//!     .header("Accept", "application/json")
//!     .query_items(&[QueryItem::new("page", 1)])
//!     .build();
//! assert_eq!(request.url().as_str(), "https://api.example.com/posts?page=1");
//! ```

use bytes::Bytes;
use url::Url;

use crate::multipart::{PayloadDescription, encode_multipart_body};
use crate::query::{QueryItem, append_query_items};
use crate::{Method, body};

/// Header name used to pick the body encoding.
pub const CONTENT_TYPE: &str = "Content-Type";

/// An HTTP request with method, URL, ordered headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    pinned: bool,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Mutable access to the URL, for before-send hooks.
    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    /// Request headers, in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Single header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Sets a header, replacing an existing value in place.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        upsert_header(&mut self.headers, name.into(), value.into());
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Replaces the request body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Whether the transport must enforce certificate pinning for this request.
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Marks the request for certificate pinning.
    pub fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, Vec<(String, String)>, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Sets a header. A later value for the same name replaces the earlier one in place.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Sets `Content-Type` unless one was already declared.
    fn default_content_type(mut self, value: &str) -> Self {
        if !self
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
        {
            self.headers.push((CONTENT_TYPE.to_string(), value.to_string()));
        }
        self
    }

    /// Sets multiple headers, in order.
    #[must_use]
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            upsert_header(&mut self.headers, name.into(), value.into());
        }
        self
    }

    /// Appends query items to the URL. An empty slice leaves the URL untouched.
    #[must_use]
    pub fn query_items(mut self, items: &[QueryItem]) -> Self {
        append_query_items(&mut self.url, items);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body.
    ///
    /// A `Content-Type` set beforehand, such as one with a charset, is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize + ?Sized>(self, value: &T) -> crate::Result<Self> {
        let body = body::encode_structured_body(value)?;
        Ok(self.default_content_type(body::JSON).body(body))
    }

    /// Set a form-urlencoded body.
    ///
    /// A `Content-Type` set beforehand is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn form<T: serde::Serialize + ?Sized>(self, value: &T) -> crate::Result<Self> {
        let body = body::encode_url_form_body(value)?;
        Ok(self.default_content_type(body::FORM_URL_ENCODED).body(body))
    }

    /// Set a multipart body holding a single described payload.
    ///
    /// The `Content-Type` header carries the generated boundary.
    #[must_use]
    pub fn multipart(self, payload: &PayloadDescription, data: Bytes) -> Self {
        let (content_type, body) = encode_multipart_body(payload, data);
        self.header(CONTENT_TYPE, content_type).body(body)
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            pinned: false,
        }
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn upsert_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers
        .iter_mut()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(&name))
    {
        Some((_, existing)) => *existing = value,
        None => headers.push((name, value)),
    }
}
