//! Declarative HTTP services for Rust.
//!
//! Annotate a trait with [`service`] and get two implementations of it:
//! `{Trait}Service`, which sends real requests, and `{Trait}Mock`, which
//! returns whatever its public `*_result` slots hold.
//!
//! # Example
//!
//! ```ignore
//! use sprig::prelude::*;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! pub struct Post {
//!     id: u64,
//!     title: String,
//! }
//!
//! #[service(url = "https://jsonplaceholder.typicode.com")]
//! pub trait Posts {
//!     #[get("/posts/{id=2}")]
//!     async fn get_post(&self, id: u64) -> sprig::Result<Post>;
//! }
//!
//! let posts = PostsService::from_default_url()?;
//! let post = posts.get_post(1).await?;
//!
//! let mut mock = PostsMock::default();
//! mock.get_post_result = Ok(post.clone());
//! assert_eq!(mock.get_post(42).await?.id, post.id);
//! ```
//!
//! Hooks registered with [`Service::register_before_send`] and
//! [`Service::register_on_response`] run for every dispatched request whose
//! URL matches; `None` registers for all of them.

mod client;
mod config;
mod connector;
pub mod middleware;
mod pinning;
pub mod prelude;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};

pub use sprig_core::{
    ALL, BeforeSendHook, ContentType, Decoder, Dispatch, Error, ErrorKind, FORM_URL_ENCODED, Form,
    HookKey, HttpClient, Interceptors, JSON, KeyDecoding, LookupKeys, MULTIPART_FORM_DATA, Method,
    MimeType, OnResponseHook, Part, PayloadDescription, PinningMode, PinningPolicy, QueryItem,
    Request, RequestBuilder, Response, Result, Segment, Service, ServiceConfig,
    ServiceConfigBuilder, Template, TemplateError, append_query_items, encode_multipart_body,
    encode_path_segment, encode_structured_body, encode_url_form_body, infer_mime_type,
    is_excluded, perform_request, perform_request_and_decode, perform_request_and_decode_optional,
};

pub use sprig_core::{StatusCode, header};

// Used by generated code
pub use bytes;
pub use tracing;
pub use url;

pub use tower;

pub use sprig_macro::service;
