//! Core types and runtime collaborators for sprig declarative services.
//!
//! This crate provides the pieces generated code is built from:
//! - [`Template`] - URL path templates with inline defaults
//! - [`Request`], [`RequestBuilder`] and [`Response`] - HTTP messages
//! - [`QueryItem`] - explicit query items
//! - [`encode_structured_body`], [`encode_url_form_body`] and
//!   [`encode_multipart_body`] - body encoding
//! - [`infer_mime_type`] - signature-based MIME sniffing for uploads
//! - [`Decoder`] - response decoding
//! - [`Interceptors`] - before-send and on-response hooks
//! - [`PinningPolicy`] - certificate pinning policy
//! - [`ServiceConfig`] and [`Service`] - configuration and shared capability
//!   of generated types
//! - [`perform_request_and_decode`] and friends - the dispatch pipeline
//! - [`Error`] and [`Result`] - error handling
//! - [`HttpClient`] - transport trait

mod body;
mod client;
mod decoder;
mod dispatch;
mod error;
mod interceptor;
mod method;
mod mime;
mod multipart;
mod pinning;
pub mod prelude;
mod query;
mod request;
mod response;
mod service;
mod template;

pub use body::{ContentType, FORM_URL_ENCODED, JSON, MULTIPART_FORM_DATA, encode_structured_body, encode_url_form_body};
pub use client::HttpClient;
pub use decoder::{Decoder, KeyDecoding};
pub use dispatch::{Dispatch, perform_request, perform_request_and_decode, perform_request_and_decode_optional};
pub use error::{Error, ErrorKind, Result};
pub use interceptor::{ALL, BeforeSendHook, HookKey, Interceptors, LookupKeys, OnResponseHook};
pub use method::Method;
pub use mime::{MimeType, infer_mime_type};
pub use multipart::{Form, Part, PayloadDescription, encode_multipart_body};
pub use pinning::{PinningMode, PinningPolicy, is_excluded};
pub use query::{QueryItem, append_query_items};
pub use request::{CONTENT_TYPE, Request, RequestBuilder};
pub use response::Response;
pub use service::{Service, ServiceConfig, ServiceConfigBuilder};
pub use template::{Segment, Template, TemplateError, encode_path_segment};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
