//! Procedural macro for sprig declarative services.
//!
//! `#[service]` turns an annotated trait into:
//! - the trait itself, with `*_with_query` and `*_with_defaults` overloads
//! - `{Trait}Service<C>`, a live implementation sending HTTP requests
//! - `{Trait}Mock`, a mock implementation returning injected results
//!
//! # Example
//!
//! ```ignore
//! use sprig::prelude::*;
//!
//! #[service(url = "https://jsonplaceholder.typicode.com")]
//! pub trait Placeholder {
//!     #[get("/posts/{id=2}")]
//!     async fn get_post(&self, id: u64) -> sprig::Result<Post>;
//! }
//!
//! let service = PlaceholderService::from_default_url()?;
//! let post = service.get_post_with_defaults().await?;
//! ```

mod attrs;
mod error;
mod expand;
mod live;
mod mock;
mod model;
mod types;

use proc_macro::TokenStream;

/// Declare a service group on a trait.
///
/// # Attributes
///
/// - `url` (optional): default base URL, validated at compile time
/// - `mock` (optional, default `true`): whether to generate `{Trait}Mock`
///
/// # Method attributes
///
/// - `#[get("/path")]`, `#[post]`, `#[put]`, `#[patch]`, `#[delete]`,
///   `#[head]`, `#[options]`, or `#[http("VERB /path")]`; exactly one
/// - `#[headers("Content-Type" = "application/json", Accept = "...")]`,
///   also allowed on the trait
/// - `#[body("param")]`: the parameter sent as the request body
/// - `#[file_upload]` or `#[file_upload(name = "...", file_name = "...")]`
///
/// # Parameter attributes
///
/// - `#[path]` / `#[path("placeholder")]`; parameters named after a
///   placeholder are bound without it
/// - `#[query]` / `#[query("key")]`
/// - `#[header("Name")]`
///
/// Templates accept inline defaults: `/posts/{id=2}/comments`.
///
/// # Errors
///
/// Invalid declarations fail to compile with a message starting with the
/// error kind, e.g. `UnboundPlaceholder: ...`.
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_service(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
