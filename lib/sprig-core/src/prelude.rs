//! Prelude module for convenient imports.
//!
//! ```ignore
//! use sprig_core::prelude::*;
//! ```

pub use crate::{
    Decoder, Error, ErrorKind, HttpClient, KeyDecoding, Method, PinningPolicy, QueryItem, Request,
    Response, Result, Service, ServiceConfig,
};
